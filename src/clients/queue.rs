//! Work-queue collaborator.
//!
//! Transport for image work items and violation notifications. Message
//! attributes are flat string key-value pairs. `SqsHttpQueue` speaks the
//! SQS JSON wire protocol and works against any SQS-compatible endpoint;
//! `MemoryQueue` backs tests and records every send and delete.

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::QueueError;

/// The account and queue-name components of a queue ARN
/// (`arn:aws:sqs:<region>:<account>:<name>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueArn {
    pub account: String,
    pub name: String,
}

impl QueueArn {
    /// Parse the account/name components out of a queue ARN.
    pub fn parse(arn: &str) -> Result<Self, QueueError> {
        let elements: Vec<&str> = arn.split(':').collect();
        if elements.len() < 6 || elements[4].is_empty() || elements[5].is_empty() {
            return Err(QueueError::MalformedArn(arn.to_string()));
        }
        Ok(Self {
            account: elements[4].to_string(),
            name: elements[5].to_string(),
        })
    }
}

/// Send, delete, and URL resolution against named queues.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Send one message with string attributes.
    async fn send_message(
        &self,
        queue_url: &str,
        body: &str,
        attributes: &[(&str, &str)],
    ) -> Result<(), QueueError>;

    /// Delete a consumed message by receipt handle.
    async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<(), QueueError>;

    /// Resolve a queue URL from its owner account and name.
    async fn queue_url(&self, account: &str, name: &str) -> Result<String, QueueError>;
}

// ── SQS wire-protocol client ────────────────────────────────────────

/// Queue client speaking the SQS JSON protocol (`X-Amz-Target` dispatch)
/// against a configurable endpoint.
pub struct SqsHttpQueue {
    endpoint: String,
    client: reqwest::Client,
}

impl SqsHttpQueue {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }

    /// Issue one protocol call. Errors come back as a reason string for the
    /// caller to wrap in its operation-specific variant.
    async fn call(
        &self,
        action: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, String> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Amz-Target", format!("AmazonSQS.{action}"))
            .header("Content-Type", "application/x-amz-json-1.0")
            .json(&payload)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        if !status.is_success() {
            return Err(format!("{action} returned {status}: {body}"));
        }
        Ok(body)
    }
}

#[async_trait]
impl WorkQueue for SqsHttpQueue {
    async fn send_message(
        &self,
        queue_url: &str,
        body: &str,
        attributes: &[(&str, &str)],
    ) -> Result<(), QueueError> {
        let message_attributes: serde_json::Map<String, serde_json::Value> = attributes
            .iter()
            .map(|(name, value)| {
                (
                    (*name).to_string(),
                    json!({"StringValue": value, "DataType": "String"}),
                )
            })
            .collect();

        self.call(
            "SendMessage",
            json!({
                "QueueUrl": queue_url,
                "MessageBody": body,
                "MessageAttributes": message_attributes,
            }),
        )
        .await
        .map_err(|reason| QueueError::SendFailed {
            queue_url: queue_url.to_string(),
            reason,
        })?;

        debug!(queue_url, body, "Sent queue message");
        Ok(())
    }

    async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<(), QueueError> {
        self.call(
            "DeleteMessage",
            json!({
                "QueueUrl": queue_url,
                "ReceiptHandle": receipt_handle,
            }),
        )
        .await
        .map_err(|reason| QueueError::DeleteFailed {
            queue_url: queue_url.to_string(),
            reason,
        })?;
        Ok(())
    }

    async fn queue_url(&self, account: &str, name: &str) -> Result<String, QueueError> {
        let body = self
            .call(
                "GetQueueUrl",
                json!({
                    "QueueName": name,
                    "QueueOwnerAWSAccountId": account,
                }),
            )
            .await
            .map_err(|reason| QueueError::UrlResolution {
                name: name.to_string(),
                reason,
            })?;

        body.get("QueueUrl")
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| QueueError::UrlResolution {
                name: name.to_string(),
                reason: format!("no QueueUrl in response: {body}"),
            })
    }
}

// ── In-memory queue ─────────────────────────────────────────────────

/// A message recorded by [`MemoryQueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub queue_url: String,
    pub body: String,
    pub attributes: Vec<(String, String)>,
}

impl SentMessage {
    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// In-memory queue that records sends and deletes, for tests and local
/// wiring.
#[derive(Default)]
pub struct MemoryQueue {
    sent: RwLock<Vec<SentMessage>>,
    deleted: RwLock<Vec<(String, String)>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages sent so far, in order.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.read().await.clone()
    }

    /// All `(queue_url, receipt_handle)` deletes so far, in order.
    pub async fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.read().await.clone()
    }
}

#[async_trait]
impl WorkQueue for MemoryQueue {
    async fn send_message(
        &self,
        queue_url: &str,
        body: &str,
        attributes: &[(&str, &str)],
    ) -> Result<(), QueueError> {
        self.sent.write().await.push(SentMessage {
            queue_url: queue_url.to_string(),
            body: body.to_string(),
            attributes: attributes
                .iter()
                .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
                .collect(),
        });
        Ok(())
    }

    async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<(), QueueError> {
        self.deleted
            .write()
            .await
            .push((queue_url.to_string(), receipt_handle.to_string()));
        Ok(())
    }

    async fn queue_url(&self, account: &str, name: &str) -> Result<String, QueueError> {
        Ok(format!("memory://{account}/{name}"))
    }
}
