//! Inbound event payloads.
//!
//! The handlers are triggered by platform events carried as JSON: storage
//! notifications for the parser, queue deliveries for the moderator, and
//! lifecycle signals for the cleanup hook. Field names follow the wire
//! shapes emitted by the hosting platform, so deserialization goes through
//! serde renames rather than restating them in our own casing.

use std::collections::HashMap;

use serde::Deserialize;

// ── Storage events ──────────────────────────────────────────────────

/// A batch of storage notifications delivered to the message parser.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageEvent {
    #[serde(rename = "Records")]
    pub records: Vec<StorageRecord>,
}

/// One new-object notification.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageRecord {
    pub s3: StorageEntity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageEntity {
    pub bucket: BucketRef,
    pub object: ObjectRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BucketRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectRef {
    pub key: String,
}

impl StorageRecord {
    /// Bucket the object was written to.
    pub fn bucket(&self) -> &str {
        &self.s3.bucket.name
    }

    /// Object key, decoded from its URL-encoded notification form
    /// (`+` for space, percent-escapes for everything else).
    pub fn decoded_key(&self) -> String {
        let plussed = self.s3.object.key.replace('+', " ");
        urlencoding::decode(&plussed)
            .map(|decoded| decoded.into_owned())
            .unwrap_or(plussed)
    }
}

// ── Queue events ────────────────────────────────────────────────────

/// A batch of queue deliveries handed to the image moderator.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueEvent {
    #[serde(rename = "Records")]
    pub records: Vec<QueueRecord>,
}

/// One delivered queue message, including the protocol-level receipt
/// handle and the ARN of the queue it came from.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRecord {
    pub receipt_handle: String,
    #[serde(default)]
    pub message_attributes: HashMap<String, MessageAttribute>,
    #[serde(rename = "eventSourceARN")]
    pub event_source_arn: String,
}

/// A string-typed message attribute.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAttribute {
    pub string_value: String,
}

impl QueueRecord {
    /// Look up a string attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.message_attributes
            .get(name)
            .map(|a| a.string_value.as_str())
    }
}

// ── Lifecycle events ────────────────────────────────────────────────

/// A resource-lifecycle signal delivered to the cleanup handler.
#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleEvent {
    #[serde(rename = "RequestType")]
    pub request_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_event_deserializes_platform_shape() {
        let json = r#"{
            "Records": [
                {"s3": {"bucket": {"name": "inbound"}, "object": {"key": "batches/2024-06-01.ndjson"}}}
            ]
        }"#;
        let event: StorageEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.records.len(), 1);
        assert_eq!(event.records[0].bucket(), "inbound");
        assert_eq!(event.records[0].decoded_key(), "batches/2024-06-01.ndjson");
    }

    #[test]
    fn decoded_key_handles_plus_and_percent_escapes() {
        let json = r#"{"s3": {"bucket": {"name": "b"}, "object": {"key": "dir/batch+1%282%29.ndjson"}}}"#;
        let record: StorageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.decoded_key(), "dir/batch 1(2).ndjson");
    }

    #[test]
    fn queue_record_exposes_attributes() {
        let json = r#"{
            "receiptHandle": "rh-123",
            "messageAttributes": {
                "url": {"stringValue": "http://x/a.jpg", "dataType": "String"},
                "slack_msg_id": {"stringValue": "m1", "dataType": "String"}
            },
            "eventSourceARN": "arn:aws:sqs:us-east-1:123456789012:image-queue"
        }"#;
        let record: QueueRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.receipt_handle, "rh-123");
        assert_eq!(record.attribute("url"), Some("http://x/a.jpg"));
        assert_eq!(record.attribute("slack_msg_id"), Some("m1"));
        assert_eq!(record.attribute("missing"), None);
    }

    #[test]
    fn queue_record_tolerates_absent_attributes() {
        let json = r#"{
            "receiptHandle": "rh-1",
            "eventSourceARN": "arn:aws:sqs:us-east-1:1:q"
        }"#;
        let record: QueueRecord = serde_json::from_str(json).unwrap();
        assert!(record.attribute("url").is_none());
    }

    #[test]
    fn lifecycle_event_carries_request_type() {
        let event: LifecycleEvent =
            serde_json::from_str(r#"{"RequestType": "Delete"}"#).unwrap();
        assert_eq!(event.request_type, "Delete");
    }
}
