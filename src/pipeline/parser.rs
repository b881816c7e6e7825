//! Message parser: turns inbound batch objects into queued image work.
//!
//! Triggered when the sync connector writes a newline-delimited JSON batch
//! into the inbound bucket. Each line is one chat message; each image
//! attachment becomes one queued work item.
//!
//! The unit of failure is the batch, not the line: one malformed line fails
//! that record and nothing from it is enqueued. Records within an event are
//! independent, so a bad batch does not stop the remaining records.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::clients::{ObjectStore, WorkQueue};
use crate::config::ParserConfig;
use crate::error::{Error, ParseError};
use crate::events::{StorageEvent, StorageRecord};
use crate::pipeline::types::{ChatMessage, ImageWorkItem, WORK_ITEM_BODY};

/// Message parser handler.
pub struct MessageParser {
    store: Arc<dyn ObjectStore>,
    queue: Arc<dyn WorkQueue>,
    image_queue_url: String,
}

impl MessageParser {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        queue: Arc<dyn WorkQueue>,
        config: ParserConfig,
    ) -> Self {
        Self {
            store,
            queue,
            image_queue_url: config.image_queue_url,
        }
    }

    /// Process every record of a storage event, in order, independently.
    ///
    /// Returns the total number of work items enqueued. Per-record failures
    /// are logged and do not short-circuit the remaining records.
    pub async fn handle(&self, event: &StorageEvent) -> usize {
        let mut enqueued = 0;
        for record in &event.records {
            match self.process_record(record).await {
                Ok(count) => enqueued += count,
                Err(e) => {
                    error!(
                        bucket = record.bucket(),
                        key = %record.decoded_key(),
                        error = %e,
                        "Failed to process batch record"
                    );
                }
            }
        }
        info!(enqueued, records = event.records.len(), "Storage event processed");
        enqueued
    }

    /// Read one batch object, parse it, and enqueue its work items.
    async fn process_record(&self, record: &StorageRecord) -> Result<usize, Error> {
        let bucket = record.bucket();
        let key = record.decoded_key();

        let body = self.store.get_object(bucket, &key).await?;
        let text = String::from_utf8(body)
            .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;

        let items = parse_batch(&text)?;
        if items.is_empty() {
            warn!(bucket, key = %key, "Batch contained no image attachments");
            return Ok(0);
        }

        // One send per item, never batched.
        for item in &items {
            self.queue
                .send_message(
                    &self.image_queue_url,
                    WORK_ITEM_BODY,
                    &[
                        ("url", &item.image_url),
                        ("slack_msg_id", &item.slack_msg_id),
                    ],
                )
                .await?;
        }

        info!(bucket, key = %key, items = items.len(), "Enqueued image work items");
        Ok(items.len())
    }
}

/// Parse a newline-delimited JSON batch into work items.
///
/// Blank lines are skipped; any malformed line fails the whole batch.
pub fn parse_batch(text: &str) -> Result<Vec<ImageWorkItem>, ParseError> {
    let mut items = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let message: ChatMessage =
            serde_json::from_str(line).map_err(|e| ParseError::MalformedLine {
                line: index + 1,
                message: e.to_string(),
            })?;
        items.extend(message.work_items());
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::clients::{MemoryObjectStore, MemoryQueue};
    use crate::pipeline::types::MISSING_MSG_ID;

    const IMAGE_QUEUE: &str = "http://queues/image-processing";

    fn make_parser(
        store: Arc<MemoryObjectStore>,
        queue: Arc<MemoryQueue>,
    ) -> MessageParser {
        MessageParser::new(
            store,
            queue,
            ParserConfig {
                image_queue_url: IMAGE_QUEUE.to_string(),
            },
        )
    }

    fn storage_event(entries: &[(&str, &str)]) -> StorageEvent {
        let records: Vec<serde_json::Value> = entries
            .iter()
            .map(|(bucket, key)| {
                serde_json::json!({"s3": {"bucket": {"name": bucket}, "object": {"key": key}}})
            })
            .collect();
        serde_json::from_value(serde_json::json!({"Records": records})).unwrap()
    }

    // ── parse_batch ─────────────────────────────────────────────────

    #[test]
    fn parses_single_message_with_attachment() {
        let items = parse_batch(
            r#"{"text":"ok","client_msg_id":"m1","attachments":[{"image_url":"http://x/a.jpg"}]}"#,
        )
        .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].image_url, "http://x/a.jpg");
        assert_eq!(items[0].slack_msg_id, "m1");
    }

    #[test]
    fn skips_blank_lines() {
        let batch = "\n{\"text\":\"no attachments\"}\n\n{\"client_msg_id\":\"m2\",\"attachments\":[{\"image_url\":\"http://x/b.jpg\"}]}\n";
        let items = parse_batch(batch).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].slack_msg_id, "m2");
    }

    #[test]
    fn malformed_line_fails_the_batch() {
        let batch = "{\"client_msg_id\":\"m1\",\"attachments\":[{\"image_url\":\"http://x/a.jpg\"}]}\nnot json\n";
        let err = parse_batch(batch).unwrap_err();
        match err {
            ParseError::MalformedLine { line, .. } => assert_eq!(line, 2),
            other => panic!("Expected MalformedLine, got {other:?}"),
        }
    }

    #[test]
    fn messages_without_images_yield_no_items() {
        let batch = "{\"text\":\"plain\"}\n{\"attachments\":[{\"title\":\"a link\"}]}";
        assert!(parse_batch(batch).unwrap().is_empty());
    }

    // ── handler ─────────────────────────────────────────────────────

    #[tokio::test]
    async fn enqueues_one_message_per_work_item() {
        let store = Arc::new(MemoryObjectStore::new());
        store
            .put_object(
                "inbound",
                "batch.ndjson",
                concat!(
                    r#"{"client_msg_id":"m1","attachments":[{"image_url":"http://x/1.jpg"},{"image_url":"http://x/2.jpg"}]}"#,
                    "\n",
                    r#"{"attachments":[{"image_url":"http://x/3.jpg"}]}"#,
                )
                .as_bytes()
                .to_vec(),
            )
            .await;
        let queue = Arc::new(MemoryQueue::new());
        let parser = make_parser(store, Arc::clone(&queue));

        let enqueued = parser
            .handle(&storage_event(&[("inbound", "batch.ndjson")]))
            .await;
        assert_eq!(enqueued, 3);

        let sent = queue.sent().await;
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|m| m.queue_url == IMAGE_QUEUE));
        assert!(sent.iter().all(|m| m.body == WORK_ITEM_BODY));
        assert_eq!(sent[0].attribute("url"), Some("http://x/1.jpg"));
        assert_eq!(sent[0].attribute("slack_msg_id"), Some("m1"));
        assert_eq!(sent[1].attribute("slack_msg_id"), Some("m1"));
        assert_eq!(sent[2].attribute("slack_msg_id"), Some(MISSING_MSG_ID));
    }

    #[tokio::test]
    async fn malformed_batch_enqueues_nothing() {
        let store = Arc::new(MemoryObjectStore::new());
        store
            .put_object(
                "inbound",
                "bad.ndjson",
                b"{\"attachments\":[{\"image_url\":\"http://x/a.jpg\"}]}\n{broken".to_vec(),
            )
            .await;
        let queue = Arc::new(MemoryQueue::new());
        let parser = make_parser(store, Arc::clone(&queue));

        let enqueued = parser.handle(&storage_event(&[("inbound", "bad.ndjson")])).await;
        assert_eq!(enqueued, 0);
        assert!(queue.sent().await.is_empty());
    }

    #[tokio::test]
    async fn record_failure_does_not_stop_later_records() {
        let store = Arc::new(MemoryObjectStore::new());
        store.put_object("inbound", "bad.ndjson", b"{broken".to_vec()).await;
        store
            .put_object(
                "inbound",
                "good.ndjson",
                br#"{"client_msg_id":"m9","attachments":[{"image_url":"http://x/z.jpg"}]}"#
                    .to_vec(),
            )
            .await;
        let queue = Arc::new(MemoryQueue::new());
        let parser = make_parser(store, Arc::clone(&queue));

        let enqueued = parser
            .handle(&storage_event(&[
                ("inbound", "bad.ndjson"),
                ("inbound", "good.ndjson"),
            ]))
            .await;
        assert_eq!(enqueued, 1);

        let sent = queue.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].attribute("slack_msg_id"), Some("m9"));
    }

    #[tokio::test]
    async fn missing_object_enqueues_nothing() {
        let store = Arc::new(MemoryObjectStore::new());
        let queue = Arc::new(MemoryQueue::new());
        let parser = make_parser(store, Arc::clone(&queue));

        let enqueued = parser.handle(&storage_event(&[("inbound", "absent")])).await;
        assert_eq!(enqueued, 0);
        assert!(queue.sent().await.is_empty());
    }

    #[tokio::test]
    async fn url_encoded_keys_are_decoded_before_reading() {
        let store = Arc::new(MemoryObjectStore::new());
        store
            .put_object(
                "inbound",
                "batch 1.ndjson",
                br#"{"client_msg_id":"m1","attachments":[{"image_url":"http://x/a.jpg"}]}"#
                    .to_vec(),
            )
            .await;
        let queue = Arc::new(MemoryQueue::new());
        let parser = make_parser(store, Arc::clone(&queue));

        let enqueued = parser
            .handle(&storage_event(&[("inbound", "batch+1.ndjson")]))
            .await;
        assert_eq!(enqueued, 1);
    }
}
