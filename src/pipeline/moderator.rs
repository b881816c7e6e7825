//! Image moderator: screens queued images against the policy lists.
//!
//! Per work item: claim the message (explicit delete, before any risky
//! work), download the image to scratch, then run the two independent
//! checks. Text screening and theme screening each emit their own
//! notification, so one image can produce zero, one, or two alerts.
//!
//! Deleting before processing is deliberate: a crash mid-item loses that
//! item's notifications instead of duplicating alerts on redelivery.

use std::sync::Arc;

use tracing::{debug, info};

use crate::clients::{ImageFetcher, ImageScanner, QueueArn, WorkQueue};
use crate::config::ModeratorConfig;
use crate::error::{Error, FetchError, QueueError};
use crate::events::{QueueEvent, QueueRecord};
use crate::pipeline::types::ViolationNotification;
use crate::policy::PolicyLists;
use crate::scratch::ScratchFile;

/// Image moderator handler.
pub struct ImageModerator {
    queue: Arc<dyn WorkQueue>,
    scanner: Arc<dyn ImageScanner>,
    fetcher: Arc<dyn ImageFetcher>,
    policy: PolicyLists,
    violations_queue_url: String,
    min_label_confidence: f32,
}

impl ImageModerator {
    pub fn new(
        queue: Arc<dyn WorkQueue>,
        scanner: Arc<dyn ImageScanner>,
        fetcher: Arc<dyn ImageFetcher>,
        policy: PolicyLists,
        config: ModeratorConfig,
    ) -> Self {
        Self {
            queue,
            scanner,
            fetcher,
            policy,
            violations_queue_url: config.violations_queue_url,
            min_label_confidence: config.min_label_confidence,
        }
    }

    /// Process every record of a queue event, in order.
    ///
    /// Any failure aborts the invocation; undeleted messages come back via
    /// the queue's redelivery.
    pub async fn handle(&self, event: &QueueEvent) -> Result<(), Error> {
        for record in &event.records {
            self.process_record(record).await?;
        }
        Ok(())
    }

    async fn process_record(&self, record: &QueueRecord) -> Result<(), Error> {
        let image_url = required_attribute(record, "url")?;
        let slack_msg_id = required_attribute(record, "slack_msg_id")?;

        // Claim the message first. From here on this item is ours alone;
        // a crash below loses it rather than reprocessing it.
        let arn = QueueArn::parse(&record.event_source_arn)?;
        let source_url = self.queue.queue_url(&arn.account, &arn.name).await?;
        self.queue
            .delete_message(&source_url, &record.receipt_handle)
            .await?;

        let scratch = ScratchFile::new().map_err(FetchError::Io)?;
        self.fetcher.fetch(image_url, scratch.path()).await?;
        let image = scratch.read().await.map_err(FetchError::Io)?;

        // Check 1: disallowed words in extracted text.
        let fragments = self.scanner.detect_text(&image).await?;
        let detected_text: String =
            fragments.iter().map(|f| f.text.as_str()).collect();
        debug!(url = image_url, text = %detected_text, "Detected text");

        let matched_words = self.policy.matched_words(&detected_text);
        if !matched_words.is_empty() {
            info!(
                url = image_url,
                words = ?matched_words,
                "Word violation found"
            );
            self.send_violation(ViolationNotification::for_matches(
                &matched_words,
                image_url,
                slack_msg_id,
            ))
            .await?;
        }

        // Check 2: disallowed themes in detected categories.
        let labels = self
            .scanner
            .detect_moderation_labels(&image, self.min_label_confidence)
            .await?;
        let categories: Vec<String> = labels.into_iter().map(|l| l.name).collect();
        debug!(url = image_url, categories = ?categories, "Detected themes");

        let matched_themes = self.policy.matched_themes(&categories);
        if !matched_themes.is_empty() {
            info!(
                url = image_url,
                themes = ?matched_themes,
                "Theme violation found"
            );
            self.send_violation(ViolationNotification::for_matches(
                &matched_themes,
                image_url,
                slack_msg_id,
            ))
            .await?;
        }

        Ok(())
    }

    async fn send_violation(
        &self,
        notification: ViolationNotification,
    ) -> Result<(), QueueError> {
        self.queue
            .send_message(
                &self.violations_queue_url,
                &notification.body,
                &[
                    ("url", &notification.image_url),
                    ("slack_msg_id", &notification.slack_msg_id),
                ],
            )
            .await
    }
}

fn required_attribute<'a>(record: &'a QueueRecord, name: &str) -> Result<&'a str, QueueError> {
    record
        .attribute(name)
        .ok_or_else(|| QueueError::MissingAttribute(name.to_string()))
}
