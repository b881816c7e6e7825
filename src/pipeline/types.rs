//! Shared types for the moderation pipeline.

use serde::{Deserialize, Serialize};

/// Sentinel recorded when a source message carried no `client_msg_id`.
pub const MISSING_MSG_ID: &str = "None Found";

/// Fixed body of a work-item enqueue message. The payload travels in the
/// message attributes; the body is informational.
pub const WORK_ITEM_BODY: &str = "Image to Check";

// ── Inbound chat messages ───────────────────────────────────────────

/// One line of an inbound message batch.
///
/// The sync connector writes selected fields only; anything else on the
/// line is ignored. A message with no attachments is valid and simply
/// yields no work.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub client_msg_id: Option<String>,
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
}

/// A message attachment. Only image attachments carry `image_url`.
#[derive(Debug, Clone, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ChatMessage {
    /// One work item per attachment bearing an `image_url`. All items from
    /// one message share its `client_msg_id`, or the sentinel when absent.
    pub fn work_items(&self) -> Vec<ImageWorkItem> {
        let slack_msg_id = self
            .client_msg_id
            .clone()
            .unwrap_or_else(|| MISSING_MSG_ID.to_string());

        self.attachments
            .iter()
            .flatten()
            .filter_map(|a| a.image_url.as_ref())
            .map(|url| ImageWorkItem {
                image_url: url.clone(),
                slack_msg_id: slack_msg_id.clone(),
            })
            .collect()
    }
}

// ── Work items ──────────────────────────────────────────────────────

/// One image awaiting moderation, derived from one message attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageWorkItem {
    pub image_url: String,
    pub slack_msg_id: String,
}

// ── Violation notifications ─────────────────────────────────────────

/// An alert emitted when an image fails a policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationNotification {
    pub body: String,
    pub image_url: String,
    pub slack_msg_id: String,
}

impl ViolationNotification {
    /// Build a notification for a set of matched words or themes.
    pub fn for_matches(matches: &[&str], image_url: &str, slack_msg_id: &str) -> Self {
        Self {
            body: format!("Image with \"{}\" found", matches.join(", ")),
            image_url: image_url.to_string(),
            slack_msg_id: slack_msg_id.to_string(),
        }
    }
}
