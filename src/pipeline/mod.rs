//! The ingestion-and-moderation pipeline.
//!
//! Inbound message batches flow through:
//! 1. `MessageParser`: batch object → one queued work item per image
//! 2. `ImageModerator`: work item → download, detect, screen, notify
//!
//! Violations land on the violations queue for the external alerting
//! consumer.

pub mod moderator;
pub mod parser;
pub mod types;

pub use moderator::ImageModerator;
pub use parser::MessageParser;
