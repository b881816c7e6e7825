//! Boundary collaborators: object storage, work queues, image detection,
//! and image download.
//!
//! Each collaborator is a trait so handlers take injected dependencies and
//! tests substitute in-memory doubles. One working implementation ships per
//! trait.

pub mod detection;
pub mod fetch;
pub mod queue;
pub mod storage;

pub use detection::{ImageScanner, ModerationLabel, TextFragment, VisionHttpScanner};
pub use fetch::{HttpImageFetcher, ImageFetcher};
pub use queue::{MemoryQueue, QueueArn, SentMessage, SqsHttpQueue, WorkQueue};
pub use storage::{FsObjectStore, MemoryObjectStore, ObjectStore};
