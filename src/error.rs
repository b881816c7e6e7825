//! Error types for the moderation pipeline.

/// Top-level error type for the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Detection error: {0}")]
    Detection(#[from] DetectionError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Cleanup error: {0}")]
    Cleanup(#[from] CleanupError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse policy file {path}: {message}")]
    PolicyParse { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Object-store errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Object not found: {key} in bucket {bucket}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("List failed for bucket {bucket}: {reason}")]
    ListFailed { bucket: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Work-queue errors.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Failed to send message to {queue_url}: {reason}")]
    SendFailed { queue_url: String, reason: String },

    #[error("Failed to delete message from {queue_url}: {reason}")]
    DeleteFailed { queue_url: String, reason: String },

    #[error("Failed to resolve queue URL for {name}: {reason}")]
    UrlResolution { name: String, reason: String },

    #[error("Malformed queue ARN: {0}")]
    MalformedArn(String),

    #[error("Queue record missing attribute: {0}")]
    MissingAttribute(String),
}

/// Detection-service errors.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("Detection request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid detection response: {0}")]
    InvalidResponse(String),
}

/// Image-download errors.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to fetch {url}: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("Fetch of {url} returned status {status}")]
    BadStatus { url: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed-input errors.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed JSON on line {line}: {message}")]
    MalformedLine { line: usize, message: String },

    #[error("Batch object is not valid UTF-8: {0}")]
    InvalidUtf8(String),
}

/// Cleanup-handler errors.
#[derive(Debug, thiserror::Error)]
pub enum CleanupError {
    #[error("Invalid lifecycle signal: {0}")]
    UnknownSignal(String),
}

/// Result type alias for the pipeline.
pub type Result<T> = std::result::Result<T, Error>;
