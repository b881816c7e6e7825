//! Configuration types.
//!
//! Each handler reads its own environment variables at startup; the client
//! settings are shared by whichever handlers the invocation wires up.
//! Missing required variables fail fast with `ConfigError::MissingEnvVar`.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default minimum confidence (percent) for moderation-category detection.
pub const DEFAULT_MIN_LABEL_CONFIDENCE: f32 = 80.0;

fn require_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Message-parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Queue receiving one message per discovered image attachment.
    pub image_queue_url: String,
}

impl ParserConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            image_queue_url: require_env("IMAGE_QUEUE_URL")?,
        })
    }
}

/// Image-moderator configuration.
#[derive(Debug, Clone)]
pub struct ModeratorConfig {
    /// Queue receiving violation notifications.
    pub violations_queue_url: String,
    /// Optional JSON policy-lists file; built-in defaults when unset.
    pub policy_file: Option<PathBuf>,
    /// Minimum confidence (percent) for moderation-category detection.
    pub min_label_confidence: f32,
}

impl ModeratorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let min_label_confidence = match std::env::var("MIN_LABEL_CONFIDENCE") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "MIN_LABEL_CONFIDENCE".to_string(),
                message: format!("not a number: {raw}"),
            })?,
            Err(_) => DEFAULT_MIN_LABEL_CONFIDENCE,
        };

        Ok(Self {
            violations_queue_url: require_env("VIOLATIONS_QUEUE_URL")?,
            policy_file: std::env::var("POLICY_FILE").ok().map(PathBuf::from),
            min_label_confidence,
        })
    }
}

/// Cleanup-handler configuration.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Bucket emptied on the `Delete` lifecycle signal.
    pub bucket: String,
}

impl CleanupConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bucket: require_env("MODERATION_BUCKET")?,
        })
    }
}

/// Settings for the boundary-collaborator clients.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// SQS-compatible queue endpoint.
    pub queue_endpoint: String,
    /// Vision-service annotate endpoint.
    pub vision_endpoint: String,
    /// Vision-service API key.
    pub vision_api_key: SecretString,
    /// Root directory of the filesystem object store.
    pub object_store_root: PathBuf,
}

impl ClientSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            queue_endpoint: require_env("QUEUE_ENDPOINT")?,
            vision_endpoint: require_env("VISION_ENDPOINT")?,
            vision_api_key: SecretString::from(require_env("VISION_API_KEY")?),
            object_store_root: PathBuf::from(require_env("OBJECT_STORE_ROOT")?),
        })
    }
}
