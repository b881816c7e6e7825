//! Bucket-cleanup lifecycle hook.
//!
//! Invoked by the deployment tooling around resource teardown. `Create`
//! and `Update` are no-ops; `Delete` empties the configured bucket so the
//! surrounding tooling can remove it. Anything else fails the invocation.

use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::clients::ObjectStore;
use crate::config::CleanupConfig;
use crate::error::{CleanupError, Error};
use crate::events::LifecycleEvent;

/// A resource-lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    Create,
    Update,
    Delete,
}

impl FromStr for LifecycleSignal {
    type Err = CleanupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Create" => Ok(Self::Create),
            "Update" => Ok(Self::Update),
            "Delete" => Ok(Self::Delete),
            other => Err(CleanupError::UnknownSignal(other.to_string())),
        }
    }
}

/// Cleanup handler.
pub struct CleanupHandler {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl CleanupHandler {
    pub fn new(store: Arc<dyn ObjectStore>, config: CleanupConfig) -> Self {
        Self {
            store,
            bucket: config.bucket,
        }
    }

    /// Dispatch one lifecycle event.
    pub async fn handle(&self, event: &LifecycleEvent) -> Result<(), Error> {
        match event.request_type.parse::<LifecycleSignal>()? {
            LifecycleSignal::Create => {
                info!("Nothing to do on Create");
                Ok(())
            }
            LifecycleSignal::Update => {
                info!("Nothing to do on Update");
                Ok(())
            }
            LifecycleSignal::Delete => self.empty_bucket().await,
        }
    }

    /// Delete every object in the bucket, unconditionally.
    async fn empty_bucket(&self) -> Result<(), Error> {
        let keys = self.store.list_keys(&self.bucket).await?;
        let count = keys.len();
        for key in keys {
            self.store.delete_object(&self.bucket, &key).await?;
        }
        info!(bucket = %self.bucket, count, "Emptied bucket");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::clients::MemoryObjectStore;

    fn lifecycle(request_type: &str) -> LifecycleEvent {
        serde_json::from_value(serde_json::json!({"RequestType": request_type})).unwrap()
    }

    async fn seeded_store() -> Arc<MemoryObjectStore> {
        let store = Arc::new(MemoryObjectStore::new());
        store.put_object("staging", "a.ndjson", b"1".to_vec()).await;
        store.put_object("staging", "nested/b.ndjson", b"2".to_vec()).await;
        store.put_object("other", "keep.txt", b"3".to_vec()).await;
        store
    }

    fn make_handler(store: Arc<MemoryObjectStore>) -> CleanupHandler {
        CleanupHandler::new(
            store,
            CleanupConfig {
                bucket: "staging".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn delete_empties_the_configured_bucket() {
        let store = seeded_store().await;
        let handler = make_handler(Arc::clone(&store));

        handler.handle(&lifecycle("Delete")).await.unwrap();

        assert_eq!(store.object_count("staging").await, 0);
        // Other buckets are untouched.
        assert_eq!(store.object_count("other").await, 1);
    }

    #[tokio::test]
    async fn create_and_update_touch_nothing() {
        let store = seeded_store().await;
        let handler = make_handler(Arc::clone(&store));

        handler.handle(&lifecycle("Create")).await.unwrap();
        handler.handle(&lifecycle("Update")).await.unwrap();

        assert_eq!(store.object_count("staging").await, 2);
    }

    #[tokio::test]
    async fn unknown_signal_fails_the_invocation() {
        let store = seeded_store().await;
        let handler = make_handler(Arc::clone(&store));

        let err = handler.handle(&lifecycle("Reboot")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Cleanup(CleanupError::UnknownSignal(ref signal)) if signal == "Reboot"
        ));
        assert_eq!(store.object_count("staging").await, 2);
    }

    #[tokio::test]
    async fn delete_on_empty_bucket_succeeds() {
        let store = Arc::new(MemoryObjectStore::new());
        let handler = make_handler(store);
        handler.handle(&lifecycle("Delete")).await.unwrap();
    }

    #[test]
    fn lifecycle_signals_parse_case_sensitively() {
        assert_eq!("Create".parse::<LifecycleSignal>().unwrap(), LifecycleSignal::Create);
        assert!("create".parse::<LifecycleSignal>().is_err());
        assert!("delete".parse::<LifecycleSignal>().is_err());
    }
}
