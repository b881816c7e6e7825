//! Invocation dispatcher.
//!
//! Runs exactly one handler per process: the handler name comes as the
//! first argument, the event JSON on stdin. Mirrors the hosting platform's
//! one-event-per-invocation model without binding to its runtime.
//!
//! Usage:
//!   image-patrol parse-messages  < storage-event.json
//!   image-patrol moderate-images < queue-event.json
//!   image-patrol cleanup         < lifecycle-event.json

use std::sync::Arc;

use anyhow::{Context, bail};
use tokio::io::AsyncReadExt;
use tracing::info;
use uuid::Uuid;

use image_patrol::cleanup::CleanupHandler;
use image_patrol::clients::{
    FsObjectStore, HttpImageFetcher, SqsHttpQueue, VisionHttpScanner,
};
use image_patrol::config::{
    CleanupConfig, ClientSettings, ModeratorConfig, ParserConfig,
};
use image_patrol::pipeline::{ImageModerator, MessageParser};
use image_patrol::policy::PolicyLists;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let handler = std::env::args()
        .nth(1)
        .context("usage: image-patrol <parse-messages|moderate-images|cleanup> < event.json")?;

    let mut raw_event = String::new();
    tokio::io::stdin()
        .read_to_string(&mut raw_event)
        .await
        .context("failed to read event from stdin")?;

    let invocation = Uuid::new_v4();
    info!(%invocation, handler = %handler, "Invocation starting");

    let settings = ClientSettings::from_env()?;

    match handler.as_str() {
        "parse-messages" => {
            let parser = MessageParser::new(
                Arc::new(FsObjectStore::new(settings.object_store_root.clone())),
                Arc::new(SqsHttpQueue::new(settings.queue_endpoint.clone())),
                ParserConfig::from_env()?,
            );
            let event = serde_json::from_str(&raw_event)
                .context("malformed storage event")?;
            let enqueued = parser.handle(&event).await;
            info!(%invocation, enqueued, "Invocation complete");
        }
        "moderate-images" => {
            let config = ModeratorConfig::from_env()?;
            let policy = PolicyLists::load(config.policy_file.as_deref())?;
            let moderator = ImageModerator::new(
                Arc::new(SqsHttpQueue::new(settings.queue_endpoint.clone())),
                Arc::new(VisionHttpScanner::new(
                    settings.vision_endpoint.clone(),
                    settings.vision_api_key.clone(),
                )),
                Arc::new(HttpImageFetcher::new()),
                policy,
                config,
            );
            let event = serde_json::from_str(&raw_event)
                .context("malformed queue event")?;
            moderator.handle(&event).await?;
            info!(%invocation, "Invocation complete");
        }
        "cleanup" => {
            let handler = CleanupHandler::new(
                Arc::new(FsObjectStore::new(settings.object_store_root.clone())),
                CleanupConfig::from_env()?,
            );
            let event = serde_json::from_str(&raw_event)
                .context("malformed lifecycle event")?;
            handler.handle(&event).await?;
            info!(%invocation, "Invocation complete");
        }
        other => bail!("unknown handler: {other}"),
    }

    Ok(())
}
