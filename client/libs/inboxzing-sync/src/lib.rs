//! Inboxzing backend sync
//!
//! reqwest client for the catalog, preference and rewards endpoints, plus the
//! background worker that delivers reading-reward intents with retry.

pub mod api;
pub mod error;
pub mod retry;
pub mod worker;

use inboxzing_common::ClientConfig;
use reading_rewards::{intent_channel, IntentSender};
use std::sync::Arc;

pub use api::ApiClient;
pub use error::{SyncError, SyncResult};
pub use retry::{with_retry, RetryConfig, RetryError};
pub use worker::{RewardsBackend, SyncHandle, SyncReport, SyncWorker};

/// Spawn a sync worker for `username` and return the sender to hand to a `ReadTracker`
///
/// Must be called inside a tokio runtime.
pub fn spawn_sync_worker(
    backend: Arc<dyn RewardsBackend>,
    username: impl Into<String>,
    config: &ClientConfig,
) -> (IntentSender, SyncHandle) {
    let (sender, receiver) = intent_channel();
    let worker = SyncWorker::new(
        backend,
        username,
        RetryConfig::from_client_config(config),
        receiver,
    );
    (sender, worker.spawn())
}
