//! Background sync worker
//!
//! Drains [`SyncIntent`]s sent by the read tracker and delivers them to the
//! rewards backend. Points updates are sent exactly once: the endpoint adds
//! to the stored total, so a request that timed out may still have been
//! applied. Mark-as-read is idempotent and is retried with backoff.
//!
//! Local points are never rolled back. A failed intent is logged and counted
//! in the report.
//!
//! The worker runs until every intent sender has been dropped.

use anyhow::Context;
use async_trait::async_trait;
use inboxzing_common::{CollaboratorError, CollaboratorResult};
use reading_rewards::{IntentReceiver, SyncIntent};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::retry::{with_retry, RetryConfig, RetryError};

/// Backend endpoints for score sync
#[async_trait]
pub trait RewardsBackend: Send + Sync {
    /// Returns the backend's confirmation message
    async fn update_points(&self, username: &str, points: u64) -> CollaboratorResult<String>;

    async fn mark_as_read(
        &self,
        username: &str,
        article_url: &str,
        reading_secs: u64,
    ) -> CollaboratorResult<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub delivered: u64,
    pub failed: u64,
    pub points_reported: u64,
    /// Points credited locally that the backend never acknowledged
    pub points_unsynced: u64,
}

pub struct SyncWorker {
    backend: Arc<dyn RewardsBackend>,
    username: String,
    retry: RetryConfig,
    receiver: IntentReceiver,
    report: SyncReport,
}

impl SyncWorker {
    pub fn new(
        backend: Arc<dyn RewardsBackend>,
        username: impl Into<String>,
        retry: RetryConfig,
        receiver: IntentReceiver,
    ) -> Self {
        Self {
            backend,
            username: username.into(),
            retry,
            receiver,
            report: SyncReport::default(),
        }
    }

    /// Process intents in arrival order until the channel closes
    pub async fn run(mut self) -> SyncReport {
        info!(
            username = %self.username,
            max_retries = self.retry.max_retries,
            "Sync worker starting"
        );

        while let Some(intent) = self.receiver.recv().await {
            self.process(intent).await;
        }

        info!(
            delivered = self.report.delivered,
            failed = self.report.failed,
            points_unsynced = self.report.points_unsynced,
            "Sync worker stopped"
        );
        self.report
    }

    pub fn spawn(self) -> SyncHandle {
        SyncHandle {
            handle: tokio::spawn(self.run()),
        }
    }

    async fn process(&mut self, intent: SyncIntent) {
        match self.deliver(&intent).await {
            Ok(()) => {
                self.report.delivered += 1;
                if let SyncIntent::ReportPoints { points, .. } = intent {
                    self.report.points_reported += points;
                }
            }
            Err(err) => {
                self.report.failed += 1;
                match &intent {
                    SyncIntent::ReportPoints { points, reason } => {
                        self.report.points_unsynced += points;
                        error!(
                            username = %self.username,
                            points,
                            ?reason,
                            error = %err,
                            "Failed to report points"
                        );
                    }
                    SyncIntent::MarkAsRead { article_url, .. } => {
                        warn!(
                            username = %self.username,
                            article = %article_url,
                            error = %err,
                            "Failed to mark article as read"
                        );
                    }
                }
            }
        }
    }

    async fn deliver(&self, intent: &SyncIntent) -> CollaboratorResult<()> {
        let backend = &self.backend;
        let username = self.username.as_str();

        match intent {
            SyncIntent::ReportPoints { points, .. } => {
                let message = backend.update_points(username, *points).await?;
                debug!(points, %message, "Points reported");
            }
            SyncIntent::MarkAsRead {
                article_url,
                reading_secs,
            } => {
                with_retry(&self.retry, CollaboratorError::is_retryable, || {
                    backend.mark_as_read(username, article_url, *reading_secs)
                })
                .await
                .map_err(RetryError::into_inner)?;
                debug!(article = %article_url, "Article marked as read");
            }
        }
        Ok(())
    }
}

/// Handle to a spawned [`SyncWorker`]
pub struct SyncHandle {
    handle: JoinHandle<SyncReport>,
}

impl SyncHandle {
    /// Wait for the worker to drain; drop every intent sender first
    pub async fn join(self) -> anyhow::Result<SyncReport> {
        self.handle.await.context("sync worker task failed")
    }
}
