//! Sync intents
//!
//! Local score changes apply immediately; the backend catches up through
//! these intents, drained by a background worker.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::scoring::AwardReason;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncIntent {
    MarkAsRead {
        article_url: String,
        reading_secs: u64,
    },
    ReportPoints {
        points: u64,
        reason: AwardReason,
    },
}

pub type IntentSender = mpsc::UnboundedSender<SyncIntent>;
pub type IntentReceiver = mpsc::UnboundedReceiver<SyncIntent>;

pub fn intent_channel() -> (IntentSender, IntentReceiver) {
    mpsc::unbounded_channel()
}
