//! Reading rewards
//!
//! Gamification core for the news feed: a [`ScoringEngine`] that turns reads
//! and clicks into points, streaks and milestones, and a [`ReadTracker`] that
//! measures dwell time per article and forwards score changes as
//! [`SyncIntent`]s for background delivery.

pub mod error;
pub mod intent;
pub mod scoring;
pub mod tracker;

pub use error::{RewardsError, RewardsResult};
pub use intent::{intent_channel, IntentReceiver, IntentSender, SyncIntent};
pub use scoring::{Award, AwardReason, ScoreState, ScoringConfig, ScoringEngine};
pub use tracker::{ArticleReadSession, ReadReceipt, ReadTracker};
