//! Read tracker
//!
//! `Idle → Reading(article, opened_at) → Idle`. Closing a read measures dwell
//! time, asks the scoring engine for an award and marks the article read.
//! Emptying the unread set pays the all-read bonus once per feed load.

use chrono::{DateTime, Utc};
use inboxzing_common::Clock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{RewardsError, RewardsResult};
use crate::intent::{IntentSender, SyncIntent};
use crate::scoring::{Award, AwardReason, ScoringEngine};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleReadSession {
    pub id: Uuid,
    pub article_url: String,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Result of closing a read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadReceipt {
    pub session: ArticleReadSession,
    pub reading_secs: u64,
    /// `None` when the article had already been rewarded
    pub award: Option<Award>,
    pub all_read_bonus: Option<Award>,
    pub remaining_unread: usize,
}

impl ReadReceipt {
    pub fn total_earned(&self) -> u64 {
        self.award.as_ref().map_or(0, |a| a.earned)
            + self.all_read_bonus.as_ref().map_or(0, |a| a.earned)
    }
}

pub struct ReadTracker {
    clock: Arc<dyn Clock>,
    engine: ScoringEngine,
    active: Option<ArticleReadSession>,
    unread: HashSet<String>,
    all_read_paid: bool,
    intents: Option<IntentSender>,
}

impl ReadTracker {
    pub fn new(clock: Arc<dyn Clock>, engine: ScoringEngine) -> Self {
        Self {
            clock,
            engine,
            active: None,
            unread: HashSet::new(),
            all_read_paid: false,
            intents: None,
        }
    }

    /// Emit sync intents on `sender`
    pub fn with_sync(mut self, sender: IntentSender) -> Self {
        self.intents = Some(sender);
        self
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn active_session(&self) -> Option<&ArticleReadSession> {
        self.active.as_ref()
    }

    pub fn is_reading(&self) -> bool {
        self.active.is_some()
    }

    pub fn unread_count(&self) -> usize {
        self.unread.len()
    }

    /// Start a new feed; resets the unread set and the all-read bonus
    pub fn load_feed<I, S>(&mut self, articles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unread = articles.into_iter().map(Into::into).collect();
        self.all_read_paid = false;
        info!(articles = self.unread.len(), "Feed loaded");
    }

    pub fn open(&mut self, article_url: impl Into<String>) -> RewardsResult<Uuid> {
        if let Some(active) = &self.active {
            return Err(RewardsError::ConcurrentReadNotSupported {
                open: active.article_url.clone(),
            });
        }

        let session = ArticleReadSession {
            id: Uuid::new_v4(),
            article_url: article_url.into(),
            opened_at: self.clock.now(),
            closed_at: None,
        };
        debug!(session = %session.id, article = %session.article_url, "Article opened");

        let id = session.id;
        self.active = Some(session);
        Ok(id)
    }

    /// Close whatever is open
    pub fn close(&mut self) -> RewardsResult<ReadReceipt> {
        let session = self.active.take().ok_or(RewardsError::NoActiveRead)?;
        self.finish(session)
    }

    /// Close a specific session; a session closes at most once
    pub fn close_session(&mut self, id: Uuid) -> RewardsResult<ReadReceipt> {
        match self.active.take() {
            Some(session) if session.id == id => self.finish(session),
            other => {
                self.active = other;
                Err(RewardsError::SessionAlreadyClosed(id))
            }
        }
    }

    /// Feed click without dwell gating
    pub fn record_click(&mut self, article_url: &str) -> RewardsResult<Award> {
        let award = self.engine.award_for_click(article_url)?;
        self.report_points(&award);
        Ok(award)
    }

    /// Scheduled streak check against the tracker's clock
    pub fn check_streak_expiry(&mut self) -> bool {
        let now = self.clock.now();
        self.engine.check_streak_expiry(now)
    }

    fn finish(&mut self, mut session: ArticleReadSession) -> RewardsResult<ReadReceipt> {
        let now = self.clock.now();
        let reading_secs = u64::try_from((now - session.opened_at).num_seconds()).unwrap_or(0);
        session.closed_at = Some(now);

        let award = match self
            .engine
            .award_read_session(&session.article_url, reading_secs, now)
        {
            Ok(award) => Some(award),
            Err(RewardsError::AlreadyRewarded(article)) => {
                debug!(article = %article, "Article already rewarded");
                None
            }
            Err(err) => return Err(err),
        };

        self.send(SyncIntent::MarkAsRead {
            article_url: session.article_url.clone(),
            reading_secs,
        });
        if let Some(award) = &award {
            self.report_points(award);
        }

        let all_read_bonus = self.mark_read(&session.article_url);

        info!(
            article = %session.article_url,
            reading_secs,
            earned = award.as_ref().map_or(0, |a| a.earned),
            remaining = self.unread.len(),
            "Article closed"
        );

        Ok(ReadReceipt {
            session,
            reading_secs,
            award,
            all_read_bonus,
            remaining_unread: self.unread.len(),
        })
    }

    fn mark_read(&mut self, article_url: &str) -> Option<Award> {
        if !self.unread.remove(article_url) || !self.unread.is_empty() || self.all_read_paid {
            return None;
        }

        self.all_read_paid = true;
        let amount = self.engine.config().all_read_bonus;
        let bonus = self.engine.award_bonus(amount, AwardReason::AllRead);
        self.report_points(&bonus);
        Some(bonus)
    }

    fn report_points(&self, award: &Award) {
        if award.is_empty() {
            return;
        }
        self.send(SyncIntent::ReportPoints {
            points: award.earned,
            reason: award.reason,
        });
    }

    fn send(&self, intent: SyncIntent) {
        let Some(sender) = &self.intents else {
            return;
        };
        if let Err(err) = sender.send(intent) {
            warn!(intent = ?err.0, "Sync worker gone, dropping intent");
        }
    }
}
