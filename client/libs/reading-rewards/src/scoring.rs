//! Scoring engine
//!
//! Points for reading, daily streaks, weekend double points and milestones.
//!
//! Dwell-gated read award:
//! 1. under `min_reading_secs` earns nothing and leaves the streak alone
//! 2. `base + base * min(streak, max_streak_bonus) * streak_bonus_percent / 100`
//! 3. doubled when the award instant is a Saturday or Sunday in the reference calendar
//! 4. streak updated from the gap since the previous qualifying read
//! 5. every milestone crossed for the first time is reported once
//!
//! Feed clicks earn `click_points * min(click_count, max_click_multiplier)` with no
//! streak or weekend logic. An article earns in at most one of the two modes.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Offset, Utc, Weekday};
use inboxzing_common::ClientConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

use crate::error::{RewardsError, RewardsResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringConfig {
    pub min_reading_secs: u64,
    pub base_points: u64,
    pub streak_bonus_percent: u64,
    pub max_streak_bonus: u32,
    pub click_points: u64,
    pub max_click_multiplier: u32,
    pub all_read_bonus: u64,
    /// Ascending, deduplicated
    pub milestones: Vec<u64>,
    /// Gaps longer than this extend the streak
    pub streak_continue_after: Duration,
    /// Gaps at least this long break the streak
    pub streak_reset_after: Duration,
    pub reference_offset: FixedOffset,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_reading_secs: 20,
            base_points: 10,
            streak_bonus_percent: 10,
            max_streak_bonus: 5,
            click_points: 10,
            max_click_multiplier: 5,
            all_read_bonus: 20,
            milestones: vec![100, 250, 500, 1000],
            streak_continue_after: Duration::hours(24),
            streak_reset_after: Duration::hours(48),
            reference_offset: Utc.fix(),
        }
    }
}

impl ScoringConfig {
    /// Defaults with the weekend calendar taken from client configuration
    pub fn from_client_config(config: &ClientConfig) -> RewardsResult<Self> {
        Ok(Self {
            reference_offset: config.reference_offset()?,
            ..Self::default()
        })
    }

    pub fn with_milestones(mut self, milestones: impl IntoIterator<Item = u64>) -> Self {
        let mut milestones: Vec<u64> = milestones.into_iter().collect();
        milestones.sort_unstable();
        milestones.dedup();
        self.milestones = milestones;
        self
    }

    pub fn validate(&self) -> RewardsResult<()> {
        if self.streak_reset_after <= self.streak_continue_after {
            return Err(RewardsError::Config(
                "streak_reset_after must be longer than streak_continue_after".into(),
            ));
        }
        if self.milestones.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(RewardsError::Config(
                "milestones must be strictly ascending".into(),
            ));
        }
        Ok(())
    }
}

/// Per-user score
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreState {
    pub points: u64,
    pub streak: u32,
    pub last_qualifying_at: Option<DateTime<Utc>>,
    pub milestones_reached: BTreeSet<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwardReason {
    Read,
    Click,
    AllRead,
}

/// Outcome of one award call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    pub reason: AwardReason,
    pub earned: u64,
    pub double_points: bool,
    /// Streak after the award
    pub streak: u32,
    pub new_milestones: Vec<u64>,
}

impl Award {
    fn nothing(reason: AwardReason, streak: u32) -> Self {
        Self {
            reason,
            earned: 0,
            double_points: false,
            streak,
            new_milestones: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.earned == 0
    }
}

#[derive(Debug)]
pub struct ScoringEngine {
    config: ScoringConfig,
    state: ScoreState,
    click_count: u32,
    rewarded: HashSet<String>,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> RewardsResult<Self> {
        Self::with_state(config, ScoreState::default())
    }

    /// Resume from a previously saved score
    pub fn with_state(config: ScoringConfig, state: ScoreState) -> RewardsResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state,
            click_count: 0,
            rewarded: HashSet::new(),
        })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn state(&self) -> &ScoreState {
        &self.state
    }

    pub fn click_count(&self) -> u32 {
        self.click_count
    }

    pub fn is_rewarded(&self, article: &str) -> bool {
        self.rewarded.contains(article)
    }

    /// Saturday or Sunday in the reference calendar
    pub fn is_double_points_day(&self, now: DateTime<Utc>) -> bool {
        matches!(
            now.with_timezone(&self.config.reference_offset).weekday(),
            Weekday::Sat | Weekday::Sun
        )
    }

    /// Dwell-gated award, not tied to an article
    pub fn award_for_read(&mut self, reading_secs: u64, now: DateTime<Utc>) -> Award {
        if reading_secs < self.config.min_reading_secs {
            debug!(
                reading_secs,
                threshold = self.config.min_reading_secs,
                "Read below dwell threshold"
            );
            return Award::nothing(AwardReason::Read, self.state.streak);
        }

        let base = self.config.base_points;
        let multiplier = u64::from(self.state.streak.min(self.config.max_streak_bonus));
        let bonus = base * multiplier * self.config.streak_bonus_percent / 100;
        let double_points = self.is_double_points_day(now);

        let mut earned = base + bonus;
        if double_points {
            earned *= 2;
        }

        self.state.points = self.state.points.saturating_add(earned);
        self.update_streak(now);
        let new_milestones = self.record_milestones();

        info!(
            earned,
            reading_secs,
            double_points,
            streak = self.state.streak,
            points = self.state.points,
            "Read rewarded"
        );

        Award {
            reason: AwardReason::Read,
            earned,
            double_points,
            streak: self.state.streak,
            new_milestones,
        }
    }

    /// Dwell-gated award for a specific article
    ///
    /// A read under the threshold does not consume the article, so a later
    /// longer read can still earn.
    pub fn award_read_session(
        &mut self,
        article: &str,
        reading_secs: u64,
        now: DateTime<Utc>,
    ) -> RewardsResult<Award> {
        if self.rewarded.contains(article) {
            return Err(RewardsError::AlreadyRewarded(article.to_string()));
        }

        let award = self.award_for_read(reading_secs, now);
        if !award.is_empty() {
            self.rewarded.insert(article.to_string());
        }
        Ok(award)
    }

    /// Feed-click award without dwell gating
    pub fn award_for_click(&mut self, article: &str) -> RewardsResult<Award> {
        if self.rewarded.contains(article) {
            return Err(RewardsError::AlreadyRewarded(article.to_string()));
        }

        self.click_count += 1;
        let multiplier = u64::from(self.click_count.min(self.config.max_click_multiplier));
        let earned = self.config.click_points * multiplier;

        self.state.points = self.state.points.saturating_add(earned);
        self.rewarded.insert(article.to_string());
        let new_milestones = self.record_milestones();

        info!(
            article,
            earned,
            clicks = self.click_count,
            points = self.state.points,
            "Click rewarded"
        );

        Ok(Award {
            reason: AwardReason::Click,
            earned,
            double_points: false,
            streak: self.state.streak,
            new_milestones,
        })
    }

    /// Fixed bonus, no multipliers
    pub fn award_bonus(&mut self, amount: u64, reason: AwardReason) -> Award {
        self.state.points = self.state.points.saturating_add(amount);
        let new_milestones = self.record_milestones();

        info!(amount, ?reason, points = self.state.points, "Bonus awarded");

        Award {
            reason,
            earned: amount,
            double_points: false,
            streak: self.state.streak,
            new_milestones,
        }
    }

    /// Reset the streak if the last qualifying read is too old; returns whether it reset
    pub fn check_streak_expiry(&mut self, now: DateTime<Utc>) -> bool {
        let Some(last) = self.state.last_qualifying_at else {
            return false;
        };
        if self.state.streak == 0 || now - last < self.config.streak_reset_after {
            return false;
        }

        info!(
            previous = self.state.streak,
            last_read = %last,
            "Streak expired"
        );
        self.state.streak = 0;
        true
    }

    fn update_streak(&mut self, now: DateTime<Utc>) {
        self.state.streak = match self.state.last_qualifying_at {
            None => self.state.streak + 1,
            Some(last) => {
                let gap = now - last;
                if gap >= self.config.streak_reset_after {
                    1
                } else if gap > self.config.streak_continue_after {
                    self.state.streak + 1
                } else {
                    self.state.streak
                }
            }
        };
        self.state.last_qualifying_at = Some(now);
    }

    fn record_milestones(&mut self) -> Vec<u64> {
        let points = self.state.points;
        let crossed: Vec<u64> = self
            .config
            .milestones
            .iter()
            .copied()
            .filter(|threshold| points >= *threshold)
            .filter(|threshold| !self.state.milestones_reached.contains(threshold))
            .collect();

        for threshold in &crossed {
            info!(milestone = threshold, points, "Milestone reached");
            self.state.milestones_reached.insert(*threshold);
        }
        crossed
    }
}
