//! Signed-in user context
//!
//! Holds the saved preferences that drive the news feed. Updated only from
//! a successfully submitted wizard draft.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

use crate::draft::{PreferenceDraft, SummaryStyle, UpdateFrequency};
use crate::error::{WizardError, WizardResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPreferences {
    pub country: String,
    pub category: String,
    pub sources: BTreeSet<String>,
    pub summary_style: SummaryStyle,
    pub frequency: UpdateFrequency,
}

impl Default for SavedPreferences {
    fn default() -> Self {
        Self {
            country: "us".to_string(),
            category: "general".to_string(),
            sources: ["cnn", "abc-news", "fox-news"]
                .into_iter()
                .map(String::from)
                .collect(),
            summary_style: SummaryStyle::Detailed,
            frequency: UpdateFrequency::DAILY,
        }
    }
}

impl TryFrom<PreferenceDraft> for SavedPreferences {
    type Error = WizardError;

    fn try_from(draft: PreferenceDraft) -> WizardResult<Self> {
        let incomplete = || WizardError::Validation("Please complete all preferences".into());
        if !draft.is_complete() {
            return Err(incomplete());
        }

        Ok(Self {
            country: draft.country.ok_or_else(incomplete)?,
            category: draft.category.ok_or_else(incomplete)?,
            sources: draft.sources,
            summary_style: draft.summary_style.ok_or_else(incomplete)?,
            frequency: draft.frequency.ok_or_else(incomplete)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    username: String,
    logged_in: bool,
    preferences: SavedPreferences,
}

impl UserContext {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            logged_in: false,
            preferences: SavedPreferences::default(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn set_logged_in(&mut self, logged_in: bool) {
        self.logged_in = logged_in;
    }

    pub fn preferences(&self) -> &SavedPreferences {
        &self.preferences
    }

    /// Replace saved preferences with a submitted draft
    pub fn apply_submitted(&mut self, draft: PreferenceDraft) -> WizardResult<()> {
        self.preferences = SavedPreferences::try_from(draft)?;
        info!(
            username = %self.username,
            country = %self.preferences.country,
            category = %self.preferences.category,
            sources = self.preferences.sources.len(),
            "User preferences updated"
        );
        Ok(())
    }
}
