//! Preference draft and its wire form

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{WizardError, WizardResult};

/// Maximum number of sources a user may follow
pub const MAX_SOURCES: usize = 20;

/// Allowed update frequencies, in hours
pub const FREQUENCY_OPTIONS: [u32; 8] = [1, 3, 6, 12, 24, 48, 72, 96];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStyle {
    Brief,
    Detailed,
    Humorous,
    Eli5,
}

impl SummaryStyle {
    pub const ALL: [SummaryStyle; 4] = [
        SummaryStyle::Brief,
        SummaryStyle::Detailed,
        SummaryStyle::Humorous,
        SummaryStyle::Eli5,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryStyle::Brief => "brief",
            SummaryStyle::Detailed => "detailed",
            SummaryStyle::Humorous => "humorous",
            SummaryStyle::Eli5 => "eli5",
        }
    }
}

impl fmt::Display for SummaryStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryStyle {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SummaryStyle::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| WizardError::unknown("summary style", s))
    }
}

/// Update frequency restricted to [`FREQUENCY_OPTIONS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct UpdateFrequency(u32);

impl UpdateFrequency {
    pub const DAILY: UpdateFrequency = UpdateFrequency(24);

    pub fn hours(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for UpdateFrequency {
    type Error = WizardError;

    fn try_from(hours: u32) -> Result<Self, Self::Error> {
        if FREQUENCY_OPTIONS.contains(&hours) {
            Ok(Self(hours))
        } else {
            Err(WizardError::unknown("frequency", hours.to_string()))
        }
    }
}

impl From<UpdateFrequency> for u32 {
    fn from(frequency: UpdateFrequency) -> Self {
        frequency.0
    }
}

/// In-progress preference selection
///
/// Field invariants (cascading resets, source cap) are enforced by
/// [`SelectionModel`](crate::selection::SelectionModel), the only writer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceDraft {
    pub country: Option<String>,
    pub category: Option<String>,
    pub sources: BTreeSet<String>,
    pub summary_style: Option<SummaryStyle>,
    pub frequency: Option<UpdateFrequency>,
}

impl PreferenceDraft {
    pub fn is_complete(&self) -> bool {
        self.country.is_some()
            && self.category.is_some()
            && (1..=MAX_SOURCES).contains(&self.sources.len())
            && self.summary_style.is_some()
            && self.frequency.is_some()
    }

    /// Body for `PUT /preferences/{username}`
    pub fn to_payload(&self) -> WizardResult<PreferencePayload> {
        let incomplete = || WizardError::Validation("Please complete all preferences".into());

        if self.sources.is_empty() || self.sources.len() > MAX_SOURCES {
            return Err(incomplete());
        }

        Ok(PreferencePayload {
            country: self.country.clone().ok_or_else(incomplete)?,
            category: self.category.clone().ok_or_else(incomplete)?,
            sources: self.sources.iter().cloned().collect::<Vec<_>>().join(","),
            summary_style: self.summary_style.ok_or_else(incomplete)?,
            frequency: self.frequency.ok_or_else(incomplete)?.hours(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencePayload {
    pub country: String,
    pub category: String,
    /// Comma-joined source ids
    pub sources: String,
    pub summary_style: SummaryStyle,
    pub frequency: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_draft() -> PreferenceDraft {
        PreferenceDraft {
            country: Some("us".into()),
            category: Some("technology".into()),
            sources: ["wired".to_string(), "ars-technica".to_string()].into(),
            summary_style: Some(SummaryStyle::Brief),
            frequency: Some(UpdateFrequency::try_from(12).unwrap()),
        }
    }

    #[test]
    fn test_summary_style_parse() {
        assert_eq!("ELI5".parse::<SummaryStyle>().unwrap(), SummaryStyle::Eli5);
        assert!("sarcastic".parse::<SummaryStyle>().is_err());
    }

    #[test]
    fn test_frequency_only_allows_fixed_set() {
        assert!(UpdateFrequency::try_from(48).is_ok());
        assert!(matches!(
            UpdateFrequency::try_from(2),
            Err(WizardError::UnknownOption { field: "frequency", .. })
        ));
    }

    #[test]
    fn test_payload_wire_shape() {
        let payload = complete_draft().to_payload().unwrap();
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["country"], "us");
        assert_eq!(json["sources"], "ars-technica,wired");
        assert_eq!(json["summaryStyle"], "brief");
        assert_eq!(json["frequency"], 12);
    }

    #[test]
    fn test_payload_requires_every_field() {
        let mut draft = complete_draft();
        draft.frequency = None;
        assert!(!draft.is_complete());
        assert!(matches!(draft.to_payload(), Err(WizardError::Validation(_))));

        let mut draft = complete_draft();
        draft.sources.clear();
        assert!(draft.to_payload().is_err());
    }

    #[test]
    fn test_frequency_deserialize_rejects_unknown() {
        let result: Result<UpdateFrequency, _> = serde_json::from_str("5");
        assert!(result.is_err());
    }
}
