//! Selection model
//!
//! Sole writer of the [`PreferenceDraft`]. Upstream picks reset everything
//! downstream of them:
//! - country selected → category and sources cleared
//! - category selected → sources cleared, available sources repopulated
//!
//! Sources are toggled one at a time and capped at [`MAX_SOURCES`].

use std::sync::Arc;
use tracing::debug;

use crate::catalog::{OptionCatalog, SourceOption};
use crate::draft::{PreferenceDraft, SummaryStyle, UpdateFrequency, MAX_SOURCES};
use crate::error::{WizardError, WizardResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceToggle {
    Added,
    Removed,
}

#[derive(Debug, Default)]
pub struct SelectionModel {
    catalog: Option<Arc<OptionCatalog>>,
    draft: PreferenceDraft,
    available_sources: Vec<SourceOption>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the catalog once it arrives
    pub fn attach_catalog(&mut self, catalog: Arc<OptionCatalog>) {
        self.available_sources = match (&self.draft.country, &self.draft.category) {
            (Some(country), Some(category)) => catalog
                .sources(country, category)
                .map(<[SourceOption]>::to_vec)
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        self.catalog = Some(catalog);
    }

    pub fn has_catalog(&self) -> bool {
        self.catalog.is_some()
    }

    pub fn draft(&self) -> &PreferenceDraft {
        &self.draft
    }

    pub(crate) fn take_draft(&mut self) -> PreferenceDraft {
        self.available_sources.clear();
        std::mem::take(&mut self.draft)
    }

    pub fn countries(&self) -> Vec<&str> {
        self.catalog
            .as_deref()
            .map(|catalog| catalog.countries().collect())
            .unwrap_or_default()
    }

    /// Categories offered for the selected country
    pub fn available_categories(&self) -> Vec<&str> {
        match (self.catalog.as_deref(), self.draft.country.as_deref()) {
            (Some(catalog), Some(country)) => catalog.categories(country),
            _ => Vec::new(),
        }
    }

    /// Sources offered for the selected category
    pub fn available_sources(&self) -> &[SourceOption] {
        &self.available_sources
    }

    pub fn selected_count(&self) -> usize {
        self.draft.sources.len()
    }

    pub fn is_source_selected(&self, id: &str) -> bool {
        self.draft.sources.contains(id)
    }

    /// Counter text shown under the source list
    pub fn selection_summary(&self) -> String {
        format!(
            "{} source(s) selected. You can select up to {}.",
            self.selected_count(),
            MAX_SOURCES
        )
    }

    /// Select a country; returns `false` (and changes nothing) for codes
    /// outside the catalog or before it has loaded
    pub fn select_country(&mut self, code: &str) -> bool {
        let known = self
            .catalog
            .as_deref()
            .is_some_and(|catalog| catalog.contains_country(code));

        if !known {
            debug!(country = code, "Ignoring country outside the catalog");
            return false;
        }

        self.draft.country = Some(code.to_string());
        self.draft.category = None;
        self.draft.sources.clear();
        self.available_sources.clear();
        true
    }

    pub fn select_category(&mut self, name: &str) -> WizardResult<()> {
        let catalog = self.catalog.as_deref().ok_or(WizardError::CatalogUnavailable)?;
        let country = self
            .draft
            .country
            .as_deref()
            .ok_or_else(|| WizardError::invalid_state("category selected before country"))?;
        let sources = catalog
            .sources(country, name)
            .ok_or_else(|| WizardError::unknown("category", name))?
            .to_vec();

        self.draft.category = Some(name.to_string());
        self.draft.sources.clear();
        self.available_sources = sources;
        Ok(())
    }

    pub fn toggle_source(&mut self, id: &str) -> WizardResult<SourceToggle> {
        if self.catalog.is_none() {
            return Err(WizardError::CatalogUnavailable);
        }
        if self.draft.category.is_none() {
            return Err(WizardError::invalid_state(
                "source toggled before category",
            ));
        }

        if self.draft.sources.remove(id) {
            return Ok(SourceToggle::Removed);
        }

        if !self.available_sources.iter().any(|source| source.id == id) {
            return Err(WizardError::unknown("source", id));
        }
        if self.draft.sources.len() >= MAX_SOURCES {
            return Err(WizardError::CapacityExceeded { limit: MAX_SOURCES });
        }

        self.draft.sources.insert(id.to_string());
        Ok(SourceToggle::Added)
    }

    pub fn set_summary_style(&mut self, style: SummaryStyle) {
        self.draft.summary_style = Some(style);
    }

    pub fn set_frequency(&mut self, hours: u32) -> WizardResult<()> {
        self.draft.frequency = Some(UpdateFrequency::try_from(hours)?);
        Ok(())
    }
}
