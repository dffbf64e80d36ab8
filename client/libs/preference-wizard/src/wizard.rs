//! Wizard controller
//!
//! Linear flow Country → Category → Sources → StyleAndFrequency → Submitted.
//!
//! State transitions:
//! - advance on steps 1-3: next step when the current step validates
//! - advance on step 4: issues a [`SubmitTicket`]; the step stays put until the
//!   persist response is applied with [`WizardController::complete_submit`]
//! - successful response: → Submitted, draft handed to the caller
//! - failed response: stay on step 4, draft kept for a manual retry
//! - retreat: previous step, entered data untouched
//!
//! Validation failures are reported both as the returned error and as the
//! inline `validation_error`; the next edit clears it.

use async_trait::async_trait;
use inboxzing_common::CollaboratorResult;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::{CatalogEntry, CatalogLoader, CatalogSource, CatalogState};
use crate::draft::{PreferenceDraft, PreferencePayload, SummaryStyle, MAX_SOURCES};
use crate::error::{WizardError, WizardResult};
use crate::selection::{SelectionModel, SourceToggle};

const CATALOG_FAILED_MESSAGE: &str = "Failed to fetch news sources. Please try again later.";
const PERSIST_FAILED_MESSAGE: &str = "Failed to update preferences. Please try again.";

/// Backend that stores the finished preferences
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn save_preferences(
        &self,
        username: &str,
        payload: &PreferencePayload,
    ) -> CollaboratorResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WizardStep {
    Country,
    Category,
    Sources,
    StyleAndFrequency,
    Submitted,
}

impl WizardStep {
    /// 1-based position, `None` once submitted
    pub fn number(&self) -> Option<u8> {
        match self {
            WizardStep::Country => Some(1),
            WizardStep::Category => Some(2),
            WizardStep::Sources => Some(3),
            WizardStep::StyleAndFrequency => Some(4),
            WizardStep::Submitted => None,
        }
    }

    fn next(self) -> Self {
        match self {
            WizardStep::Country => WizardStep::Category,
            WizardStep::Category => WizardStep::Sources,
            WizardStep::Sources => WizardStep::StyleAndFrequency,
            WizardStep::StyleAndFrequency | WizardStep::Submitted => WizardStep::Submitted,
        }
    }

    fn previous(self) -> Option<Self> {
        match self {
            WizardStep::Category => Some(WizardStep::Country),
            WizardStep::Sources => Some(WizardStep::Category),
            WizardStep::StyleAndFrequency => Some(WizardStep::Sources),
            WizardStep::Country | WizardStep::Submitted => None,
        }
    }
}

/// Read-only snapshot for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardState {
    pub step: WizardStep,
    pub draft: PreferenceDraft,
    pub validation_error: Option<String>,
    pub submitting: bool,
}

/// Outstanding preference persist request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTicket {
    pub draft_id: Uuid,
    pub seq: u64,
    pub username: String,
    pub payload: PreferencePayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Moved to the given step
    Moved(WizardStep),
    /// Step 4 validated; the caller must persist the ticket's payload
    SubmitRequested(SubmitTicket),
    /// Persisted; the draft now belongs to the caller
    Submitted(PreferenceDraft),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResolution {
    Submitted(PreferenceDraft),
    /// Response for a superseded or foreign ticket, ignored
    Stale,
}

pub struct WizardController {
    draft_id: Uuid,
    username: String,
    step: WizardStep,
    selection: SelectionModel,
    catalog: CatalogLoader,
    validation_error: Option<String>,
    next_submit_seq: u64,
    pending_submit: Option<u64>,
}

impl WizardController {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            draft_id: Uuid::new_v4(),
            username: username.into(),
            step: WizardStep::Country,
            selection: SelectionModel::new(),
            catalog: CatalogLoader::new(),
            validation_error: None,
            next_submit_seq: 1,
            pending_submit: None,
        }
    }

    /// Identity used to reject responses meant for another draft
    pub fn draft_id(&self) -> Uuid {
        self.draft_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.pending_submit.is_some()
    }

    pub fn catalog_state(&self) -> &CatalogState {
        self.catalog.state()
    }

    pub fn state(&self) -> WizardState {
        WizardState {
            step: self.step,
            draft: self.selection.draft().clone(),
            validation_error: self.validation_error.clone(),
            submitting: self.is_submitting(),
        }
    }

    // ---------------------------------------------------------------
    // Catalog
    // ---------------------------------------------------------------

    pub fn begin_catalog_load(&mut self) -> WizardResult<u64> {
        self.catalog.begin_load()
    }

    /// Apply a catalog response; `Ok(false)` means it was stale and ignored
    pub fn apply_catalog(
        &mut self,
        seq: u64,
        response: CollaboratorResult<Vec<CatalogEntry>>,
    ) -> WizardResult<bool> {
        match self.catalog.finish_load(seq, response) {
            Ok(Some(catalog)) => {
                self.selection.attach_catalog(catalog);
                self.validation_error = None;
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(err) => {
                self.validation_error = Some(CATALOG_FAILED_MESSAGE.to_string());
                Err(err)
            }
        }
    }

    pub async fn load_catalog_with(&mut self, source: &dyn CatalogSource) -> WizardResult<bool> {
        let seq = self.begin_catalog_load()?;
        let response = source.fetch_catalog().await;
        self.apply_catalog(seq, response)
    }

    // ---------------------------------------------------------------
    // Edits
    // ---------------------------------------------------------------

    pub fn select_country(&mut self, code: &str) -> WizardResult<bool> {
        self.begin_edit()?;
        Ok(self.selection.select_country(code))
    }

    pub fn select_category(&mut self, name: &str) -> WizardResult<()> {
        self.begin_edit()?;
        let result = self.selection.select_category(name);
        self.surface(result)
    }

    pub fn toggle_source(&mut self, id: &str) -> WizardResult<SourceToggle> {
        self.begin_edit()?;
        let result = self.selection.toggle_source(id);
        self.surface(result)
    }

    pub fn set_summary_style(&mut self, style: SummaryStyle) -> WizardResult<()> {
        self.begin_edit()?;
        self.selection.set_summary_style(style);
        Ok(())
    }

    pub fn set_frequency(&mut self, hours: u32) -> WizardResult<()> {
        self.begin_edit()?;
        let result = self.selection.set_frequency(hours);
        self.surface(result)
    }

    fn begin_edit(&mut self) -> WizardResult<()> {
        self.ensure_open()?;
        self.validation_error = None;
        Ok(())
    }

    fn ensure_open(&self) -> WizardResult<()> {
        if self.step == WizardStep::Submitted {
            return Err(WizardError::invalid_state("wizard already submitted"));
        }
        if self.pending_submit.is_some() {
            return Err(WizardError::invalid_state("preference submit in flight"));
        }
        Ok(())
    }

    /// Put recoverable failures in front of the user
    fn surface<T>(&mut self, result: WizardResult<T>) -> WizardResult<T> {
        if let Err(err) = &result {
            if err.is_recoverable() {
                self.validation_error = Some(err.user_message());
            }
        }
        result
    }

    // ---------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------

    fn validate_step(&self) -> Result<(), String> {
        let draft = self.selection.draft();
        match self.step {
            WizardStep::Country if draft.country.is_none() => {
                Err("Please select a country".to_string())
            }
            WizardStep::Category if draft.category.is_none() => {
                Err("Please select a category".to_string())
            }
            WizardStep::Sources if draft.sources.is_empty() => {
                Err("Please select at least one source".to_string())
            }
            WizardStep::Sources if draft.sources.len() > MAX_SOURCES => Err(format!(
                "You can only select up to {} sources. You have selected {} source(s).",
                MAX_SOURCES,
                draft.sources.len()
            )),
            // Earlier steps can be undone from here, e.g. a country change clears category and sources
            WizardStep::StyleAndFrequency if !draft.is_complete() => {
                Err("Please complete all preferences".to_string())
            }
            _ => Ok(()),
        }
    }

    pub fn advance(&mut self) -> WizardResult<AdvanceOutcome> {
        self.ensure_open()?;

        if let Err(message) = self.validate_step() {
            debug!(step = ?self.step, %message, "Step validation failed");
            self.validation_error = Some(message.clone());
            return Err(WizardError::Validation(message));
        }
        self.validation_error = None;

        if self.step != WizardStep::StyleAndFrequency {
            self.step = self.step.next();
            info!(step = ?self.step, "Wizard advanced");
            return Ok(AdvanceOutcome::Moved(self.step));
        }

        let payload = match self.selection.draft().to_payload() {
            Ok(payload) => payload,
            Err(err) => {
                self.validation_error = Some(err.user_message());
                return Err(err);
            }
        };
        let seq = self.next_submit_seq;
        self.next_submit_seq += 1;
        self.pending_submit = Some(seq);

        info!(username = %self.username, seq, "Submitting preferences");

        Ok(AdvanceOutcome::SubmitRequested(SubmitTicket {
            draft_id: self.draft_id,
            seq,
            username: self.username.clone(),
            payload,
        }))
    }

    /// Apply the persist response for `ticket`
    pub fn complete_submit(
        &mut self,
        ticket: &SubmitTicket,
        result: CollaboratorResult<()>,
    ) -> WizardResult<SubmitResolution> {
        if ticket.draft_id != self.draft_id || self.pending_submit != Some(ticket.seq) {
            debug!(seq = ticket.seq, "Ignoring stale preference response");
            return Ok(SubmitResolution::Stale);
        }
        self.pending_submit = None;

        match result {
            Ok(()) => {
                self.step = WizardStep::Submitted;
                self.validation_error = None;
                info!(username = %self.username, "Preferences saved");
                Ok(SubmitResolution::Submitted(self.selection.take_draft()))
            }
            Err(err) => {
                warn!(username = %self.username, error = %err, "Preference update failed");
                self.validation_error = Some(PERSIST_FAILED_MESSAGE.to_string());
                Err(WizardError::Collaborator(err))
            }
        }
    }

    /// `advance` that also performs the persist call on the last step
    pub async fn advance_with(
        &mut self,
        store: &dyn PreferenceStore,
    ) -> WizardResult<AdvanceOutcome> {
        let ticket = match self.advance()? {
            AdvanceOutcome::SubmitRequested(ticket) => ticket,
            other => return Ok(other),
        };

        let result = store
            .save_preferences(&ticket.username, &ticket.payload)
            .await;

        match self.complete_submit(&ticket, result)? {
            SubmitResolution::Submitted(draft) => Ok(AdvanceOutcome::Submitted(draft)),
            SubmitResolution::Stale => Err(WizardError::invalid_state(
                "submit ticket superseded while in flight",
            )),
        }
    }

    pub fn retreat(&mut self) -> WizardResult<WizardStep> {
        self.ensure_open()?;
        if let Some(previous) = self.step.previous() {
            self.step = previous;
            debug!(step = ?self.step, "Wizard stepped back");
        }
        Ok(self.step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_entries;
    use inboxzing_common::CollaboratorError;

    fn loaded_wizard() -> WizardController {
        let mut wizard = WizardController::new("reader");
        let seq = wizard.begin_catalog_load().unwrap();
        assert!(wizard.apply_catalog(seq, Ok(sample_entries())).unwrap());
        wizard
    }

    fn wizard_at_sources(selected: usize) -> WizardController {
        let mut wizard = loaded_wizard();
        wizard.select_country("us").unwrap();
        wizard.advance().unwrap();
        wizard.select_category("general").unwrap();
        wizard.advance().unwrap();
        for i in 0..selected {
            wizard.toggle_source(&format!("us-general-{}", i)).unwrap();
        }
        wizard
    }

    fn wizard_ready_to_submit() -> WizardController {
        let mut wizard = wizard_at_sources(3);
        wizard.advance().unwrap();
        wizard.set_summary_style(SummaryStyle::Detailed).unwrap();
        wizard.set_frequency(24).unwrap();
        wizard
    }

    #[test]
    fn test_step_one_requires_country() {
        let mut wizard = loaded_wizard();
        let result = wizard.advance();

        assert!(matches!(result, Err(WizardError::Validation(_))));
        assert_eq!(wizard.step(), WizardStep::Country);
        assert_eq!(wizard.validation_error(), Some("Please select a country"));
    }

    #[test]
    fn test_submit_requires_upstream_steps_after_late_edit() {
        let mut wizard = wizard_ready_to_submit();
        // Switching country on the last step clears category and sources
        assert!(wizard.select_country("gb").unwrap());

        let result = wizard.advance();

        assert!(matches!(result, Err(WizardError::Validation(_))));
        assert_eq!(wizard.step(), WizardStep::StyleAndFrequency);
        assert_eq!(
            wizard.validation_error(),
            Some("Please complete all preferences")
        );
        assert!(!wizard.is_submitting());
    }

    #[test]
    fn test_edit_clears_validation_error() {
        let mut wizard = loaded_wizard();
        let _ = wizard.advance();
        assert!(wizard.validation_error().is_some());

        wizard.select_country("us").unwrap();
        assert_eq!(wizard.validation_error(), None);
    }

    #[test]
    fn test_sources_step_rejects_empty_selection() {
        let mut wizard = wizard_at_sources(0);
        assert!(wizard.advance().is_err());
        assert_eq!(wizard.step(), WizardStep::Sources);
        assert_eq!(
            wizard.validation_error(),
            Some("Please select at least one source")
        );
    }

    #[test]
    fn test_sources_step_accepts_one_to_twenty() {
        for count in [1, 2, 10, 19, 20] {
            let mut wizard = wizard_at_sources(count);
            assert_eq!(
                wizard.advance().unwrap(),
                AdvanceOutcome::Moved(WizardStep::StyleAndFrequency),
                "advance with {} sources",
                count
            );
        }
    }

    #[test]
    fn test_capacity_exceeded_surfaces_message() {
        let mut wizard = wizard_at_sources(20);
        let result = wizard.toggle_source("us-general-25");

        assert_eq!(result, Err(WizardError::CapacityExceeded { limit: 20 }));
        assert_eq!(
            wizard.validation_error(),
            Some("You can only select up to 20 sources.")
        );
        assert_eq!(wizard.selection().selected_count(), 20);
    }

    #[test]
    fn test_retreat_keeps_entered_data() {
        let mut wizard = wizard_ready_to_submit();

        assert_eq!(wizard.retreat().unwrap(), WizardStep::Sources);
        assert_eq!(wizard.retreat().unwrap(), WizardStep::Category);
        assert_eq!(wizard.retreat().unwrap(), WizardStep::Country);
        assert_eq!(wizard.retreat().unwrap(), WizardStep::Country);

        let draft = wizard.selection().draft();
        assert_eq!(draft.category.as_deref(), Some("general"));
        assert_eq!(draft.sources.len(), 3);
        assert_eq!(draft.summary_style, Some(SummaryStyle::Detailed));
    }

    #[test]
    fn test_submit_success_hands_over_draft() {
        let mut wizard = wizard_ready_to_submit();

        let ticket = match wizard.advance().unwrap() {
            AdvanceOutcome::SubmitRequested(ticket) => ticket,
            other => panic!("expected submit request, got {:?}", other),
        };
        assert!(wizard.is_submitting());
        assert_eq!(ticket.payload.sources, "us-general-0,us-general-1,us-general-2");
        assert!(wizard.select_country("gb").is_err());

        let resolution = wizard.complete_submit(&ticket, Ok(())).unwrap();

        match resolution {
            SubmitResolution::Submitted(draft) => {
                assert_eq!(draft.country.as_deref(), Some("us"));
                assert_eq!(draft.sources.len(), 3);
            }
            SubmitResolution::Stale => panic!("fresh ticket treated as stale"),
        }
        assert_eq!(wizard.step(), WizardStep::Submitted);
        assert!(matches!(wizard.advance(), Err(WizardError::InvalidState(_))));
        assert!(matches!(wizard.retreat(), Err(WizardError::InvalidState(_))));
    }

    #[test]
    fn test_submit_failure_keeps_draft_on_step_four() {
        let mut wizard = wizard_ready_to_submit();
        let AdvanceOutcome::SubmitRequested(ticket) = wizard.advance().unwrap() else {
            panic!("expected submit request");
        };

        let result = wizard.complete_submit(
            &ticket,
            Err(CollaboratorError::rejected(404, "User not found")),
        );

        assert!(matches!(result, Err(WizardError::Collaborator(_))));
        assert_eq!(wizard.step(), WizardStep::StyleAndFrequency);
        assert!(!wizard.is_submitting());
        assert_eq!(wizard.validation_error(), Some(PERSIST_FAILED_MESSAGE));
        assert!(wizard.selection().draft().is_complete());

        // Manual retry issues a fresh ticket
        let AdvanceOutcome::SubmitRequested(retry) = wizard.advance().unwrap() else {
            panic!("expected submit request");
        };
        assert!(retry.seq > ticket.seq);
    }

    #[test]
    fn test_stale_submit_response_ignored() {
        let mut wizard = wizard_ready_to_submit();
        let AdvanceOutcome::SubmitRequested(first) = wizard.advance().unwrap() else {
            panic!("expected submit request");
        };
        let _ = wizard.complete_submit(&first, Err(CollaboratorError::Timeout("10s".into())));
        let AdvanceOutcome::SubmitRequested(second) = wizard.advance().unwrap() else {
            panic!("expected submit request");
        };

        // Late success for the first attempt
        assert_eq!(
            wizard.complete_submit(&first, Ok(())).unwrap(),
            SubmitResolution::Stale
        );
        assert!(wizard.is_submitting());

        // Ticket from another wizard instance
        let foreign = SubmitTicket {
            draft_id: Uuid::new_v4(),
            ..second.clone()
        };
        assert_eq!(
            wizard.complete_submit(&foreign, Ok(())).unwrap(),
            SubmitResolution::Stale
        );

        assert!(matches!(
            wizard.complete_submit(&second, Ok(())).unwrap(),
            SubmitResolution::Submitted(_)
        ));
    }

    #[test]
    fn test_catalog_failure_sets_message() {
        let mut wizard = WizardController::new("reader");
        let seq = wizard.begin_catalog_load().unwrap();
        let result =
            wizard.apply_catalog(seq, Err(CollaboratorError::Network("offline".into())));

        assert!(result.is_err());
        assert_eq!(wizard.validation_error(), Some(CATALOG_FAILED_MESSAGE));
        assert!(!wizard.select_country("us").unwrap());
    }

    #[test]
    fn test_category_before_catalog_fails_gracefully() {
        let mut wizard = WizardController::new("reader");
        let _seq = wizard.begin_catalog_load().unwrap();

        assert!(!wizard.select_country("us").unwrap());
        assert_eq!(
            wizard.select_category("general"),
            Err(WizardError::CatalogUnavailable)
        );
        assert!(wizard.validation_error().is_some());
    }
}
