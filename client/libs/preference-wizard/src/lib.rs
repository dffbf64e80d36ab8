//! Preference wizard
//!
//! Four-step onboarding flow that collects a user's news preferences:
//! country, category, up to 20 sources, then summary style and update
//! frequency. The option tree comes from a [`CatalogSource`] and the final
//! payload goes to a [`PreferenceStore`].
//!
//! # Example
//!
//! ```ignore
//! use preference_wizard::{AdvanceOutcome, SummaryStyle, WizardController};
//!
//! let mut wizard = WizardController::new("reader");
//! wizard.load_catalog_with(&api).await?;
//! wizard.select_country("us")?;
//! wizard.advance()?;
//! wizard.select_category("technology")?;
//! wizard.advance()?;
//! wizard.toggle_source("wired")?;
//! wizard.advance()?;
//! wizard.set_summary_style(SummaryStyle::Brief)?;
//! wizard.set_frequency(24)?;
//! if let AdvanceOutcome::Submitted(draft) = wizard.advance_with(&api).await? {
//!     user.apply_submitted(draft)?;
//! }
//! ```

pub mod catalog;
pub mod context;
pub mod draft;
pub mod error;
pub mod selection;
pub mod wizard;

pub use catalog::{CatalogEntry, CatalogLoader, CatalogSource, CatalogState, OptionCatalog, SourceOption};
pub use context::{SavedPreferences, UserContext};
pub use draft::{
    PreferenceDraft, PreferencePayload, SummaryStyle, UpdateFrequency, FREQUENCY_OPTIONS,
    MAX_SOURCES,
};
pub use error::{WizardError, WizardResult};
pub use selection::{SelectionModel, SourceToggle};
pub use wizard::{
    AdvanceOutcome, PreferenceStore, SubmitResolution, SubmitTicket, WizardController,
    WizardState, WizardStep,
};
