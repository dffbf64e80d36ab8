//! Option catalog
//!
//! Three-level index country → category → sources, built once from the flat
//! news-sources listing and never mutated afterwards.
//!
//! Load lifecycle:
//! - NotLoaded → Loading: `begin_load`
//! - Loading → Ready: matching response with data
//! - Loading → Failed: matching response with an error
//! - Failed → Loading: explicit retry via `begin_load`
//!
//! A Ready catalog is final. Responses carrying an outdated sequence number are dropped.

use async_trait::async_trait;
use inboxzing_common::{CollaboratorError, CollaboratorResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{WizardError, WizardResult};

/// One row of the news-sources listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub country: String,
    pub category: String,
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceOption {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionCatalog {
    tree: BTreeMap<String, BTreeMap<String, Vec<SourceOption>>>,
}

impl OptionCatalog {
    /// Build the index; duplicate ids within one category keep the first name seen
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut tree: BTreeMap<String, BTreeMap<String, Vec<SourceOption>>> = BTreeMap::new();

        for entry in entries {
            let sources = tree
                .entry(entry.country)
                .or_default()
                .entry(entry.category)
                .or_default();

            if sources.iter().any(|s| s.id == entry.id) {
                continue;
            }
            sources.push(SourceOption {
                id: entry.id,
                name: entry.name,
            });
        }

        Self { tree }
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.tree.keys().map(String::as_str)
    }

    pub fn contains_country(&self, country: &str) -> bool {
        self.tree.contains_key(country)
    }

    pub fn categories(&self, country: &str) -> Vec<&str> {
        self.tree
            .get(country)
            .map(|categories| categories.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Sources in listing order, or `None` if the pair is not in the catalog
    pub fn sources(&self, country: &str, category: &str) -> Option<&[SourceOption]> {
        self.tree
            .get(country)
            .and_then(|categories| categories.get(category))
            .map(Vec::as_slice)
    }
}

/// Where the flat listing comes from
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_catalog(&self) -> CollaboratorResult<Vec<CatalogEntry>>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogState {
    NotLoaded,
    Loading { seq: u64 },
    Ready(Arc<OptionCatalog>),
    Failed { seq: u64, error: CollaboratorError },
}

/// Tracks one catalog request at a time
#[derive(Debug)]
pub struct CatalogLoader {
    state: CatalogState,
    next_seq: u64,
}

impl Default for CatalogLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogLoader {
    pub fn new() -> Self {
        Self {
            state: CatalogState::NotLoaded,
            next_seq: 1,
        }
    }

    pub fn state(&self) -> &CatalogState {
        &self.state
    }

    pub fn catalog(&self) -> Option<Arc<OptionCatalog>> {
        match &self.state {
            CatalogState::Ready(catalog) => Some(Arc::clone(catalog)),
            _ => None,
        }
    }

    /// Issue a new request sequence number
    ///
    /// Calling this while a request is outstanding supersedes it.
    pub fn begin_load(&mut self) -> WizardResult<u64> {
        if matches!(self.state, CatalogState::Ready(_)) {
            return Err(WizardError::invalid_state(
                "option catalog is already loaded",
            ));
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.state = CatalogState::Loading { seq };
        debug!(seq, "Catalog load started");
        Ok(seq)
    }

    /// Apply a response; returns the installed catalog, or `None` if the response was stale
    pub fn finish_load(
        &mut self,
        seq: u64,
        response: CollaboratorResult<Vec<CatalogEntry>>,
    ) -> WizardResult<Option<Arc<OptionCatalog>>> {
        match self.state {
            CatalogState::Loading { seq: expected } if expected == seq => {}
            _ => {
                debug!(seq, "Ignoring stale catalog response");
                return Ok(None);
            }
        }

        match response {
            Ok(entries) => {
                let catalog = Arc::new(OptionCatalog::from_entries(entries));
                info!(
                    seq,
                    countries = catalog.tree.len(),
                    "Option catalog loaded"
                );
                self.state = CatalogState::Ready(Arc::clone(&catalog));
                Ok(Some(catalog))
            }
            Err(error) => {
                warn!(seq, error = %error, "Option catalog load failed");
                self.state = CatalogState::Failed {
                    seq,
                    error: error.clone(),
                };
                Err(WizardError::Collaborator(error))
            }
        }
    }
}
