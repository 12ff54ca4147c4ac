use serde::Serialize;
use tracing::{debug, info, warn};

use super::client::{fetch_live_payload, FetchError, LivePayload};
use super::records::group_records;
use super::{placeholder_categories, Category, Snapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewStatus {
    Placeholder,
    Live,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    EmptyBody,
    NotAList,
}

/// What the single live-load attempt did. Failures never reach the rendered
/// directory; this is where they stay observable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    NotAttempted,
    Loaded { categories: usize, companies: usize },
    Skipped { reason: SkipReason },
    Failed { error: String },
}

/// The live snapshot and its unfiltered backup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryState {
    live: Snapshot,
    backup: Snapshot,
}

impl DirectoryState {
    pub fn new(live: Snapshot) -> Self {
        let backup = live.clone();
        Self { live, backup }
    }

    pub fn live(&self) -> &[Category] {
        &self.live
    }

    pub fn backup(&self) -> &[Category] {
        &self.backup
    }

    fn replace(&mut self, live: Snapshot) {
        self.backup = live.clone();
        self.live = live;
    }
}

pub fn normalize_term(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Same categories and descriptions, companies restricted to those whose
/// lowercased name contains `term`. `term` must already be normalized.
pub fn filter_snapshot(snapshot: &[Category], term: &str) -> Snapshot {
    snapshot
        .iter()
        .map(|cat| Category {
            name: cat.name.clone(),
            description: cat.description.clone(),
            companies: cat
                .companies
                .iter()
                .filter(|name| name.to_lowercase().contains(term))
                .cloned()
                .collect(),
        })
        .collect()
}

/// Projection of a snapshot onto rendered sections: empty categories drop out.
pub fn render_sections(snapshot: &[Category]) -> Vec<Category> {
    snapshot
        .iter()
        .filter(|cat| !cat.companies.is_empty())
        .cloned()
        .collect()
}

#[derive(Clone, Debug)]
pub struct DirectoryView {
    placeholder: Snapshot,
    state: DirectoryState,
    status: ViewStatus,
    last_load: LoadOutcome,
    rendered: Vec<Category>,
}

impl Default for DirectoryView {
    fn default() -> Self {
        Self::new(placeholder_categories())
    }
}

impl DirectoryView {
    /// Starts in the placeholder state and renders the seed data.
    pub fn new(placeholder: Snapshot) -> Self {
        let state = DirectoryState::new(placeholder.clone());
        let mut view = Self {
            placeholder,
            state,
            status: ViewStatus::Placeholder,
            last_load: LoadOutcome::NotAttempted,
            rendered: Vec::new(),
        };
        let backup = view.state.backup.clone();
        view.render(&backup);
        view
    }

    pub fn status(&self) -> ViewStatus {
        self.status
    }

    pub fn last_load(&self) -> &LoadOutcome {
        &self.last_load
    }

    pub fn state(&self) -> &DirectoryState {
        &self.state
    }

    pub fn placeholder(&self) -> &[Category] {
        &self.placeholder
    }

    /// Sections currently on display.
    pub fn rendered(&self) -> &[Category] {
        &self.rendered
    }

    pub fn render(&mut self, snapshot: &[Category]) {
        self.rendered = render_sections(snapshot);
    }

    pub fn filter(&mut self, raw_term: &str) {
        let term = normalize_term(raw_term);
        if term.is_empty() {
            let backup = self.state.backup.clone();
            self.render(&backup);
            return;
        }
        let filtered = filter_snapshot(&self.state.backup, &term);
        self.render(&filtered);
    }

    /// Applies the result of the one live fetch. Only the first call has any
    /// effect; the view never leaves the live state once it gets there.
    pub fn apply_live(&mut self, fetched: Result<LivePayload, FetchError>) -> &LoadOutcome {
        if self.last_load != LoadOutcome::NotAttempted {
            debug!("live data already applied, ignoring");
            return &self.last_load;
        }
        self.last_load = match fetched {
            Err(e) => {
                warn!(error = %e, "failed to fetch live data");
                LoadOutcome::Failed {
                    error: e.to_string(),
                }
            }
            Ok(LivePayload::Empty) => {
                debug!("live data empty, keeping placeholder");
                LoadOutcome::Skipped {
                    reason: SkipReason::EmptyBody,
                }
            }
            Ok(LivePayload::NotAList) => {
                debug!("live data is not a list, keeping placeholder");
                LoadOutcome::Skipped {
                    reason: SkipReason::NotAList,
                }
            }
            Ok(LivePayload::Records(records)) => match group_records(&records, &self.placeholder) {
                Err(e) => {
                    warn!(error = %e, "live data unusable, keeping placeholder");
                    LoadOutcome::Failed {
                        error: e.to_string(),
                    }
                }
                Ok(live) => self.replace_live(live),
            },
        };
        &self.last_load
    }

    fn replace_live(&mut self, live: Snapshot) -> LoadOutcome {
        let companies: usize = live.iter().map(|c| c.companies.len()).sum();
        let categories = live.len();
        self.state.replace(live);
        self.status = ViewStatus::Live;
        let backup = self.state.backup.clone();
        self.render(&backup);
        info!(categories, companies, "live directory loaded");
        LoadOutcome::Loaded {
            categories,
            companies,
        }
    }

    pub async fn load_live(&mut self, client: &reqwest::Client, proxy_url: &str) -> &LoadOutcome {
        let fetched = fetch_live_payload(client, proxy_url).await;
        self.apply_live(fetched)
    }
}
