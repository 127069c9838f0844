/// Query panel: the interactive state around a single recommendation request.
///
/// The panel owns the query text, the runtime base URL, the loading flag, the last
/// error and the current result set. All state lives behind one mutex that is never
/// held across an await, so the query and URL stay editable while a request is in
/// flight.
///
/// Overlapping submissions are sequenced: each submission takes the next sequence
/// number, and when a request completes its outcome is applied only if no newer
/// submission has started in the meantime. Older outcomes are dropped.
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::client::{normalize_base_url, RecommendationSource};
use crate::error::QueryError;
use crate::model::Recommendation;
use crate::samples::SAMPLE_QUERIES;

/// Coarse request lifecycle derived from the panel state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Loading,
    Success,
    Error,
}

/// Outcome of a [`QueryPanel::submit`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The request finished and its outcome (results or error) is now on the panel.
    Applied,
    /// A newer submission started first; this outcome was discarded.
    Superseded,
    /// The query was empty; no request was made.
    Rejected,
}

/// Point-in-time copy of the panel state, used for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub query: String,
    pub base_url: String,
    pub loading: bool,
    pub error: Option<QueryError>,
    pub results: Vec<Recommendation>,
}

impl PanelView {
    pub fn state(&self) -> RequestState {
        if self.loading {
            return RequestState::Loading;
        }
        match &self.error {
            Some(err) if !err.is_informational() => RequestState::Error,
            Some(_) => RequestState::Success,
            None if self.results.is_empty() => RequestState::Idle,
            None => RequestState::Success,
        }
    }
}

#[derive(Debug)]
struct PanelState {
    query: String,
    base_url: String,
    loading: bool,
    error: Option<QueryError>,
    results: Vec<Recommendation>,
    latest_seq: u64,
}

pub struct QueryPanel<S> {
    source: S,
    state: Mutex<PanelState>,
}

impl<S: RecommendationSource> QueryPanel<S> {
    pub fn new(source: S, base_url: &str) -> Self {
        Self {
            source,
            state: Mutex::new(PanelState {
                query: String::new(),
                base_url: normalize_base_url(base_url),
                loading: false,
                error: None,
                results: Vec::new(),
                latest_seq: 0,
            }),
        }
    }

    pub fn view(&self) -> PanelView {
        let state = self.lock();
        PanelView {
            query: state.query.clone(),
            base_url: state.base_url.clone(),
            loading: state.loading,
            error: state.error.clone(),
            results: state.results.clone(),
        }
    }

    pub fn set_query(&self, query: impl Into<String>) {
        self.lock().query = query.into();
    }

    /// Override the backend base URL for subsequent submissions.
    pub fn set_base_url(&self, base_url: &str) {
        let base_url = normalize_base_url(base_url);
        info!(base_url = %base_url, "backend base URL changed");
        self.lock().base_url = base_url;
    }

    /// Replace the query text with a sample query. Does not submit.
    ///
    /// Returns the selected text, or `None` if `index` is out of range.
    pub fn select_sample(&self, index: usize) -> Option<&'static str> {
        let sample = SAMPLE_QUERIES.get(index).copied()?;
        self.set_query(sample);
        Some(sample)
    }

    /// Submit the current query.
    ///
    /// Empty (after trimming) queries set [`QueryError::Validation`], clear the results
    /// and make no request.
    /// Otherwise the previous error and results are cleared, the loading flag is raised,
    /// and exactly one request is sent with the trimmed query.
    pub async fn submit(&self) -> Submission {
        let (seq, query, base_url) = {
            let mut state = self.lock();
            let query = state.query.trim().to_string();
            if query.is_empty() {
                debug!("rejecting empty query");
                state.error = Some(QueryError::Validation);
                state.results.clear();
                return Submission::Rejected;
            }
            state.error = None;
            state.results.clear();
            state.loading = true;
            state.latest_seq += 1;
            (state.latest_seq, query, state.base_url.clone())
        };

        let _loading = LoadingGuard {
            state: &self.state,
            seq,
        };

        debug!(seq, base_url = %base_url, "submitting query");
        let outcome = self
            .source
            .recommend(&base_url, &query)
            .await
            .map_err(QueryError::from)
            .and_then(|resp| {
                if resp.recommendations.is_empty() {
                    Err(QueryError::EmptyResult)
                } else {
                    Ok(resp.recommendations)
                }
            });

        let mut state = self.lock();
        if state.latest_seq != seq {
            debug!(seq, latest = state.latest_seq, "discarding superseded response");
            return Submission::Superseded;
        }
        match outcome {
            Ok(results) => {
                info!(seq, count = results.len(), "recommendations received");
                state.error = None;
                state.results = results;
            }
            Err(err) => {
                if err.is_informational() {
                    info!(seq, "no recommendations for query");
                } else {
                    warn!(seq, error = %err, "query failed");
                }
                state.results.clear();
                state.error = Some(err);
            }
        }
        Submission::Applied
    }

    fn lock(&self) -> MutexGuard<'_, PanelState> {
        lock_state(&self.state)
    }
}

fn lock_state(state: &Mutex<PanelState>) -> MutexGuard<'_, PanelState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clears the loading flag when the submission that raised it goes away, whether it
/// completed, failed, panicked or was dropped mid-await. A superseded submission
/// leaves the flag to the newer one.
struct LoadingGuard<'a> {
    state: &'a Mutex<PanelState>,
    seq: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut state = lock_state(self.state);
        if state.latest_seq == self.seq {
            state.loading = false;
        }
    }
}
