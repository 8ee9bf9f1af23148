//! View state container
//!
//! [`ViewStore`] is the single writer of [`ViewState`]. Every request is
//! tagged with a monotonically increasing sequence number when it starts;
//! a completion is applied only if its number is still the latest one
//! issued, so a slow earlier response can never overwrite a later query.

use crate::AirViewError;
use crate::error::ErrorKind;
use crate::fetcher::FetchOutcome;
use crate::models::{AirQualitySnapshot, LocationQuery, NearbyArea};
use crate::severity::{AlertGate, SevereAlert};
use tracing::debug;

/// Prompt shown when refresh has nothing to work with
pub const REFRESH_PROMPT: &str =
    "Enter a city name or use your current location to check air quality.";

/// Shown when a control is used while a request is in flight
pub const BUSY_NOTICE: &str = "A search is already running. Please wait for it to finish.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Error,
}

/// An error as shown to the user
#[derive(Debug, Clone, PartialEq)]
pub struct ViewError {
    pub kind: ErrorKind,
    /// User-facing message
    pub message: String,
    /// Technical detail for logs and verbose output
    pub detail: String,
}

impl From<&AirViewError> for ViewError {
    fn from(error: &AirViewError) -> Self {
        Self {
            kind: error.kind(),
            message: error.user_message(),
            detail: error.to_string(),
        }
    }
}

/// What a manual retry re-runs
#[derive(Debug, Clone, PartialEq)]
pub enum RetryAction {
    Query(LocationQuery),
    Locate,
    /// Validate the current input again
    Input,
}

/// Identifies one started request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTicket {
    pub seq: u64,
    pub query: LocationQuery,
}

/// What a refresh request turned into
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshDecision {
    /// Re-run the last successful query
    Fetch(LocationQuery),
    /// No prior query, search the current input instead
    SearchInput(String),
    /// Nothing to refresh; an informational notice was set
    Prompt,
    /// A request is in flight, controls are disabled
    Busy,
}

/// Result of applying a completion
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Applied { alert: Option<SevereAlert> },
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub phase: Phase,
    /// Current contents of the city input
    pub input: String,
    pub snapshot: Option<AirQualitySnapshot>,
    pub nearby: Vec<NearbyArea>,
    pub error: Option<ViewError>,
    /// Informational message, not an error
    pub notice: Option<String>,
    /// Alert raised by the displayed snapshot
    pub alert: Option<SevereAlert>,
    /// Query of the request in flight
    pub pending_query: Option<LocationQuery>,
    /// Last query that produced a snapshot
    pub last_query: Option<LocationQuery>,
    pub retry: Option<RetryAction>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            input: String::new(),
            snapshot: None,
            nearby: Vec::new(),
            error: None,
            notice: None,
            alert: None,
            pending_query: None,
            last_query: None,
            retry: None,
        }
    }
}

impl ViewState {
    /// Search and refresh are disabled while any request is in flight
    #[must_use]
    pub fn controls_enabled(&self) -> bool {
        self.phase != Phase::Loading
    }

    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.controls_enabled() && self.last_query.is_some()
    }
}

pub struct ViewStore {
    state: ViewState,
    alerts: AlertGate,
    latest_seq: u64,
}

impl ViewStore {
    #[must_use]
    pub fn new(alerts: AlertGate) -> Self {
        Self {
            state: ViewState::default(),
            alerts,
            latest_seq: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    #[must_use]
    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    #[must_use]
    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest_seq
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.state.input = input.into();
    }

    fn next_seq(&mut self) -> u64 {
        self.latest_seq += 1;
        self.latest_seq
    }

    fn enter_loading(&mut self, query: Option<LocationQuery>) {
        let state = &mut self.state;
        state.phase = Phase::Loading;
        state.snapshot = None;
        state.nearby.clear();
        state.error = None;
        state.notice = None;
        state.alert = None;
        state.pending_query = query;
    }

    /// Start a request for `query`, superseding anything in flight
    pub fn begin(&mut self, query: LocationQuery) -> RequestTicket {
        let seq = self.next_seq();
        debug!(seq, query = %query, "Starting air quality request");
        self.enter_loading(Some(query.clone()));
        RequestTicket { seq, query }
    }

    /// Start waiting for a position; returns the sequence number to finish with
    pub fn begin_locating(&mut self) -> u64 {
        let seq = self.next_seq();
        debug!(seq, "Waiting for current position");
        self.enter_loading(None);
        seq
    }

    /// Apply the result of the request identified by `ticket`
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        result: Result<FetchOutcome, AirViewError>,
    ) -> Completion {
        if !self.is_current(ticket.seq) {
            debug!(
                seq = ticket.seq,
                latest = self.latest_seq,
                "Discarding stale response"
            );
            return Completion::Stale;
        }

        self.state.pending_query = None;
        match result {
            Ok(outcome) => {
                let alert =
                    self.alerts
                        .evaluate(ticket.seq, &outcome.snapshot.city, outcome.snapshot.aqi);
                let state = &mut self.state;
                state.phase = Phase::Success;
                state.snapshot = Some(outcome.snapshot);
                state.nearby = outcome.nearby;
                state.error = None;
                state.notice = None;
                state.alert = alert.clone();
                state.last_query = Some(ticket.query);
                state.retry = None;
                Completion::Applied { alert }
            }
            Err(error) => {
                self.fail(&error, Some(RetryAction::Query(ticket.query)));
                Completion::Applied { alert: None }
            }
        }
    }

    /// Record a failure; the displayed snapshot is cleared
    pub fn fail(&mut self, error: &AirViewError, retry: Option<RetryAction>) {
        let state = &mut self.state;
        state.phase = Phase::Error;
        state.snapshot = None;
        state.nearby.clear();
        state.alert = None;
        state.notice = None;
        state.pending_query = None;
        state.error = Some(ViewError::from(error));
        state.retry = retry;
    }

    /// Record a failure that happened before any request, e.g. invalid input.
    ///
    /// Anything still in flight is superseded.
    pub fn reject(&mut self, error: &AirViewError, retry: Option<RetryAction>) {
        self.next_seq();
        self.fail(error, retry);
    }

    /// Finish a position lookup started with [`ViewStore::begin_locating`].
    ///
    /// Returns the query to fetch when the lookup is current and succeeded.
    pub fn finish_locating(
        &mut self,
        seq: u64,
        result: Result<LocationQuery, AirViewError>,
    ) -> Option<LocationQuery> {
        if !self.is_current(seq) {
            debug!(seq, latest = self.latest_seq, "Discarding stale position");
            return None;
        }
        match result {
            Ok(query) => Some(query),
            Err(error) => {
                self.fail(&error, Some(RetryAction::Locate));
                None
            }
        }
    }

    /// Decide what a refresh should do
    pub fn request_refresh(&mut self) -> RefreshDecision {
        if !self.state.controls_enabled() {
            return RefreshDecision::Busy;
        }
        if let Some(query) = &self.state.last_query {
            return RefreshDecision::Fetch(query.clone());
        }
        let input = self.state.input.trim();
        if !input.is_empty() {
            return RefreshDecision::SearchInput(input.to_string());
        }
        self.state.notice = Some(REFRESH_PROMPT.to_string());
        RefreshDecision::Prompt
    }

    /// Show an informational message without changing the phase
    pub fn notify(&mut self, notice: impl Into<String>) {
        self.state.notice = Some(notice.into());
    }

    /// Clear the error and notice
    pub fn dismiss(&mut self) {
        let state = &mut self.state;
        state.error = None;
        state.notice = None;
        if state.phase == Phase::Error {
            state.phase = Phase::Idle;
        }
    }
}

impl Default for ViewStore {
    fn default() -> Self {
        Self::new(AlertGate::default())
    }
}
