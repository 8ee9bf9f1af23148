//! View controller event loop
//!
//! Owns the [`ViewStore`] and is the only code that mutates it. User
//! commands, debounce timers, position lookups and fetch completions all
//! arrive as events on one loop; network work runs in spawned tasks that
//! post their results back.

use crate::AirViewError;
use crate::config::AirViewConfig;
use crate::debounce::Debouncer;
use crate::fetcher::{DataFetcher, FetchOutcome};
use crate::location_resolver::{LocationParser, LocationResolver};
use crate::models::LocationQuery;
use crate::severity::{AlertGate, SevereAlert};
use crate::view::{
    BUSY_NOTICE, Completion, RefreshDecision, RequestTicket, RetryAction, ViewState, ViewStore,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// User actions
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// City input changed; searched once typing pauses
    Input(String),
    /// Submit a city search now
    Search(String),
    /// Search typed coordinates now
    SearchCoordinates(f64, f64),
    /// Search the current position
    Locate,
    Refresh,
    Retry,
    Dismiss,
    Quit,
}

#[derive(Debug)]
enum Event {
    InputSettled { revision: u64, text: String },
    Located {
        seq: u64,
        result: Result<LocationQuery, AirViewError>,
    },
    Fetched {
        ticket: RequestTicket,
        result: Result<FetchOutcome, AirViewError>,
    },
}

pub struct ViewController {
    store: ViewStore,
    fetcher: DataFetcher,
    resolver: Arc<LocationResolver>,
    debouncer: Debouncer,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    in_flight: usize,
}

impl ViewController {
    pub fn new(
        fetcher: DataFetcher,
        resolver: LocationResolver,
        alerts: AlertGate,
        debounce: Duration,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            store: ViewStore::new(alerts),
            fetcher,
            resolver: Arc::new(resolver),
            debouncer: Debouncer::new(debounce),
            events_tx,
            events_rx,
            in_flight: 0,
        }
    }

    pub fn from_config(fetcher: DataFetcher, config: &AirViewConfig) -> Self {
        Self::new(
            fetcher,
            LocationResolver::from_config(&config.geolocation),
            AlertGate::new(config.alerts.severe_threshold),
            config.search.debounce(),
        )
    }

    #[must_use]
    pub fn state(&self) -> &ViewState {
        self.store.state()
    }

    /// No timer pending and nothing in flight
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.in_flight == 0 && !self.debouncer.is_pending()
    }

    /// Handle one user command
    pub fn handle_command(&mut self, command: Command) {
        debug!(?command, "Handling command");
        match command {
            Command::Input(text) => self.on_input(text),
            Command::Search(text) => {
                if self.guard_controls("search") {
                    self.debouncer.cancel();
                    self.store.set_input(text.clone());
                    self.search_city(&text);
                }
            }
            Command::SearchCoordinates(lat, lon) => {
                if self.guard_controls("search") {
                    self.debouncer.cancel();
                    self.store.set_input(format!("{lat}, {lon}"));
                    match LocationResolver::resolve_coordinates(lat, lon) {
                        Ok(query) => self.start_fetch(query),
                        Err(e) => self.store.reject(&e, Some(RetryAction::Input)),
                    }
                }
            }
            Command::Locate => {
                if self.guard_controls("locate") {
                    self.debouncer.cancel();
                    self.start_locating();
                }
            }
            Command::Refresh => match self.store.request_refresh() {
                RefreshDecision::Fetch(query) => {
                    self.debouncer.cancel();
                    self.start_fetch(query);
                }
                RefreshDecision::SearchInput(text) => {
                    self.debouncer.cancel();
                    self.search_city(&text);
                }
                RefreshDecision::Prompt => info!("Nothing to refresh yet"),
                RefreshDecision::Busy => {
                    debug!("Refresh ignored while loading");
                    self.store.notify(BUSY_NOTICE);
                }
            },
            Command::Retry => {
                if self.guard_controls("retry") {
                    match self.state().retry.clone() {
                        Some(RetryAction::Query(query)) => self.start_fetch(query),
                        Some(RetryAction::Locate) => self.start_locating(),
                        Some(RetryAction::Input) => {
                            self.debouncer.cancel();
                            self.retry_input();
                        }
                        None => debug!("Nothing to retry"),
                    }
                }
            }
            Command::Dismiss => self.store.dismiss(),
            Command::Quit => {}
        }
    }

    /// Wait for the next internal event and apply it.
    ///
    /// Returns the alert raised by the event, if any. Must only be awaited
    /// while [`ViewController::is_settled`] is false.
    pub async fn next_event(&mut self) -> Option<SevereAlert> {
        let event = self.events_rx.recv().await?;
        self.handle_event(event)
    }

    /// Process events until no timer or request is outstanding
    pub async fn settle(&mut self) -> Vec<SevereAlert> {
        let mut alerts = Vec::new();
        while !self.is_settled() {
            if let Some(alert) = self.next_event().await {
                alerts.push(alert);
            }
        }
        alerts
    }

    /// Drive the controller from a command channel.
    ///
    /// `render` is called after every state change with the alert raised by
    /// that change. The loop ends on [`Command::Quit`], or once the channel
    /// is closed and all outstanding work has settled.
    pub async fn run<F>(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut render: F,
    ) -> ViewState
    where
        F: FnMut(&ViewState, Option<&SevereAlert>),
    {
        let mut commands_open = true;
        loop {
            if !commands_open && self.is_settled() {
                break;
            }
            let alert = tokio::select! {
                command = commands.recv(), if commands_open => match command {
                    Some(Command::Quit) => break,
                    Some(command) => {
                        self.handle_command(command);
                        None
                    }
                    None => {
                        commands_open = false;
                        continue;
                    }
                },
                Some(event) = self.events_rx.recv(), if !self.is_settled() => {
                    self.handle_event(event)
                }
            };
            render(self.store.state(), alert.as_ref());
        }
        self.store.state().clone()
    }

    fn handle_event(&mut self, event: Event) -> Option<SevereAlert> {
        match event {
            Event::InputSettled { revision, text } => {
                if self.debouncer.fire(revision) {
                    self.search_city(&text);
                } else {
                    debug!(revision, "Ignoring superseded input");
                }
                None
            }
            Event::Located { seq, result } => {
                self.in_flight -= 1;
                if let Some(query) = self.store.finish_locating(seq, result) {
                    self.start_fetch(query);
                }
                None
            }
            Event::Fetched { ticket, result } => {
                self.in_flight -= 1;
                match self.store.complete(ticket, result) {
                    Completion::Applied { alert } => alert,
                    Completion::Stale => None,
                }
            }
        }
    }

    fn guard_controls(&mut self, action: &str) -> bool {
        let enabled = self.state().controls_enabled();
        if !enabled {
            debug!("{} ignored while a request is in flight", action);
            self.store.notify(BUSY_NOTICE);
        }
        enabled
    }

    fn on_input(&mut self, text: String) {
        self.store.set_input(text.clone());
        if text.trim().is_empty() {
            self.debouncer.cancel();
            return;
        }
        self.debouncer
            .schedule(self.events_tx.clone(), move |revision| Event::InputSettled {
                revision,
                text,
            });
    }

    fn search_city(&mut self, text: &str) {
        match LocationResolver::resolve_city(text) {
            Ok(query) => self.start_fetch(query),
            Err(e) => {
                debug!("Rejected city input: {}", e);
                self.store.reject(&e, Some(RetryAction::Input));
            }
        }
    }

    /// Validate the current input again, as a city or a coordinate pair
    fn retry_input(&mut self) {
        let text = self.state().input.clone();
        match LocationParser::parse(&text) {
            Ok(query) => self.start_fetch(query),
            Err(e) => {
                debug!("Input still invalid: {}", e);
                self.store.reject(&e, Some(RetryAction::Input));
            }
        }
    }

    fn start_fetch(&mut self, query: LocationQuery) {
        let ticket = self.store.begin(query);
        let fetcher = self.fetcher.clone();
        let tx = self.events_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = fetcher.fetch(&ticket.query).await;
            let _ = tx.send(Event::Fetched { ticket, result });
        });
    }

    fn start_locating(&mut self) {
        let seq = self.store.begin_locating();
        let resolver = Arc::clone(&self.resolver);
        let tx = self.events_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = resolver.locate().await;
            let _ = tx.send(Event::Located { seq, result });
        });
    }
}
