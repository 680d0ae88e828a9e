//! Dashboard session: the current snapshot, its derived graph, the log feed and
//! connection status. Inputs arrive as explicit calls; anything that needs a
//! fresh snapshot says so through [`Reaction::Refresh`].

use crate::api::ApiCallEvent;
use crate::contact::ContactRecord;
use crate::feed::{LogEntry, LogFeed, LogLevel, LogSource};
use crate::form::ApiTestResult;
use crate::graph::{self, ContactGraph};
use crate::push::{ConnectionState, PushEvent};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

pub const DASHBOARD_TITLE: &str = "Identity Reconciliation";

/// What the caller should do after feeding the dashboard an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    None,
    Refresh,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsView {
    pub contacts: usize,
    pub primaries: usize,
    pub secondaries: usize,
    pub links: usize,
}

/// Everything the HTML page needs, serialized as one JSON object.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub connection: ConnectionState,
    pub totals: TotalsView,
    pub graph: ContactGraph,
    pub logs: Vec<LogEntry>,
    pub last_result: Option<ApiTestResult>,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    contacts: Vec<ContactRecord>,
    graph: ContactGraph,
    feed: LogFeed,
    connection: ConnectionState,
    last_result: Option<ApiTestResult>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        let mut feed = LogFeed::default();
        feed.push(
            LogLevel::Info,
            format!("{} dashboard started", DASHBOARD_TITLE),
            None,
            LogSource::System,
        );
        Self {
            contacts: Vec::new(),
            graph: ContactGraph::default(),
            feed,
            connection: ConnectionState::Disconnected,
            last_result: None,
        }
    }

    pub fn contacts(&self) -> &[ContactRecord] {
        &self.contacts
    }

    pub fn graph(&self) -> &ContactGraph {
        &self.graph
    }

    pub fn feed(&self) -> &LogFeed {
        &self.feed
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn last_result(&self) -> Option<&ApiTestResult> {
        self.last_result.as_ref()
    }

    /// Swap in a new snapshot and rebuild the graph from it.
    pub fn replace_contacts(&mut self, contacts: Vec<ContactRecord>) {
        self.graph = graph::derive(&contacts);
        self.contacts = contacts;
    }

    pub fn begin_refresh(&mut self) {
        self.feed.push(
            LogLevel::Info,
            "Loading contacts from backend...",
            None,
            LogSource::System,
        );
    }

    pub fn contacts_loaded(&mut self, contacts: Vec<ContactRecord>) {
        let count = contacts.len();
        self.replace_contacts(contacts);
        self.feed.push(
            LogLevel::Info,
            "Loaded contact data from backend",
            Some(json!({ "count": count })),
            LogSource::Database,
        );
    }

    /// A failed fetch empties the snapshot.
    pub fn contacts_failed(&mut self, error: &str) {
        self.feed.push(
            LogLevel::Error,
            "Failed to load contacts from backend",
            Some(json!({ "error": error })),
            LogSource::Database,
        );
        self.replace_contacts(Vec::new());
    }

    pub fn record_api_result(&mut self, result: ApiTestResult) -> Reaction {
        let reaction = if result.success {
            let data = result
                .data
                .as_ref()
                .and_then(|d| serde_json::to_value(d).ok());
            self.feed.push(
                LogLevel::Info,
                "Identity API call successful",
                data,
                LogSource::Api,
            );
            Reaction::Refresh
        } else {
            self.feed.push(
                LogLevel::Error,
                "Identity API call failed",
                Some(json!({ "error": result.error })),
                LogSource::Api,
            );
            Reaction::None
        };
        self.last_result = Some(result);
        reaction
    }

    pub fn record_api_call(&mut self, event: &ApiCallEvent) {
        let level = if event.success {
            LogLevel::Debug
        } else {
            LogLevel::Warn
        };
        self.feed.push(
            level,
            format!("{} took {} ms", event.endpoint, event.duration_ms),
            serde_json::to_value(event).ok(),
            LogSource::Api,
        );
    }

    pub fn handle_push(&mut self, event: PushEvent) -> Reaction {
        match event {
            PushEvent::Connected => {
                self.connection = ConnectionState::Connected;
                self.feed
                    .push(LogLevel::Info, "WebSocket connected", None, LogSource::System);
            }
            PushEvent::Disconnected { reason } => {
                self.connection = ConnectionState::Disconnected;
                self.feed.push(
                    LogLevel::Warn,
                    "WebSocket disconnected",
                    Some(json!({ "reason": reason.to_string() })),
                    LogSource::System,
                );
            }
            PushEvent::Error(message) => {
                self.feed.push(
                    LogLevel::Error,
                    "WebSocket connection error",
                    Some(json!({ "error": message })),
                    LogSource::System,
                );
            }
            PushEvent::Retrying {
                attempt,
                max_attempts,
                delay,
            } => {
                self.connection = ConnectionState::Retrying { attempt };
                self.feed.push(
                    LogLevel::Info,
                    format!(
                        "Reconnecting in {}ms (attempt {}/{})",
                        delay.as_millis(),
                        attempt,
                        max_attempts
                    ),
                    None,
                    LogSource::System,
                );
            }
            PushEvent::GaveUp => {
                self.connection = ConnectionState::GivenUp;
                self.feed.push(
                    LogLevel::Error,
                    "Max reconnection attempts reached",
                    None,
                    LogSource::System,
                );
            }
            PushEvent::LogEntry(entry) => self.feed.append(entry),
            PushEvent::DatabaseUpdate(data) => {
                self.feed
                    .push(LogLevel::Info, "Database updated", Some(data), LogSource::Database);
                return Reaction::Refresh;
            }
            PushEvent::ContactChange(data) => {
                self.feed.push(
                    LogLevel::Info,
                    "Contact change detected",
                    Some(data),
                    LogSource::Database,
                );
                return Reaction::Refresh;
            }
        }
        Reaction::None
    }

    /// Add a free-form line to the feed.
    pub fn note(&mut self, level: LogLevel, message: impl Into<String>, source: LogSource) {
        self.feed.push(level, message, None, source);
    }

    pub fn view(&self) -> DashboardView {
        let primaries = self.graph.primaries().count();
        DashboardView {
            title: DASHBOARD_TITLE.to_string(),
            generated_at: Utc::now(),
            connection: self.connection,
            totals: TotalsView {
                contacts: self.contacts.len(),
                primaries,
                secondaries: self.graph.nodes.len() - primaries,
                links: self.graph.edges.len(),
            },
            graph: self.graph.clone(),
            logs: self.feed.entries().cloned().collect(),
            last_result: self.last_result.clone(),
        }
    }
}
