use crate::feed::{LogEntry, LogLevel, LogSource};
use chrono::Utc;
use serde_json::Value;
use std::collections::VecDeque;

/// Number of entries the feed keeps; older ones fall off the front.
pub const FEED_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct LogFeed {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    seq: u64,
}

impl Default for LogFeed {
    fn default() -> Self {
        Self::with_capacity(FEED_CAPACITY)
    }
}

impl LogFeed {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            seq: 0,
        }
    }

    /// Record a locally produced entry and return its id.
    pub fn push(
        &mut self,
        level: LogLevel,
        message: impl Into<String>,
        data: Option<Value>,
        source: LogSource,
    ) -> String {
        let timestamp = Utc::now();
        let id = format!("{}-{}", timestamp.timestamp_millis(), self.seq);
        self.seq += 1;

        self.append(LogEntry {
            id: id.clone(),
            timestamp,
            level,
            message: message.into(),
            data,
            source,
        });
        id
    }

    /// Store an entry as received, e.g. from the push channel.
    pub fn append(&mut self, entry: LogEntry) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.push(LogLevel::Info, "Logs cleared", None, LogSource::System);
    }

    /// Entries at `level`, or all of them when `level` is `None`. Oldest first.
    pub fn filtered(&self, level: Option<LogLevel>) -> Vec<&LogEntry> {
        self.entries
            .iter()
            .filter(|e| level.is_none_or(|l| e.level == l))
            .collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
