//! Live log feed shown next to the graph.

pub mod buffer;
pub mod entry;

pub use buffer::{FEED_CAPACITY, LogFeed};
pub use entry::{LogEntry, LogLevel, LogSource};
