//! Contact snapshot layer: the record shape served by the reconciliation
//! backend, plus decoding of `/api/contacts` payloads and snapshot files.

pub mod record;
pub mod snapshot;

pub use record::{ContactId, ContactRecord, LinkPrecedence};
pub use snapshot::{parse_snapshot, read_snapshot_file};
