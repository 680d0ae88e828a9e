use crate::Result;
use crate::contact::ContactRecord;
use anyhow::{Context, bail};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use tracing::warn;

/// Shapes a contacts payload may take.
///
/// The backend wraps the list as `{ "success": true, "data": [...], "count": n }`;
/// exported snapshot files are usually the bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContactsPayload {
    Bare(Vec<ContactRecord>),
    Envelope {
        #[serde(default)]
        success: bool,
        #[serde(default)]
        data: Option<Vec<ContactRecord>>,
        #[serde(default)]
        #[allow(dead_code)]
        count: Option<u64>,
    },
}

/// Decode a contacts payload that has already been parsed into JSON.
///
/// An envelope that reports failure, or carries no `data`, yields an empty
/// snapshot (with a warning) rather than an error.
pub fn decode_contacts(value: Value) -> Result<Vec<ContactRecord>> {
    if !value.is_array() && !value.is_object() {
        bail!("contacts payload must be a JSON array or object, got: {}", value);
    }

    let payload: ContactsPayload =
        serde_json::from_value(value).context("decode contacts payload")?;

    Ok(match payload {
        ContactsPayload::Bare(contacts) => contacts,
        ContactsPayload::Envelope {
            success: true,
            data: Some(contacts),
            ..
        } => contacts,
        ContactsPayload::Envelope { success, data, .. } => {
            warn!(
                success,
                has_data = data.is_some(),
                "unexpected contacts response structure"
            );
            Vec::new()
        }
    })
}

/// Parse snapshot text (bare array or backend envelope).
pub fn parse_snapshot(text: &str) -> Result<Vec<ContactRecord>> {
    let value: Value = serde_json::from_str(text).context("snapshot is not valid JSON")?;
    decode_contacts(value)
}

/// Read and parse a snapshot file.
pub fn read_snapshot_file(path: &str) -> Result<Vec<ContactRecord>> {
    let text = fs::read_to_string(path).with_context(|| format!("read snapshot file {}", path))?;
    parse_snapshot(&text).with_context(|| format!("parse snapshot file {}", path))
}
