use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid endpoint: {0}")]
    Url(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{endpoint} returned HTTP {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        /// The server's `message` field when it sent one, else the raw body.
        message: String,
    },

    #[error("decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Text suitable for showing next to a failed probe: the server's own
    /// message when there is one.
    pub fn display_message(&self) -> String {
        match self {
            ApiError::Status { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Pull a `message` (or `error`) string out of an error body.
pub(crate) fn server_message(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(msg) = value.get(key).and_then(|m| m.as_str()) {
                return msg.to_string();
            }
        }
    }
    String::from_utf8_lossy(body).trim().to_string()
}
