//! Connection settings shared by the HTTP client and the push channel.

use clap::Args;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:3001/";
pub const DEFAULT_SOCKET_URL: &str = "http://localhost:3001";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Command-line flags (with env fallbacks) for reaching the backend.
#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    /// Base URL of the reconciliation API.
    #[arg(long, env = "IDENTITY_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: Url,

    /// Base URL of the push-notification (socket.io) endpoint.
    #[arg(long, env = "IDENTITY_SOCKET_URL", default_value = DEFAULT_SOCKET_URL)]
    pub socket_url: Url,

    /// Request and connect timeout in milliseconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: Url,
    pub socket_url: Url,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_url: Url, socket_url: Url, timeout: Duration) -> Self {
        Self {
            api_url: with_trailing_slash(api_url),
            socket_url,
            timeout,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(
            Url::parse(DEFAULT_API_URL).expect("default api url is valid"),
            Url::parse(DEFAULT_SOCKET_URL).expect("default socket url is valid"),
            Duration::from_millis(DEFAULT_TIMEOUT_MS),
        )
    }
}

impl From<ConnectionArgs> for ClientConfig {
    fn from(args: ConnectionArgs) -> Self {
        Self::new(
            args.api_url,
            args.socket_url,
            Duration::from_millis(args.timeout_ms),
        )
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
