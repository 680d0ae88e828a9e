//! Connection lifecycle of the push channel.
//!
//! ```text
//!  Disconnected --Connect--> Connecting --Connected--> Connected
//!                               |  ^                       |
//!                  ConnectError |  | RetryElapsed          | ConnectError, Disconnected(server/transport)
//!                               v  |                       v
//!                           Retrying(n) <------------------+
//!                               |
//!                               | n == max_attempts
//!                               v
//!                            GivenUp
//! ```
//!
//! `Close` from any state lands in `Disconnected` without retrying.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Retrying { attempt: u32 },
    GivenUp,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectReason {
    /// The server closed the socket.io session.
    ServerDisconnect,
    /// The websocket went away underneath us.
    TransportClose,
    /// No ping arrived within the negotiated window.
    PingTimeout,
    /// We closed it.
    ClientDisconnect,
}

impl DisconnectReason {
    pub fn should_retry(&self) -> bool {
        !matches!(self, DisconnectReason::ClientDisconnect)
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DisconnectReason::ServerDisconnect => "io server disconnect",
            DisconnectReason::TransportClose => "transport close",
            DisconnectReason::PingTimeout => "ping timeout",
            DisconnectReason::ClientDisconnect => "io client disconnect",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Connect,
    Connected,
    ConnectError,
    Disconnected(DisconnectReason),
    RetryElapsed,
    Close,
}

#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    state: ConnectionState,
    attempts: u32,
    policy: ReconnectPolicy,
}

impl ConnectionMachine {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            attempts: 0,
            policy,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Apply `signal` and return the resulting state. Signals that make no
    /// sense in the current state leave it unchanged.
    pub fn handle(&mut self, signal: Signal) -> ConnectionState {
        use ConnectionState::*;

        self.state = match (self.state, signal) {
            (_, Signal::Close) => Disconnected,

            (Disconnected, Signal::Connect) => Connecting,
            (GivenUp, Signal::Connect) => {
                self.attempts = 0;
                Connecting
            }

            (Connecting, Signal::Connected) => {
                self.attempts = 0;
                Connected
            }
            (Connecting, Signal::ConnectError) => self.schedule_retry(),
            // Lost before the namespace handshake finished.
            (Connecting, Signal::Disconnected(reason)) if reason.should_retry() => {
                self.schedule_retry()
            }

            // Namespace rejected after the session was already up.
            (Connected, Signal::ConnectError) => self.schedule_retry(),
            (Connected, Signal::Disconnected(reason)) => {
                if reason.should_retry() {
                    self.schedule_retry()
                } else {
                    Disconnected
                }
            }

            (Retrying { .. }, Signal::RetryElapsed) => Connecting,

            (state, _) => state,
        };
        self.state
    }

    fn schedule_retry(&mut self) -> ConnectionState {
        if self.attempts >= self.policy.max_attempts {
            return ConnectionState::GivenUp;
        }
        self.attempts += 1;
        ConnectionState::Retrying {
            attempt: self.attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn machine(max_attempts: u32) -> ConnectionMachine {
        ConnectionMachine::new(ReconnectPolicy {
            max_attempts,
            interval: Duration::from_millis(1),
        })
    }

    #[test]
    fn happy_path() {
        let mut m = machine(5);
        assert_eq!(m.state(), ConnectionState::Disconnected);
        assert_eq!(m.handle(Signal::Connect), ConnectionState::Connecting);
        assert_eq!(m.handle(Signal::Connected), ConnectionState::Connected);
        assert!(m.state().is_connected());
    }

    #[test]
    fn gives_up_after_budget() {
        let mut m = machine(2);
        m.handle(Signal::Connect);
        assert_eq!(
            m.handle(Signal::ConnectError),
            ConnectionState::Retrying { attempt: 1 }
        );
        assert_eq!(m.handle(Signal::RetryElapsed), ConnectionState::Connecting);
        assert_eq!(
            m.handle(Signal::ConnectError),
            ConnectionState::Retrying { attempt: 2 }
        );
        m.handle(Signal::RetryElapsed);
        assert_eq!(m.handle(Signal::ConnectError), ConnectionState::GivenUp);

        // Terminal until someone explicitly reconnects.
        assert_eq!(m.handle(Signal::RetryElapsed), ConnectionState::GivenUp);
        assert_eq!(m.handle(Signal::Connect), ConnectionState::Connecting);
        assert_eq!(m.attempts(), 0);
    }

    #[test]
    fn successful_connect_resets_attempts() {
        let mut m = machine(5);
        m.handle(Signal::Connect);
        m.handle(Signal::ConnectError);
        m.handle(Signal::RetryElapsed);
        m.handle(Signal::ConnectError);
        assert_eq!(m.attempts(), 2);

        m.handle(Signal::RetryElapsed);
        m.handle(Signal::Connected);
        assert_eq!(m.attempts(), 0);

        assert_eq!(
            m.handle(Signal::Disconnected(DisconnectReason::TransportClose)),
            ConnectionState::Retrying { attempt: 1 }
        );
    }

    #[test]
    fn connect_error_while_connected_waits_for_retry() {
        let mut m = machine(1);
        m.handle(Signal::Connect);
        m.handle(Signal::Connected);
        assert_eq!(
            m.handle(Signal::ConnectError),
            ConnectionState::Retrying { attempt: 1 }
        );
        assert_eq!(m.attempts(), 1);

        m.handle(Signal::RetryElapsed);
        assert_eq!(m.handle(Signal::ConnectError), ConnectionState::GivenUp);
    }

    #[test]
    fn client_disconnect_does_not_retry() {
        let mut m = machine(5);
        m.handle(Signal::Connect);
        m.handle(Signal::Connected);
        assert_eq!(
            m.handle(Signal::Disconnected(DisconnectReason::ClientDisconnect)),
            ConnectionState::Disconnected
        );
    }

    #[test]
    fn close_wins_everywhere() {
        let mut m = machine(5);
        m.handle(Signal::Connect);
        m.handle(Signal::ConnectError);
        assert_eq!(m.handle(Signal::Close), ConnectionState::Disconnected);
    }

    #[test]
    fn ignores_out_of_order_signals() {
        let mut m = machine(5);
        assert_eq!(m.handle(Signal::Connected), ConnectionState::Disconnected);
        assert_eq!(m.handle(Signal::RetryElapsed), ConnectionState::Disconnected);
        m.handle(Signal::Connect);
        assert_eq!(m.handle(Signal::Connect), ConnectionState::Connecting);
    }

    #[test]
    fn reasons_render_like_socket_io() {
        assert_eq!(DisconnectReason::ServerDisconnect.to_string(), "io server disconnect");
        assert!(DisconnectReason::PingTimeout.should_retry());
        assert!(!DisconnectReason::ClientDisconnect.should_retry());
    }
}
