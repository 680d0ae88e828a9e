//! Push-notification channel: a socket.io client speaking Engine.IO v4 over a
//! websocket, with an explicit reconnect state machine. Notifications are
//! handed to the caller as [`PushEvent`]s over a channel.

pub mod client;
pub mod codec;
pub mod state;

pub use client::{PushClient, PushCommand, PushEvent};
pub use state::{ConnectionMachine, ConnectionState, DisconnectReason, ReconnectPolicy, Signal};
