use crate::Result;
use crate::config::ClientConfig;
use crate::feed::LogEntry;
use crate::push::codec::{self, EnginePacket, SocketPacket};
use crate::push::state::{
    ConnectionMachine, ConnectionState, DisconnectReason, ReconnectPolicy, Signal,
};
use anyhow::bail;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until, timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, error, info, warn};
use url::Url;

pub const LOG_ENTRY_EVENT: &str = "log-entry";
pub const DATABASE_UPDATE_EVENT: &str = "database-update";
pub const CONTACT_CHANGE_EVENT: &str = "contact-change";

/// What the push channel reports to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    Connected,
    Disconnected { reason: DisconnectReason },
    Error(String),
    Retrying { attempt: u32, max_attempts: u32, delay: Duration },
    GaveUp,
    LogEntry(LogEntry),
    DatabaseUpdate(Value),
    ContactChange(Value),
}

/// Requests from the consumer to the running client.
#[derive(Debug, Clone, PartialEq)]
pub enum PushCommand {
    Emit { event: String, data: Value },
    Close,
}

/// How a single websocket session ended.
#[derive(Debug)]
enum SessionEnd {
    ConnectFailed(String),
    Disconnected(DisconnectReason),
    Closed,
}

pub struct PushClient {
    endpoint: Url,
    connect_timeout: Duration,
    policy: ReconnectPolicy,
}

impl PushClient {
    pub fn new(config: &ClientConfig, policy: ReconnectPolicy) -> Result<Self> {
        Ok(Self {
            endpoint: websocket_endpoint(&config.socket_url)?,
            connect_timeout: config.timeout,
            policy,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Connect and keep reconnecting per the policy until closed or out of
    /// attempts. Returns once the machine settles in `Disconnected` or `GivenUp`.
    pub async fn run(
        self,
        events: mpsc::Sender<PushEvent>,
        mut commands: mpsc::Receiver<PushCommand>,
    ) -> Result<()> {
        let mut machine = ConnectionMachine::new(self.policy);
        machine.handle(Signal::Connect);

        loop {
            if events.is_closed() {
                machine.handle(Signal::Close);
            }

            match machine.state() {
                ConnectionState::Connecting | ConnectionState::Connected => {
                    info!(url = %self.endpoint, "connecting to push channel");
                    match self.session(&mut machine, &events, &mut commands).await {
                        SessionEnd::ConnectFailed(message) => {
                            error!(%message, "push channel connection error");
                            let _ = events.send(PushEvent::Error(message)).await;
                            machine.handle(Signal::ConnectError);
                        }
                        SessionEnd::Disconnected(reason) => {
                            info!(%reason, "push channel disconnected");
                            let _ = events
                                .send(PushEvent::Disconnected {
                                    reason: reason.clone(),
                                })
                                .await;
                            machine.handle(Signal::Disconnected(reason));
                        }
                        SessionEnd::Closed => {
                            let _ = events
                                .send(PushEvent::Disconnected {
                                    reason: DisconnectReason::ClientDisconnect,
                                })
                                .await;
                            machine.handle(Signal::Close);
                        }
                    }
                }
                ConnectionState::Retrying { attempt } => {
                    let delay = machine.policy().interval;
                    let max_attempts = machine.policy().max_attempts;
                    info!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "reconnecting push channel"
                    );
                    let _ = events
                        .send(PushEvent::Retrying {
                            attempt,
                            max_attempts,
                            delay,
                        })
                        .await;

                    let deadline = Instant::now() + delay;
                    loop {
                        tokio::select! {
                            _ = sleep_until(deadline) => {
                                machine.handle(Signal::RetryElapsed);
                                break;
                            }
                            cmd = commands.recv() => match cmd {
                                Some(PushCommand::Emit { event, .. }) => {
                                    warn!(%event, "push channel not connected, cannot emit event");
                                }
                                Some(PushCommand::Close) | None => {
                                    machine.handle(Signal::Close);
                                    break;
                                }
                            }
                        }
                    }
                }
                ConnectionState::GivenUp => {
                    error!(
                        attempts = machine.policy().max_attempts,
                        "max reconnection attempts reached"
                    );
                    let _ = events.send(PushEvent::GaveUp).await;
                    return Ok(());
                }
                ConnectionState::Disconnected => return Ok(()),
            }
        }
    }

    async fn session(
        &self,
        machine: &mut ConnectionMachine,
        events: &mpsc::Sender<PushEvent>,
        commands: &mut mpsc::Receiver<PushCommand>,
    ) -> SessionEnd {
        let connecting = timeout(self.connect_timeout, connect_async(self.endpoint.as_str())).await;
        let stream = match connecting {
            Ok(Ok((stream, _resp))) => stream,
            Ok(Err(e)) => return SessionEnd::ConnectFailed(e.to_string()),
            Err(_) => {
                return SessionEnd::ConnectFailed(format!(
                    "timed out after {} ms",
                    self.connect_timeout.as_millis()
                ));
            }
        };
        let (mut sink, mut stream) = stream.split();

        // Until the open handshake tells us the ping window, the connect timeout applies.
        let mut ping_window = self.connect_timeout;
        let mut deadline = Instant::now() + ping_window;

        loop {
            tokio::select! {
                frame = stream.next() => {
                    deadline = Instant::now() + ping_window;
                    let text = match frame {
                        Some(Ok(WsMessage::Text(text))) => text,
                        Some(Ok(WsMessage::Close(_))) | None => {
                            return SessionEnd::Disconnected(DisconnectReason::TransportClose);
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            error!(error = %e, "push channel read error");
                            return SessionEnd::Disconnected(DisconnectReason::TransportClose);
                        }
                    };

                    let reply = match codec::decode_engine(text.as_str()) {
                        Ok(EnginePacket::Open(handshake)) => {
                            debug!(sid = %handshake.sid, "engine.io open");
                            ping_window = Duration::from_millis(
                                handshake.ping_interval + handshake.ping_timeout,
                            );
                            deadline = Instant::now() + ping_window;
                            Some(codec::encode_connect(codec::DEFAULT_NAMESPACE))
                        }
                        Ok(EnginePacket::Ping(payload)) => Some(codec::encode_pong(&payload)),
                        Ok(EnginePacket::Close) => {
                            return SessionEnd::Disconnected(DisconnectReason::TransportClose);
                        }
                        Ok(EnginePacket::Message(body)) => {
                            match self.on_message(&body, machine, events).await {
                                Ok(None) => None,
                                Ok(Some(end)) => return end,
                                Err(e) => {
                                    warn!(error = %e, "dropping malformed socket.io packet");
                                    None
                                }
                            }
                        }
                        Ok(_) => None,
                        Err(e) => {
                            warn!(error = %e, "dropping malformed engine.io frame");
                            None
                        }
                    };

                    if let Some(reply) = reply {
                        if let Err(e) = sink.send(WsMessage::Text(reply.into())).await {
                            error!(error = %e, "push channel write error");
                            return SessionEnd::Disconnected(DisconnectReason::TransportClose);
                        }
                    }
                }
                cmd = commands.recv() => match cmd {
                    Some(PushCommand::Emit { event, data }) => {
                        if !machine.state().is_connected() {
                            warn!(%event, "push channel not connected, cannot emit event");
                            continue;
                        }
                        let frame = codec::encode_event(&event, &data);
                        if let Err(e) = sink.send(WsMessage::Text(frame.into())).await {
                            error!(error = %e, "push channel write error");
                            return SessionEnd::Disconnected(DisconnectReason::TransportClose);
                        }
                    }
                    Some(PushCommand::Close) | None => {
                        let _ = sink.send(WsMessage::Close(None)).await;
                        return SessionEnd::Closed;
                    }
                },
                _ = sleep_until(deadline) => {
                    return SessionEnd::Disconnected(DisconnectReason::PingTimeout);
                }
            }
        }
    }

    /// Handle one socket.io packet. `Some` ends the session.
    async fn on_message(
        &self,
        body: &str,
        machine: &mut ConnectionMachine,
        events: &mpsc::Sender<PushEvent>,
    ) -> Result<Option<SessionEnd>> {
        match codec::decode_socket(body)? {
            SocketPacket::Connect { .. } => {
                if !machine.state().is_connected() {
                    machine.handle(Signal::Connected);
                    info!("push channel connected");
                    let _ = events.send(PushEvent::Connected).await;
                }
            }
            SocketPacket::ConnectError { message, .. } => {
                return Ok(Some(SessionEnd::ConnectFailed(message)));
            }
            SocketPacket::Disconnect { .. } => {
                return Ok(Some(SessionEnd::Disconnected(
                    DisconnectReason::ServerDisconnect,
                )));
            }
            SocketPacket::Event { name, data, .. } => {
                if let Some(event) = event_from_packet(&name, data)? {
                    let _ = events.send(event).await;
                }
            }
            SocketPacket::Ack { .. } => {}
        }
        Ok(None)
    }
}

/// Map a named socket.io event onto a [`PushEvent`]; unknown names are skipped.
fn event_from_packet(name: &str, data: Value) -> Result<Option<PushEvent>> {
    Ok(match name {
        LOG_ENTRY_EVENT => Some(PushEvent::LogEntry(serde_json::from_value(data)?)),
        DATABASE_UPDATE_EVENT => Some(PushEvent::DatabaseUpdate(data)),
        CONTACT_CHANGE_EVENT => Some(PushEvent::ContactChange(data)),
        other => {
            debug!(event = other, "ignoring unknown push event");
            None
        }
    })
}

/// `http://host:3001` -> `ws://host:3001/socket.io/?EIO=4&transport=websocket`.
pub fn websocket_endpoint(base: &Url) -> Result<Url> {
    let scheme = match base.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => bail!("unsupported push channel scheme: {}", other),
    };

    let mut url = base.clone();
    if url.set_scheme(scheme).is_err() {
        bail!("cannot use {} as a websocket url", base);
    }
    let path = format!("{}/socket.io/", base.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_query(Some("EIO=4&transport=websocket"));
    url.set_fragment(None);
    Ok(url)
}
