//! # WebSocket Transport
//!
//! WebSocket client for the feeder with fixed-delay reconnection.
//!
//! ## Connection Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    WebSocket Connection States                          │
//! │                                                                         │
//! │  ┌────────────┐     spawn()     ┌────────────┐                         │
//! │  │Disconnected│ ──────────────► │ Connecting │ ◄────────────┐          │
//! │  └────────────┘                 └─────┬──────┘              │          │
//! │        ▲                              │                     │          │
//! │        │                    success   │   failure           │          │
//! │        │                        ┌─────┴─────┐               │          │
//! │        │                        ▼           ▼               │          │
//! │        │              ┌────────────┐  ┌────────────┐        │          │
//! │        │              │ Connected  │  │  Waiting   │ ───────┘          │
//! │        │              └─────┬──────┘  └────────────┘  delay elapsed    │
//! │        │                    │               ▲         or reconnect()   │
//! │        │        close/error │               │                          │
//! │        │                    └───────────────┘                          │
//! │        │                                                                │
//! │        └──────────── shutdown() from any state                          │
//! │                                                                         │
//! │  RECONNECT STRATEGY                                                    │
//! │  ──────────────────                                                    │
//! │  Same delay every time (default 5s), no attempt limit.                 │
//! │  A clean close and an error take the same path.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One task owns the socket, the delay and the control channel, so there is
//! never more than one connection attempt in flight. A manual reconnect
//! cuts the current wait short instead of starting a second timer.
//!
//! Commands queued on the handle are written only while a connection is up.
//! Whatever is still queued when a connection ends is discarded.

use backoff::backoff::{Backoff, Constant};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, RwLock};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::protocol::Command;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// =============================================================================
// Transport State
// =============================================================================

/// Connection state for the WebSocket transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected (initial and after shutdown).
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Connected and ready.
    Connected,
    /// Sleeping before the next attempt.
    Waiting,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Waiting => write!(f, "waiting"),
        }
    }
}

/// What the transport reports to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A connection was established.
    Opened,
    /// The established connection ended (clean close or error).
    Closed { reason: String },
    /// One inbound text frame, undecoded.
    Frame(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    Reconnect,
    Shutdown,
}

// =============================================================================
// Transport Configuration
// =============================================================================

/// Configuration for the WebSocket transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// WebSocket URL of the feeder.
    pub url: String,

    /// Handshake timeout.
    pub connect_timeout: Duration,

    /// Delay between a lost connection and the next attempt.
    pub reconnect_delay: Duration,

    /// Ping interval for keepalive.
    pub ping_interval: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            url: String::new(),
            connect_timeout: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(5),
            ping_interval: Duration::from_secs(30),
        }
    }
}

// =============================================================================
// Transport Handle
// =============================================================================

/// Handle for interacting with the transport from other components.
#[derive(Clone)]
pub struct TransportHandle {
    /// Sender for outgoing commands.
    outgoing_tx: mpsc::Sender<Command>,

    /// Current connection state.
    state: Arc<RwLock<ConnectionState>>,

    /// Reconnect / shutdown requests.
    control_tx: mpsc::Sender<Control>,
}

impl TransportHandle {
    /// Queues a command for the current connection.
    pub async fn send(&self, command: Command) -> SyncResult<()> {
        self.outgoing_tx
            .send(command)
            .await
            .map_err(|_| SyncError::ChannelError("Transport task has stopped".into()))
    }

    /// Returns the current connection state.
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Returns true if currently connected.
    pub async fn is_connected(&self) -> bool {
        *self.state.read().await == ConnectionState::Connected
    }

    /// Skips a pending reconnect delay and connects right away.
    ///
    /// Ignored while a connection is open.
    pub async fn reconnect(&self) -> SyncResult<()> {
        self.control_tx
            .send(Control::Reconnect)
            .await
            .map_err(|_| SyncError::ChannelError("Failed to send reconnect signal".into()))
    }

    /// Closes the connection and stops the transport task.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.control_tx
            .send(Control::Shutdown)
            .await
            .map_err(|_| SyncError::ChannelError("Failed to send shutdown signal".into()))
    }
}

/// A handle with no task behind it, for driving the agent in tests.
#[cfg(test)]
pub(crate) struct DetachedTransport {
    pub handle: TransportHandle,
    pub outgoing_rx: mpsc::Receiver<Command>,
    pub control_rx: mpsc::Receiver<Control>,
}

#[cfg(test)]
impl DetachedTransport {
    pub fn new() -> Self {
        let (outgoing_tx, outgoing_rx) = mpsc::channel(100);
        let (control_tx, control_rx) = mpsc::channel(4);
        let handle = TransportHandle {
            outgoing_tx,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            control_tx,
        };
        DetachedTransport {
            handle,
            outgoing_rx,
            control_rx,
        }
    }

    /// Stands in for the transport task's state updates.
    pub async fn set_state(&self, state: ConnectionState) {
        *self.handle.state.write().await = state;
    }
}

// =============================================================================
// WebSocket Transport
// =============================================================================

/// How a connection loop ended.
enum LoopExit {
    Lost(String),
    Shutdown,
}

/// WebSocket transport with automatic reconnection.
///
/// ## Usage
/// ```rust,ignore
/// let config = TransportConfig {
///     url: "ws://192.168.1.100:81/".into(),
///     ..Default::default()
/// };
///
/// let (handle, mut events) = Transport::spawn(config);
///
/// while let Some(event) = events.recv().await {
///     if event == TransportEvent::Opened {
///         handle.send(Command::GetStatus).await?;
///     }
/// }
/// ```
pub struct Transport {
    config: TransportConfig,
    state: Arc<RwLock<ConnectionState>>,
    outgoing_rx: mpsc::Receiver<Command>,
    events_tx: mpsc::Sender<TransportEvent>,
    control_rx: mpsc::Receiver<Control>,
}

impl Transport {
    /// Creates a new transport and spawns its background task.
    ///
    /// Returns a handle for sending commands and a receiver for transport
    /// events.
    pub fn spawn(config: TransportConfig) -> (TransportHandle, mpsc::Receiver<TransportEvent>) {
        let (outgoing_tx, outgoing_rx) = mpsc::channel::<Command>(100);
        let (events_tx, events_rx) = mpsc::channel::<TransportEvent>(100);
        let (control_tx, control_rx) = mpsc::channel::<Control>(4);
        let state = Arc::new(RwLock::new(ConnectionState::Disconnected));

        let transport = Transport {
            config,
            state: state.clone(),
            outgoing_rx,
            events_tx,
            control_rx,
        };

        tokio::spawn(transport.run());

        let handle = TransportHandle {
            outgoing_tx,
            state,
            control_tx,
        };

        (handle, events_rx)
    }

    /// Main transport loop.
    async fn run(mut self) {
        info!(url = %self.config.url, "Transport starting");

        let mut delay = Constant::new(self.config.reconnect_delay);

        'outer: loop {
            *self.state.write().await = ConnectionState::Connecting;

            let attempt = tokio::select! {
                result = connect(&self.config) => result,
                control = self.control_rx.recv() => match control {
                    Some(Control::Reconnect) => {
                        debug!("Reconnect requested while connecting, restarting attempt");
                        continue 'outer;
                    }
                    Some(Control::Shutdown) | None => break 'outer,
                },
            };

            match attempt {
                Ok(ws_stream) => {
                    info!("WebSocket connected");
                    *self.state.write().await = ConnectionState::Connected;
                    self.discard_queued("stale");

                    if self.events_tx.send(TransportEvent::Opened).await.is_err() {
                        warn!("Transport event receiver dropped");
                        break 'outer;
                    }

                    let exit = self.connection_loop(ws_stream).await;
                    *self.state.write().await = ConnectionState::Disconnected;
                    self.discard_queued("unsent");

                    let reason = match &exit {
                        LoopExit::Lost(reason) => reason.clone(),
                        LoopExit::Shutdown => "shutdown".to_string(),
                    };
                    info!(%reason, "WebSocket closed");

                    if self
                        .events_tx
                        .send(TransportEvent::Closed { reason })
                        .await
                        .is_err()
                    {
                        break 'outer;
                    }

                    match exit {
                        LoopExit::Shutdown => break 'outer,
                        LoopExit::Lost(_) => {}
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to connect");
                }
            }

            // Connection lost or never made: wait, then try again.
            *self.state.write().await = ConnectionState::Waiting;

            let Some(wait) = delay.next_backoff() else {
                error!("Reconnect delay exhausted");
                break;
            };
            debug!(?wait, "Waiting before reconnect");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                control = self.control_rx.recv() => match control {
                    Some(Control::Reconnect) => {
                        info!("Manual reconnect, skipping remaining delay");
                    }
                    Some(Control::Shutdown) | None => {
                        info!("Shutdown during reconnect delay");
                        break;
                    }
                },
            }
        }

        *self.state.write().await = ConnectionState::Disconnected;
        info!("Transport stopped");
    }

    /// Pumps one established connection until it ends.
    async fn connection_loop(&mut self, ws_stream: WsStream) -> LoopExit {
        let (mut write, mut read) = ws_stream.split();

        let mut ping_interval = tokio::time::interval(self.config.ping_interval);
        ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately.
        ping_interval.tick().await;

        loop {
            tokio::select! {
                // Outgoing commands
                Some(command) = self.outgoing_rx.recv() => {
                    let json = match command.to_json() {
                        Ok(json) => json,
                        Err(e) => {
                            error!(error = %e, msg_type = command.type_name(), "Failed to serialize command");
                            continue;
                        }
                    };
                    debug!(msg_type = command.type_name(), %json, "Sending command");
                    if let Err(e) = write.send(WsMessage::Text(json.into())).await {
                        return LoopExit::Lost(SyncError::from(e).to_string());
                    }
                }

                // Incoming frames
                frame = read.next() => {
                    let Some(result) = frame else {
                        return LoopExit::Lost("stream ended".to_string());
                    };

                    match result {
                        Ok(WsMessage::Text(text)) => {
                            let text = text.as_str().to_owned();
                            if self.events_tx.send(TransportEvent::Frame(text)).await.is_err() {
                                warn!("Transport event receiver dropped");
                                return LoopExit::Shutdown;
                            }
                        }
                        Ok(WsMessage::Ping(data)) => {
                            if let Err(e) = write.send(WsMessage::Pong(data)).await {
                                return LoopExit::Lost(SyncError::from(e).to_string());
                            }
                        }
                        Ok(WsMessage::Pong(_)) => {
                            debug!("Received pong");
                        }
                        Ok(WsMessage::Close(frame)) => {
                            info!(?frame, "Received close frame");
                            return LoopExit::Lost("closed by device".to_string());
                        }
                        Ok(WsMessage::Binary(_)) => {
                            warn!("Received unexpected binary message");
                        }
                        Ok(WsMessage::Frame(_)) => {
                            // Raw frame, ignore
                        }
                        Err(e) => {
                            let err = SyncError::from(e);
                            error!(error = %err, "WebSocket error");
                            return LoopExit::Lost(err.to_string());
                        }
                    }
                }

                // Keepalive
                _ = ping_interval.tick() => {
                    if let Err(e) = write.send(WsMessage::Ping(Default::default())).await {
                        return LoopExit::Lost(SyncError::from(e).to_string());
                    }
                    debug!("Sent ping");
                }

                // Reconnect / shutdown
                control = self.control_rx.recv() => match control {
                    Some(Control::Reconnect) => {
                        debug!("Already connected, reconnect ignored");
                    }
                    Some(Control::Shutdown) | None => {
                        let _ = write.send(WsMessage::Close(None)).await;
                        return LoopExit::Shutdown;
                    }
                },
            }
        }
    }

    /// Drops queued commands; there is no offline queue.
    fn discard_queued(&mut self, what: &str) {
        while let Ok(command) = self.outgoing_rx.try_recv() {
            warn!(msg_type = command.type_name(), "Discarding {} command", what);
        }
    }
}

/// Connects with timeout.
async fn connect(config: &TransportConfig) -> SyncResult<WsStream> {
    match timeout(config.connect_timeout, connect_async(config.url.as_str())).await {
        Ok(Ok((ws_stream, response))) => {
            debug!(status = ?response.status(), "WebSocket handshake complete");
            Ok(ws_stream)
        }
        Ok(Err(e)) => Err(SyncError::from(e)),
        Err(_) => Err(SyncError::timed_out(config.connect_timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
        assert_eq!(ConnectionState::Waiting.to_string(), "waiting");
    }

    #[test]
    fn test_transport_config_default() {
        let config = TransportConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_reconnect_delay_never_grows() {
        let mut delay = Constant::new(Duration::from_secs(5));
        for _ in 0..10 {
            assert_eq!(delay.next_backoff(), Some(Duration::from_secs(5)));
        }
    }

    #[tokio::test]
    async fn test_unreachable_device_keeps_retrying() {
        // Port 9 on localhost is closed in any sane test environment.
        let config = TransportConfig {
            url: "ws://127.0.0.1:9/".into(),
            connect_timeout: Duration::from_millis(500),
            reconnect_delay: Duration::from_millis(50),
            ..Default::default()
        };
        let (handle, mut events) = Transport::spawn(config);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!handle.is_connected().await);
        assert!(events.try_recv().is_err());

        handle.shutdown().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(handle.state().await, ConnectionState::Disconnected);
    }
}
