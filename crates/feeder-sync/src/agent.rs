//! # Feeder Agent
//!
//! The one task that owns the device state. Transport events and user
//! intents both funnel into it, so every transition is applied whole and in
//! arrival order.
//!
//! ## Agent Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        FeederAgent Architecture                         │
//! │                                                                         │
//! │   UI ── FeederHandle ──► Intent ──┐                                     │
//! │                                   ▼                                     │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                        FeederAgent task                          │  │
//! │  │                                                                  │  │
//! │  │  StateStore (sole owner)        CommandSender                    │  │
//! │  │     ▲ apply()                      │ dispatch() gated on         │  │
//! │  │     │                              │ state.connected             │  │
//! │  └─────┼──────────────────────────────┼─────────────────────────────┘  │
//! │        │ TransportEvent               ▼ Command                        │
//! │  ┌─────┴──────────────────────────────────────────────────────────┐    │
//! │  │                  Transport (WebSocket task)                     │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │                                                                         │
//! │  AFTER EACH TRANSITION:                                                │
//! │  ──────────────────────                                                │
//! │  1. snapshot (Arc<RwLock<DeviceState>>) replaced                       │
//! │  2. emitter told which parts changed:                                  │
//! │     connection · readouts · history · schedules                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Local, NaiveDateTime};
use feeder_core::{
    DeviceEvent, DeviceState, FeedAmount, HistoryRecord, Readouts, Refresh, ScheduleEntry,
    StateStore,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use crate::commands::CommandSender;
use crate::config::FeederConfig;
use crate::error::{SyncError, SyncResult};
use crate::protocol::{decode, Inbound};
use crate::transport::{ConnectionState, Transport, TransportEvent, TransportHandle};

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Receives UI refresh notifications (implemented by the front end).
///
/// Called from the agent task after the snapshot is updated, so a
/// [`FeederHandle::state`] read inside a callback sees the new state.
pub trait FeederEventEmitter: Send + Sync {
    /// Online/offline indicator.
    fn emit_connection(&self, connected: bool);

    /// Weight, today's total, progress, feed button.
    fn emit_readouts(&self, readouts: &Readouts);

    /// History table, newest first.
    fn emit_history(&self, history: &[HistoryRecord]);

    /// Device-reported schedule list.
    fn emit_schedules(&self, schedules: &[ScheduleEntry]);
}

/// No-op event emitter for testing.
pub struct NoOpEmitter;

impl FeederEventEmitter for NoOpEmitter {
    fn emit_connection(&self, _connected: bool) {}
    fn emit_readouts(&self, _readouts: &Readouts) {}
    fn emit_history(&self, _history: &[HistoryRecord]) {}
    fn emit_schedules(&self, _schedules: &[ScheduleEntry]) {}
}

// =============================================================================
// Intents
// =============================================================================

type Reply = oneshot::Sender<SyncResult<()>>;

/// A user request routed through the agent task.
enum Intent {
    FeedNow(FeedAmount, Reply),
    SaveSchedule(Vec<ScheduleEntry>, Reply),
    RequestStatus(Reply),
    Reconnect(Reply),
    Shutdown(Reply),
}

// =============================================================================
// Feeder Handle
// =============================================================================

/// Cloneable handle to a running agent.
#[derive(Clone)]
pub struct FeederHandle {
    intents_tx: mpsc::Sender<Intent>,
    snapshot: Arc<RwLock<DeviceState>>,
    transport: TransportHandle,
}

impl FeederHandle {
    /// Starts a manual feeding of `grams`.
    ///
    /// The amount is range-checked here, before anything is queued: an
    /// out-of-range value returns [`SyncError::Rejected`] and produces no
    /// traffic.
    pub async fn feed_now(&self, grams: i64) -> SyncResult<()> {
        let amount = FeedAmount::new(grams)?;
        self.request(|reply| Intent::FeedNow(amount, reply)).await
    }

    /// Saves the edited schedule list (optimistic, see
    /// [`CommandSender::save_schedule`]).
    pub async fn save_schedule(&self, entries: Vec<ScheduleEntry>) -> SyncResult<()> {
        self.request(|reply| Intent::SaveSchedule(entries, reply))
            .await
    }

    /// Asks the device for a fresh `status_update`.
    pub async fn request_status(&self) -> SyncResult<()> {
        self.request(Intent::RequestStatus).await
    }

    /// Reconnects now instead of waiting out the delay. No effect while online.
    pub async fn reconnect(&self) -> SyncResult<()> {
        self.request(Intent::Reconnect).await
    }

    /// Stops the agent and its transport.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.request(Intent::Shutdown).await
    }

    /// Copy of the latest fully applied state.
    pub async fn state(&self) -> DeviceState {
        self.snapshot.read().await.clone()
    }

    /// Readouts derived from the latest state.
    pub async fn readouts(&self) -> Readouts {
        Readouts::from_state(&*self.snapshot.read().await)
    }

    /// Low-level transport state (connecting, waiting, ...).
    pub async fn connection_state(&self) -> ConnectionState {
        self.transport.state().await
    }

    async fn request<F>(&self, make: F) -> SyncResult<()>
    where
        F: FnOnce(Reply) -> Intent,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.intents_tx
            .send(make(reply_tx))
            .await
            .map_err(|_| SyncError::ShuttingDown)?;
        reply_rx.await.map_err(|_| SyncError::ShuttingDown)?
    }
}

// =============================================================================
// Feeder Agent
// =============================================================================

/// Owns the [`StateStore`] and reconciles it with the device.
pub struct FeederAgent {
    store: StateStore,
    sender: CommandSender,
    transport: TransportHandle,
    snapshot: Arc<RwLock<DeviceState>>,
    emitter: Arc<dyn FeederEventEmitter>,
}

impl FeederAgent {
    /// Validates `config`, spawns the transport and the agent task.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(
        config: &FeederConfig,
        emitter: Arc<dyn FeederEventEmitter>,
    ) -> SyncResult<FeederHandle> {
        config.validate()?;
        let transport_config = config.transport_config()?;

        info!(url = %transport_config.url, "Starting feeder agent");

        let (transport, events_rx) = Transport::spawn(transport_config);
        Ok(Self::launch(transport, events_rx, emitter))
    }

    /// Spawns the agent task over an existing transport.
    pub(crate) fn launch(
        transport: TransportHandle,
        events_rx: mpsc::Receiver<TransportEvent>,
        emitter: Arc<dyn FeederEventEmitter>,
    ) -> FeederHandle {
        let (intents_tx, intents_rx) = mpsc::channel(32);
        let snapshot = Arc::new(RwLock::new(DeviceState::default()));

        let agent = FeederAgent {
            store: StateStore::new(),
            sender: CommandSender::new(transport.clone()),
            transport: transport.clone(),
            snapshot: snapshot.clone(),
            emitter,
        };

        tokio::spawn(agent.run(events_rx, intents_rx));

        FeederHandle {
            intents_tx,
            snapshot,
            transport,
        }
    }

    /// Main loop: one transport event or one intent at a time.
    async fn run(
        mut self,
        mut events_rx: mpsc::Receiver<TransportEvent>,
        mut intents_rx: mpsc::Receiver<Intent>,
    ) {
        loop {
            tokio::select! {
                event = events_rx.recv() => match event {
                    Some(event) => self.on_transport_event(event).await,
                    None => {
                        info!("Transport stopped, agent exiting");
                        break;
                    }
                },

                intent = intents_rx.recv() => match intent {
                    Some(Intent::Shutdown(reply)) => {
                        info!("Shutting down feeder agent");
                        let result = self.transport.shutdown().await;
                        let refresh = self.store.set_connected(false);
                        self.publish(&refresh).await;
                        let _ = reply.send(result);
                        break;
                    }
                    Some(intent) => self.on_intent(intent).await,
                    None => {
                        debug!("All handles dropped, stopping transport");
                        let _ = self.transport.shutdown().await;
                        break;
                    }
                },
            }
        }

        info!("Feeder agent stopped");
    }

    // -------------------------------------------------------------------------
    // Transport Events
    // -------------------------------------------------------------------------

    async fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => {
                info!("Device online");
                let refresh = self.store.set_connected(true);

                if let Err(e) = self.sender.request_status(self.store.state()).await {
                    warn!(error = %e, "Failed to request status");
                }

                self.publish(&refresh).await;
            }

            TransportEvent::Closed { reason } => {
                info!(%reason, "Device offline");
                let refresh = self.store.set_connected(false);
                self.publish(&refresh).await;
            }

            TransportEvent::Frame(text) => self.on_frame(&text, now()).await,
        }
    }

    async fn on_frame(&mut self, text: &str, at: NaiveDateTime) {
        let event = match decode(text) {
            Ok(Inbound::Event(event)) => event,
            Ok(Inbound::Unknown(kind)) => {
                debug!(%kind, "Ignoring unknown message type");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Dropping malformed message");
                return;
            }
        };

        debug!(kind = event.kind(), "Applying device event");

        match &event {
            DeviceEvent::FeedingStarted(_) if self.store.pending_record().is_some() => {
                warn!("Feeding started before the previous one completed, closing stale record");
            }
            DeviceEvent::FeedingCompleted(_) if self.store.pending_record().is_none() => {
                warn!("Feeding completed with no open history record, history unchanged");
            }
            _ => {}
        }

        let refresh = self.store.apply(event, at);
        self.publish(&refresh).await;
    }

    // -------------------------------------------------------------------------
    // Intents
    // -------------------------------------------------------------------------

    async fn on_intent(&mut self, intent: Intent) {
        match intent {
            Intent::FeedNow(amount, reply) => {
                let result = self.sender.feed_now(self.store.state(), amount).await;
                let _ = reply.send(result);
            }

            Intent::SaveSchedule(entries, reply) => {
                let result = self.sender.save_schedule(&mut self.store, entries).await;
                // Optimistic replace happened even if the send was dropped.
                self.publish(&[]).await;
                let _ = reply.send(result);
            }

            Intent::RequestStatus(reply) => {
                let result = self.sender.request_status(self.store.state()).await;
                let _ = reply.send(result);
            }

            Intent::Reconnect(reply) => {
                info!("Manual reconnect requested");
                let _ = reply.send(self.transport.reconnect().await);
            }

            Intent::Shutdown(reply) => {
                // Handled in run().
                let _ = reply.send(Ok(()));
            }
        }
    }

    // -------------------------------------------------------------------------
    // Publishing
    // -------------------------------------------------------------------------

    /// Replaces the shared snapshot, then notifies the emitter.
    async fn publish(&self, refresh: &[Refresh]) {
        let state = self.store.state();
        *self.snapshot.write().await = state.clone();

        for part in refresh {
            match part {
                Refresh::Connection => self.emitter.emit_connection(state.connected),
                Refresh::Readouts => self.emitter.emit_readouts(&self.store.readouts()),
                Refresh::History => self.emitter.emit_history(&state.history),
                Refresh::Schedules => self.emitter.emit_schedules(&state.schedules),
            }
        }
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
