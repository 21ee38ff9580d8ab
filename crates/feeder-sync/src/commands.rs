//! # Command Sender
//!
//! Turns user intents into outbound commands.
//!
//! ```text
//!   feed_now_grams(250) ──► FeedAmount::new ──✗ Rejected (nothing sent)
//!   feed_now_grams(50)  ──► FeedAmount::new ──► dispatch ──► transport
//!                                                   │
//!                                     not connected ┴──✗ NotConnected (dropped)
//! ```
//!
//! A command issued while offline is lost, not queued. The caller gets
//! [`SyncError::NotConnected`] back; the device never hears about it.

use feeder_core::{DeviceState, FeedAmount, ScheduleEntry, StateStore};
use tracing::{debug, error};

use crate::error::{SyncError, SyncResult};
use crate::protocol::Command;
use crate::transport::TransportHandle;

/// Validates intents and hands commands to the transport.
#[derive(Clone)]
pub struct CommandSender {
    transport: TransportHandle,
}

impl CommandSender {
    pub fn new(transport: TransportHandle) -> Self {
        CommandSender { transport }
    }

    /// Sends `command` if the device is connected, otherwise drops it.
    pub async fn dispatch(&self, state: &DeviceState, command: Command) -> SyncResult<()> {
        if !state.connected {
            error!(msg_type = command.type_name(), "Device not connected, command dropped");
            return Err(SyncError::NotConnected);
        }

        debug!(msg_type = command.type_name(), "Dispatching command");
        self.transport.send(command).await
    }

    /// Asks the device for a full status report.
    pub async fn request_status(&self, state: &DeviceState) -> SyncResult<()> {
        self.dispatch(state, Command::GetStatus).await
    }

    /// Starts a manual feeding with an already validated amount.
    pub async fn feed_now(&self, state: &DeviceState, amount: FeedAmount) -> SyncResult<()> {
        self.dispatch(state, Command::feed_now(amount)).await
    }

    /// Validates a raw gram amount, then starts a manual feeding.
    ///
    /// Out-of-range amounts come back as [`SyncError::Rejected`] and never
    /// reach the transport.
    pub async fn feed_now_grams(&self, state: &DeviceState, grams: i64) -> SyncResult<()> {
        let amount = FeedAmount::new(grams)?;
        self.feed_now(state, amount).await
    }

    /// Saves the edited schedule list.
    ///
    /// The store is updated first and stays updated even if the send is
    /// dropped or the device ignores it.
    pub async fn save_schedule(
        &self,
        store: &mut StateStore,
        entries: Vec<ScheduleEntry>,
    ) -> SyncResult<()> {
        store.replace_schedules(entries.clone());
        self.dispatch(store.state(), Command::set_schedule(entries))
            .await
    }
}
