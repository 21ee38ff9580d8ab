//! # feeder-sync: Device Link for the Feeder Client
//!
//! Keeps a local [`DeviceState`](feeder_core::DeviceState) in step with a
//! networked pet feeder over one WebSocket, and carries user commands the
//! other way.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Feeder Sync Architecture                         │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 FeederAgent (single owner of state)              │  │
//! │  │                                                                  │  │
//! │  │  Spawned as a Tokio task by FeederAgent::start                   │  │
//! │  │  Applies device events in arrival order                          │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ CommandSender  │  │   Transport    │  │  protocol::decode      │    │
//! │  │                │  │                │  │                        │    │
//! │  │ Range-checks   │  │ WebSocket with │  │ Known event, unknown   │    │
//! │  │ feed amounts,  │  │ fixed-delay    │  │ type (ignored) or      │    │
//! │  │ drops offline  │  │ reconnect and  │  │ malformed (dropped)    │    │
//! │  │ commands       │  │ keepalive      │  │                        │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  UI EVENTS (FeederEventEmitter):                                       │
//! │  • connection - online/offline indicator                               │
//! │  • readouts   - weight, today's total, progress, feed button           │
//! │  • history    - feeding history table                                  │
//! │  • schedules  - device-reported schedule list                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`agent`] - `FeederAgent` task and its `FeederHandle`
//! - [`commands`] - Intent validation and connection gating
//! - [`config`] - Device address and timing (TOML + environment)
//! - [`error`] - Sync error types
//! - [`protocol`] - Outbound commands and inbound decoding
//! - [`transport`] - WebSocket client with reconnection
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use feeder_sync::{FeederAgent, FeederConfig, NoOpEmitter};
//!
//! let config = FeederConfig::load(None)?;
//! let handle = FeederAgent::start(&config, Arc::new(NoOpEmitter))?;
//!
//! handle.feed_now(50).await?;
//! println!("Fed today: {} g", handle.state().await.today_fed);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod agent;
pub mod commands;
pub mod config;
pub mod error;
pub mod protocol;
pub mod transport;

// =============================================================================
// Re-exports
// =============================================================================

pub use agent::{FeederAgent, FeederEventEmitter, FeederHandle, NoOpEmitter};
pub use commands::CommandSender;
pub use config::FeederConfig;
pub use error::{SyncError, SyncResult};
pub use protocol::{Command, Inbound};
pub use transport::{ConnectionState, Transport, TransportConfig, TransportEvent, TransportHandle};
