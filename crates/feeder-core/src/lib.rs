//! # feeder-core: Pure Device-State Logic
//!
//! The local model of a networked pet feeder and the rules for keeping it in
//! step with the device. Nothing in here touches a socket, a timer or the
//! system clock; callers hand the current time in.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Feeder Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 feeder-monitor (UI layer)                       │   │
//! │  │   indicator · readouts · progress · schedules · history         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ intents / snapshots                    │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 feeder-sync (agent + transport)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ DeviceEvent                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ feeder-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  events   │  │   state   │  │ schedule  │  │   │
//! │  │   │DeviceState│  │DeviceEvent│  │StateStore │  │  Editor   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCK • PURE TRANSITIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Device state, schedule entries, history records
//! - [`events`] - Inbound device events as they appear on the wire
//! - [`state`] - The state store and its transitions
//! - [`schedule`] - Local schedule editor
//! - [`validation`] - User input checks (feed amount, schedule time)
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use feeder_core::events::{DeviceEvent, FeedingCompleted, FeedingStarted};
//! use feeder_core::state::StateStore;
//!
//! let at = NaiveDate::from_ymd_opt(2026, 10, 18)
//!     .unwrap()
//!     .and_hms_opt(8, 0, 0)
//!     .unwrap();
//!
//! let mut store = StateStore::new();
//! store.apply(DeviceEvent::FeedingStarted(FeedingStarted { target_weight: Some(50.0) }), at);
//! store.apply(
//!     DeviceEvent::FeedingCompleted(FeedingCompleted {
//!         current_weight: Some(50.0),
//!         amount_fed: Some(48.0),
//!     }),
//!     at,
//! );
//!
//! assert_eq!(store.state().today_fed, 48.0);
//! assert!(store.state().history[0].completed);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod events;
pub mod schedule;
pub mod state;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use events::DeviceEvent;
pub use schedule::ScheduleEditor;
pub use state::{Readouts, Refresh, StateStore};
pub use types::*;
pub use validation::FeedAmount;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Smallest amount (grams) a manual feed may request.
pub const MIN_FEED_GRAMS: u32 = 10;

/// Largest amount (grams) a manual feed may request.
///
/// The device hopper cannot dispense more than this in one cycle.
pub const MAX_FEED_GRAMS: u32 = 200;
