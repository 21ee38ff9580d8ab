//! # Domain Types
//!
//! The client's view of the feeder.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌───────────────────────────────────────────────────────────────────┐ │
//! │  │ DeviceState                                                       │ │
//! │  │  connected · current_weight · today_fed · target_weight · feeding │ │
//! │  │                                                                   │ │
//! │  │  schedules ──► [ScheduleEntry]     history ──► [HistoryRecord]    │ │
//! │  └───────────────────────────────────────────────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────────┐   ┌─────────────────┐   │
//! │  │ ScheduleEntry   │   │ HistoryRecord       │   │ FeedingKind     │   │
//! │  │  id (opaque)    │   │  id (timestamp)     │   │  Manual         │   │
//! │  │  time "HH:MM"   │   │  date · time        │   │  Scheduled      │   │
//! │  │  amount (g)     │   │  amount · target    │   └─────────────────┘   │
//! │  │  enabled        │   │  completed          │                         │
//! │  └─────────────────┘   └─────────────────────┘                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Weights reported by the scale are `f64` grams. Amounts the user asks for
//! (feed now, schedule amount) are whole grams.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Device State
// =============================================================================

/// Snapshot of everything the client knows about the feeder.
///
/// Created once with zero/empty defaults, never persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DeviceState {
    /// Whether the WebSocket to the device is open.
    pub connected: bool,

    /// Latest measured bowl weight in grams.
    pub current_weight: f64,

    /// Grams dispensed today.
    pub today_fed: f64,

    /// Goal weight of the feeding in progress. Meaningful only while `feeding`.
    pub target_weight: f64,

    /// Whether a feeding cycle is running.
    pub feeding: bool,

    /// Configured feeding schedule.
    pub schedules: Vec<ScheduleEntry>,

    /// Feeding history, newest first.
    pub history: Vec<HistoryRecord>,
}

// =============================================================================
// Schedule Entry
// =============================================================================

/// A time-of-day rule for automatic feeding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScheduleEntry {
    /// Opaque identifier. Timestamp-based when created locally.
    pub id: String,

    /// Time of day, "HH:MM".
    pub time: String,

    /// Grams to dispense.
    pub amount: u32,

    /// Whether the device should act on this entry.
    pub enabled: bool,
}

/// A schedule entry that has not been given an id yet.
///
/// Used for editor defaults and config-file seed entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDraft {
    /// Time of day, "HH:MM".
    #[serde(default = "default_schedule_time")]
    pub time: String,

    /// Grams to dispense.
    #[serde(default = "default_schedule_amount")]
    pub amount: u32,

    /// Whether the entry starts enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_schedule_time() -> String {
    "08:00".to_string()
}

fn default_schedule_amount() -> u32 {
    50
}

fn default_enabled() -> bool {
    true
}

impl ScheduleDraft {
    /// Creates a draft with the given values.
    pub fn new(time: &str, amount: u32, enabled: bool) -> Self {
        ScheduleDraft {
            time: time.to_string(),
            amount,
            enabled,
        }
    }

    /// Attaches an id, producing a full entry.
    pub fn into_entry(self, id: String) -> ScheduleEntry {
        ScheduleEntry {
            id,
            time: self.time,
            amount: self.amount,
            enabled: self.enabled,
        }
    }
}

impl Default for ScheduleDraft {
    fn default() -> Self {
        ScheduleDraft {
            time: default_schedule_time(),
            amount: default_schedule_amount(),
            enabled: default_enabled(),
        }
    }
}

// =============================================================================
// History
// =============================================================================

/// What triggered a feeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum FeedingKind {
    /// Started by a feed-now command.
    Manual,
    /// Fired by the device's own schedule.
    Scheduled,
}

impl std::fmt::Display for FeedingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedingKind::Manual => write!(f, "manual"),
            FeedingKind::Scheduled => write!(f, "scheduled"),
        }
    }
}

/// One logged feeding.
///
/// A manual feeding is logged incomplete when it starts and finalized in
/// place when the device reports how much was dispensed. Scheduled feedings
/// are only reported once finished, so they are logged complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HistoryRecord {
    /// Millisecond timestamp of creation, unique within a session.
    pub id: u64,

    /// Local date, "YYYY-MM-DD".
    pub date: String,

    /// Local time, "HH:MM:SS".
    pub time: String,

    /// Manual or scheduled.
    #[serde(rename = "type")]
    pub kind: FeedingKind,

    /// Grams actually dispensed (0 until completed).
    pub amount: f64,

    /// Goal weight for a manual feeding.
    pub target_amount: Option<f64>,

    /// Whether the dispensed amount is known.
    pub completed: bool,
}
