//! # Device Events
//!
//! Inbound messages from the feeder, as typed values.
//!
//! ## Wire Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  { "type": "feeding_completed", "currentWeight": 49.5, "amountFed": 48 } │
//! │      │                              │                                   │
//! │      │ selects the variant          └── camelCase fields, all optional │
//! │      ▼                                                                  │
//! │  DeviceEvent::FeedingCompleted(FeedingCompleted { .. })                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every payload field is optional. A missing number counts as 0 and a
//! missing flag as `false` when the event is applied, matching how the
//! firmware omits zero values.
//!
//! Messages whose `type` is not listed in [`DeviceEvent::KINDS`] are not an
//! error; the protocol layer sorts those out before deserializing.

use serde::{Deserialize, Serialize};

use crate::types::ScheduleEntry;

// =============================================================================
// Event Enum
// =============================================================================

/// A message pushed by the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceEvent {
    /// Full status snapshot, usually the answer to `get_status`.
    StatusUpdate(StatusUpdate),

    /// A manual feeding cycle began.
    FeedingStarted(FeedingStarted),

    /// Weight reading during a feeding cycle.
    FeedingProgress(FeedingProgress),

    /// The manual feeding cycle finished.
    FeedingCompleted(FeedingCompleted),

    /// The device ran one of its schedules. Reported after the fact.
    ScheduledFeeding(ScheduledFeeding),

    /// The schedule list currently stored on the device.
    ScheduleConfig(ScheduleConfig),
}

impl DeviceEvent {
    /// Every `type` value this client understands.
    pub const KINDS: [&'static str; 6] = [
        "status_update",
        "feeding_started",
        "feeding_progress",
        "feeding_completed",
        "scheduled_feeding",
        "schedule_config",
    ];

    /// Returns true if `kind` names a known event.
    pub fn is_known_kind(kind: &str) -> bool {
        Self::KINDS.contains(&kind)
    }

    /// The wire `type` of this event (for logging).
    pub fn kind(&self) -> &'static str {
        match self {
            DeviceEvent::StatusUpdate(_) => "status_update",
            DeviceEvent::FeedingStarted(_) => "feeding_started",
            DeviceEvent::FeedingProgress(_) => "feeding_progress",
            DeviceEvent::FeedingCompleted(_) => "feeding_completed",
            DeviceEvent::ScheduledFeeding(_) => "scheduled_feeding",
            DeviceEvent::ScheduleConfig(_) => "schedule_config",
        }
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// `status_update` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusUpdate {
    pub current_weight: Option<f64>,
    pub today_fed: Option<f64>,
    pub feeding: Option<bool>,
    pub target_weight: Option<f64>,
}

/// `feeding_started` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedingStarted {
    pub target_weight: Option<f64>,
}

/// `feeding_progress` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedingProgress {
    pub current_weight: Option<f64>,
}

/// `feeding_completed` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedingCompleted {
    pub current_weight: Option<f64>,
    pub amount_fed: Option<f64>,
}

/// `scheduled_feeding` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduledFeeding {
    pub amount_fed: Option<f64>,
}

/// `schedule_config` payload.
///
/// A missing `schedules` field means an empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleConfig {
    pub schedules: Option<Vec<ReportedSchedule>>,
}

/// One schedule entry as the device reports it.
///
/// The device may omit the id, or send it as a number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportedSchedule {
    pub id: Option<serde_json::Value>,
    pub time: String,
    pub amount: u32,
    pub enabled: bool,
}

impl ReportedSchedule {
    /// Converts to a state entry. A missing id becomes an empty string.
    pub fn into_entry(self) -> ScheduleEntry {
        let id = match self.id {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        ScheduleEntry {
            id,
            time: self.time,
            amount: self.amount,
            enabled: self.enabled,
        }
    }
}
