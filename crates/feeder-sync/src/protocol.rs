//! # Feeder Protocol Messages
//!
//! JSON text frames exchanged with the feeder.
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Feeder Protocol Messages                           │
//! │                                                                         │
//! │  ON CONNECT                                                            │
//! │  ──────────                                                            │
//! │  Client ───► get_status                                                │
//! │  Device ◄─── status_update { currentWeight, todayFed, feeding, ... }   │
//! │                                                                         │
//! │  MANUAL FEEDING                                                        │
//! │  ──────────────                                                        │
//! │  Client ───► feed_now { amount }                                       │
//! │  Device ◄─── feeding_started { targetWeight }                          │
//! │  Device ◄─── feeding_progress { currentWeight }      (0..n times)      │
//! │  Device ◄─── feeding_completed { currentWeight, amountFed }            │
//! │                                                                         │
//! │  SCHEDULES                                                             │
//! │  ─────────                                                             │
//! │  Client ───► set_schedule { schedules: [{id, time, amount, enabled}] } │
//! │  Device ◄─── schedule_config { schedules: [...] }                      │
//! │  Device ◄─── scheduled_feeding { amountFed }         (device-driven)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! Internally tagged JSON, one message per text frame:
//! ```json
//! { "type": "feed_now", "amount": 50 }
//! ```
//!
//! There is no acknowledgement, sequence number or version field. Unknown
//! inbound `type` values are skipped so newer firmware can add messages.

use feeder_core::{DeviceEvent, FeedAmount, ScheduleEntry};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Outbound Commands
// =============================================================================

/// A message from the client to the feeder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Ask for a `status_update`.
    GetStatus,

    /// Start a manual feeding cycle.
    FeedNow {
        /// Grams, 10..=200.
        amount: u32,
    },

    /// Replace the device's schedule list.
    SetSchedule { schedules: Vec<ScheduleEntry> },
}

impl Command {
    /// Returns the wire `type` of this command.
    pub fn type_name(&self) -> &'static str {
        match self {
            Command::GetStatus => "get_status",
            Command::FeedNow { .. } => "feed_now",
            Command::SetSchedule { .. } => "set_schedule",
        }
    }

    /// Feed-now with an already validated amount.
    pub fn feed_now(amount: FeedAmount) -> Self {
        Command::FeedNow {
            amount: amount.grams(),
        }
    }

    /// Schedule upload. Entries are sent exactly as given.
    pub fn set_schedule(schedules: Vec<ScheduleEntry>) -> Self {
        Command::SetSchedule { schedules }
    }

    /// Serializes to the JSON text sent in one frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses a command (used by device simulators).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// =============================================================================
// Inbound Decoding
// =============================================================================

/// Result of decoding one inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// A message this client knows how to apply.
    Event(DeviceEvent),

    /// Well-formed message with a `type` this client does not know.
    Unknown(String),
}

/// Decodes an inbound text frame.
///
/// ## Errors
/// - Not JSON, or a known `type` with badly typed fields →
///   [`SyncError::DeserializationFailed`]
/// - JSON without a string `type` → [`SyncError::InvalidMessage`]
///
/// Unknown types are not an error.
pub fn decode(text: &str) -> SyncResult<Inbound> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| SyncError::DeserializationFailed(e.to_string()))?;

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| SyncError::InvalidMessage("missing \"type\" field".to_string()))?;

    if !DeviceEvent::is_known_kind(kind) {
        return Ok(Inbound::Unknown(kind.to_string()));
    }

    serde_json::from_value(value)
        .map(Inbound::Event)
        .map_err(|e| SyncError::DeserializationFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use feeder_core::events::{FeedingStarted, ScheduledFeeding};

    #[test]
    fn test_command_serialization() {
        assert_eq!(Command::GetStatus.to_json().unwrap(), r#"{"type":"get_status"}"#);

        let amount = FeedAmount::new(50).unwrap();
        assert_eq!(
            Command::feed_now(amount).to_json().unwrap(),
            r#"{"type":"feed_now","amount":50}"#
        );
    }

    #[test]
    fn test_set_schedule_passes_entries_through() {
        let cmd = Command::set_schedule(vec![ScheduleEntry {
            id: "1790000000000".into(),
            time: "08:00".into(),
            amount: 5000,
            enabled: false,
        }]);

        let json: Value = serde_json::from_str(&cmd.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "set_schedule");
        assert_eq!(json["schedules"][0]["id"], "1790000000000");
        assert_eq!(json["schedules"][0]["amount"], 5000);
        assert_eq!(json["schedules"][0]["enabled"], false);
        assert_eq!(cmd.type_name(), "set_schedule");
    }

    #[test]
    fn test_command_round_trip_for_simulator() {
        let cmd = Command::from_json(r#"{"type":"feed_now","amount":75}"#).unwrap();
        assert_eq!(cmd, Command::FeedNow { amount: 75 });
    }

    #[test]
    fn test_decode_known_event() {
        let inbound = decode(r#"{"type":"feeding_started","targetWeight":50}"#).unwrap();
        assert_eq!(
            inbound,
            Inbound::Event(DeviceEvent::FeedingStarted(FeedingStarted {
                target_weight: Some(50.0)
            }))
        );

        let inbound = decode(r#"{"type":"scheduled_feeding","amountFed":30}"#).unwrap();
        assert_eq!(
            inbound,
            Inbound::Event(DeviceEvent::ScheduledFeeding(ScheduledFeeding {
                amount_fed: Some(30.0)
            }))
        );
    }

    #[test]
    fn test_decode_unknown_type() {
        let inbound = decode(r#"{"type":"battery_low","level":5}"#).unwrap();
        assert_eq!(inbound, Inbound::Unknown("battery_low".into()));
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(
            decode("not json"),
            Err(SyncError::DeserializationFailed(_))
        ));
        assert!(matches!(
            decode(r#"{"currentWeight":1}"#),
            Err(SyncError::InvalidMessage(_))
        ));
        assert!(matches!(
            decode(r#"{"type":"feeding_progress","currentWeight":"heavy"}"#),
            Err(SyncError::DeserializationFailed(_))
        ));
    }
}
