//! # Validation Module
//!
//! Checks applied to user input before anything is sent to the device.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Input widget / terminal parser                               │
//! │  ├── Integer parsing for amounts                                       │
//! │  └── HH:MM shape for schedule times                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  └── Feed amount range (MIN_FEED_GRAMS..=MAX_FEED_GRAMS)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Device firmware                                              │
//! │  └── Whatever it enforces; the client never sees a rejection           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Schedule entries are NOT range-checked at save time. Whatever the editor
//! holds is sent as-is.
//!
//! ## Usage
//! ```rust
//! use feeder_core::validation::FeedAmount;
//!
//! assert!(FeedAmount::new(50).is_ok());
//! assert!(FeedAmount::new(5).is_err());
//! assert!(FeedAmount::parse("abc").is_err());
//! ```

use crate::error::ValidationError;
use crate::{MAX_FEED_GRAMS, MIN_FEED_GRAMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Feed Amount
// =============================================================================

/// A manual feed amount that has passed the range check.
///
/// The only way to build a `feed_now` command is through this type, so an
/// out-of-range amount cannot reach the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FeedAmount(u32);

impl FeedAmount {
    /// Validates a gram amount.
    ///
    /// ## Rules
    /// - Must be between 10 and 200 inclusive
    pub fn new(grams: i64) -> ValidationResult<Self> {
        let min = i64::from(MIN_FEED_GRAMS);
        let max = i64::from(MAX_FEED_GRAMS);

        if !(min..=max).contains(&grams) {
            return Err(ValidationError::OutOfRange {
                field: "amount".to_string(),
                min,
                max,
            });
        }

        // Range check above keeps this within u32.
        Ok(FeedAmount(grams as u32))
    }

    /// Parses and validates text typed by the user.
    pub fn parse(input: &str) -> ValidationResult<Self> {
        let input = input.trim();

        if input.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let grams = input
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: "must be a whole number of grams".to_string(),
            })?;

        Self::new(grams)
    }

    /// Grams as sent on the wire.
    pub fn grams(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for FeedAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} g", self.0)
    }
}

// =============================================================================
// Schedule Input
// =============================================================================

/// Checks a schedule time has the `HH:MM` shape of a time input widget.
///
/// Returns the normalized (zero-padded) string.
pub fn parse_schedule_time(input: &str) -> ValidationResult<String> {
    let input = input.trim();

    if input.is_empty() {
        return Err(ValidationError::Required {
            field: "time".to_string(),
        });
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "time".to_string(),
        reason: "expected HH:MM".to_string(),
    };

    let (hours, minutes) = input.split_once(':').ok_or_else(invalid)?;
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;

    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    Ok(format!("{:02}:{:02}", hours, minutes))
}

/// Parses a schedule amount as the number widget would: any integer.
pub fn parse_schedule_amount(input: &str) -> ValidationResult<u32> {
    input
        .trim()
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: "must be a whole number of grams".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_amount_bounds() {
        assert!(FeedAmount::new(10).is_ok());
        assert!(FeedAmount::new(200).is_ok());
        assert!(FeedAmount::new(9).is_err());
        assert!(FeedAmount::new(201).is_err());
        assert!(FeedAmount::new(-50).is_err());
    }

    #[test]
    fn test_feed_amount_out_of_range_notice() {
        let err = FeedAmount::new(250).unwrap_err();
        assert_eq!(err.to_string(), "amount must be between 10 and 200");
    }

    #[test]
    fn test_feed_amount_parse() {
        assert_eq!(FeedAmount::parse(" 50 ").unwrap().grams(), 50);
        assert!(matches!(
            FeedAmount::parse(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            FeedAmount::parse("lots"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            FeedAmount::parse("5"),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_feed_amount_rejects_fractions() {
        // No truncation: "50.5" is not silently sent as 50.
        assert!(matches!(
            FeedAmount::parse("50.5"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(FeedAmount::parse("50g").is_err());
    }

    #[test]
    fn test_parse_schedule_time() {
        assert_eq!(parse_schedule_time("8:05").unwrap(), "08:05");
        assert_eq!(parse_schedule_time("18:00").unwrap(), "18:00");
        assert!(parse_schedule_time("24:00").is_err());
        assert!(parse_schedule_time("noon").is_err());
        assert!(parse_schedule_time("").is_err());
    }

    #[test]
    fn test_schedule_amount_not_range_checked() {
        assert_eq!(parse_schedule_amount("500").unwrap(), 500);
        assert!(parse_schedule_amount("-1").is_err());
    }
}
