//! # Input Commands
//!
//! Parses one line of user input into an [`InputCommand`].
//!
//! ## Command Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Monitor Commands                                 │
//! │                                                                         │
//! │  feed <g>              - Start a manual feeding (10-200 g)             │
//! │  add [HH:MM] [g]       - Add a schedule entry (08:00 / 50 g default)   │
//! │  rm <id>               - Remove a schedule entry                       │
//! │  time <id> <HH:MM>     - Change an entry's time                        │
//! │  amount <id> <g>       - Change an entry's amount                      │
//! │  toggle <id>           - Enable/disable an entry                       │
//! │  save                  - Send the edited list to the device            │
//! │  status                - Ask the device for a fresh status report      │
//! │  reconnect             - Retry now instead of waiting out the delay    │
//! │  show                  - Redraw everything                             │
//! │  help                  - List commands                                 │
//! │  quit                  - Exit                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use feeder_core::validation::{parse_schedule_amount, parse_schedule_time};
use feeder_core::{FeedAmount, ValidationError};
use thiserror::Error;

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Feed(FeedAmount),
    Add {
        time: Option<String>,
        amount: Option<u32>,
    },
    Remove(String),
    SetTime {
        id: String,
        time: String,
    },
    SetAmount {
        id: String,
        amount: u32,
    },
    Toggle(String),
    Save,
    Status,
    Reconnect,
    Show,
    Help,
    Quit,
}

/// Why a line could not be turned into a command.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("{0}")]
    Invalid(#[from] ValidationError),
}

/// Parses a line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<InputCommand>, InputError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("feed", [grams]) => InputCommand::Feed(FeedAmount::parse(grams)?),
        ("feed", _) => return Err(InputError::Usage("feed <grams>")),

        ("add", []) => InputCommand::Add {
            time: None,
            amount: None,
        },
        ("add", [time]) => InputCommand::Add {
            time: Some(parse_schedule_time(time)?),
            amount: None,
        },
        ("add", [time, amount]) => InputCommand::Add {
            time: Some(parse_schedule_time(time)?),
            amount: Some(parse_schedule_amount(amount)?),
        },
        ("add", _) => return Err(InputError::Usage("add [HH:MM] [grams]")),

        ("rm", [id]) => InputCommand::Remove(id.to_string()),
        ("rm", _) => return Err(InputError::Usage("rm <id>")),

        ("time", [id, time]) => InputCommand::SetTime {
            id: id.to_string(),
            time: parse_schedule_time(time)?,
        },
        ("time", _) => return Err(InputError::Usage("time <id> <HH:MM>")),

        ("amount", [id, amount]) => InputCommand::SetAmount {
            id: id.to_string(),
            amount: parse_schedule_amount(amount)?,
        },
        ("amount", _) => return Err(InputError::Usage("amount <id> <grams>")),

        ("toggle", [id]) => InputCommand::Toggle(id.to_string()),
        ("toggle", _) => return Err(InputError::Usage("toggle <id>")),

        ("save", []) => InputCommand::Save,
        ("status", []) => InputCommand::Status,
        ("reconnect", []) => InputCommand::Reconnect,
        ("show", []) => InputCommand::Show,
        ("help" | "?", []) => InputCommand::Help,
        ("quit" | "exit" | "q", []) => InputCommand::Quit,

        _ => return Err(InputError::Unknown(verb.to_string())),
    };

    Ok(Some(command))
}
