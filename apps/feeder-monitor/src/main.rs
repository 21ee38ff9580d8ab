//! # Feeder Monitor Entry Point
//!
//! Terminal client for a networked pet feeder.
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Feeder Monitor                                 │
//! │                                                                         │
//! │   stdin ──► input::parse_line ──► InputCommand                         │
//! │                                        │                                │
//! │                  ┌─────────────────────┼───────────────────┐           │
//! │                  ▼                     ▼                   ▼            │
//! │         ScheduleEditor          FeederHandle          render::*        │
//! │         (local edits)     (feed, save, status,       (show, help)      │
//! │                                reconnect)                               │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                      FeederAgent ──► TerminalEmitter ──► stdout         │
//! │                                                                         │
//! │   Logs go to stderr; stdout carries only the rendered UI.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (stderr)
//! 2. Load configuration (first argument, `$FEEDER_CONFIG`, or default path)
//! 3. Seed the schedule editor with the configured defaults
//! 4. Start the feeder agent
//! 5. Read commands until `quit`, end of input or Ctrl-C

mod emitter;
mod input;
mod render;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use feeder_core::{ScheduleDraft, ScheduleEditor};
use feeder_sync::{FeederAgent, FeederConfig, FeederHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use emitter::TerminalEmitter;
use input::{parse_line, InputCommand};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = FeederConfig::load(config_path)?;

    let editor = Arc::new(Mutex::new(ScheduleEditor::with_defaults(
        &config.schedule.defaults,
        now_millis(),
    )));

    let handle = FeederAgent::start(&config, Arc::new(TerminalEmitter::new(editor.clone())))?;
    info!(url = %config.endpoint_url()?, "Feeder monitor started");

    println!("{}", render::connection_line(false));
    println!("{}", render::help());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };

        let Some(line) = line else { break };

        match parse_line(&line) {
            Ok(Some(InputCommand::Quit)) => break,
            Ok(Some(command)) => run_command(&handle, &editor, command).await,
            Ok(None) => {}
            Err(e) => println!("! {}", e),
        }
    }

    info!("Stopping feeder monitor");
    handle.shutdown().await?;
    Ok(())
}

/// Sets up tracing with an env filter, writing to stderr.
///
/// Default: `info,feeder_sync=debug,feeder_core=debug`, override with
/// `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,feeder_sync=debug,feeder_core=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Wall-clock milliseconds, used for schedule ids.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

async fn run_command(handle: &FeederHandle, editor: &Mutex<ScheduleEditor>, command: InputCommand) {
    let result = match command {
        InputCommand::Feed(amount) => handle
            .feed_now(i64::from(amount.grams()))
            .await
            .map(|_| format!("Feeding {}", amount)),

        InputCommand::Save => {
            let entries = match editor.lock() {
                Ok(editor) => editor.entries().to_vec(),
                Err(_) => return,
            };
            handle
                .save_schedule(entries)
                .await
                .map(|_| "Schedule sent".to_string())
        }

        InputCommand::Status => handle
            .request_status()
            .await
            .map(|_| "Status requested".to_string()),

        InputCommand::Reconnect => handle
            .reconnect()
            .await
            .map(|_| "Reconnecting".to_string()),

        InputCommand::Show => {
            let state = handle.state().await;
            println!(
                "{}  (link: {})",
                render::connection_line(state.connected),
                handle.connection_state().await
            );
            println!("{}", render::readouts(&handle.readouts().await));
            if let Ok(editor) = editor.lock() {
                println!("{}", render::schedule_list(editor.entries()));
            }
            println!("{}", render::history_table(&state.history));
            return;
        }

        InputCommand::Help => {
            println!("{}", render::help());
            return;
        }

        edit => {
            edit_schedule(editor, edit);
            return;
        }
    };

    match result {
        Ok(message) => println!("{}", message),
        Err(e) => {
            if !e.is_user_error() {
                warn!(error = %e, "Command failed");
            }
            println!("! {}", e);
        }
    }
}

/// Applies a local schedule edit. Nothing is sent until `save`.
fn edit_schedule(editor: &Mutex<ScheduleEditor>, command: InputCommand) {
    let Ok(mut editor) = editor.lock() else {
        return;
    };

    let result = match command {
        InputCommand::Add { time, amount } => {
            let mut draft = ScheduleDraft::default();
            if let Some(time) = time {
                draft.time = time;
            }
            if let Some(amount) = amount {
                draft.amount = amount;
            }
            let id = editor.add(draft, now_millis());
            Ok(format!("Added entry {}", id))
        }
        InputCommand::Remove(id) => editor.remove(&id).map(|e| format!("Removed {}", e.id)),
        InputCommand::SetTime { id, time } => editor
            .set_time(&id, &time)
            .map(|_| format!("{} at {}", id, time)),
        InputCommand::SetAmount { id, amount } => editor
            .set_amount(&id, amount)
            .map(|_| format!("{} now {} g", id, amount)),
        InputCommand::Toggle(id) => editor.toggle(&id).map(|enabled| {
            format!("{} {}", id, if enabled { "enabled" } else { "disabled" })
        }),
        _ => return,
    };

    match result {
        Ok(message) => {
            println!("{}", message);
            println!("{}", render::schedule_list(editor.entries()));
        }
        Err(e) => println!("! {}", e),
    }
}
