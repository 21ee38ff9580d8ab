//! # Terminal Emitter
//!
//! Prints agent events as they happen and keeps the schedule editor in step
//! with what the device reports.

use std::sync::{Arc, Mutex};

use feeder_core::{HistoryRecord, Readouts, ScheduleEditor, ScheduleEntry};
use feeder_sync::FeederEventEmitter;
use tracing::debug;

use crate::render;

/// [`FeederEventEmitter`] that renders to stdout.
pub struct TerminalEmitter {
    editor: Arc<Mutex<ScheduleEditor>>,
}

impl TerminalEmitter {
    pub fn new(editor: Arc<Mutex<ScheduleEditor>>) -> Self {
        Self { editor }
    }
}

impl FeederEventEmitter for TerminalEmitter {
    fn emit_connection(&self, connected: bool) {
        println!("{}", render::connection_line(connected));
    }

    fn emit_readouts(&self, readouts: &Readouts) {
        println!("{}", render::readouts(readouts));
    }

    fn emit_history(&self, history: &[HistoryRecord]) {
        println!("{}", render::history_table(history));
    }

    fn emit_schedules(&self, schedules: &[ScheduleEntry]) {
        // Device report replaces any unsaved local edits.
        if let Ok(mut editor) = self.editor.lock() {
            editor.load(schedules, crate::now_millis());
            debug!(entries = editor.len(), "Schedule editor reloaded");
            println!("{}", render::schedule_list(editor.entries()));
        }
    }
}
