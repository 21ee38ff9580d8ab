//! # Terminal Rendering
//!
//! Pure functions from feeder state to display text. Nothing here touches
//! stdout; callers print the returned strings.
//!
//! ```text
//! ● Device online
//! Weight: 25 g    Fed today: 148 g
//! [##########----------]  50%    [ Feeding... ]
//! ```

use feeder_core::{HistoryRecord, Readouts, ScheduleEntry};

/// Width of the progress bar, in cells.
pub const PROGRESS_WIDTH: usize = 20;

/// Online/offline indicator.
pub fn connection_line(connected: bool) -> String {
    if connected {
        "● Device online".to_string()
    } else {
        "○ Device offline".to_string()
    }
}

/// `[#####---------------]`, filled in proportion to `percent`.
pub fn progress_bar(percent: u8, width: usize) -> String {
    let percent = usize::from(percent.min(100));
    let filled = percent * width / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Weight, daily total, progress bar and the feed-now control.
pub fn readouts(readouts: &Readouts) -> String {
    let mut out = format!(
        "Weight: {} g    Fed today: {} g\n",
        readouts.current_weight, readouts.today_fed
    );

    let bar = progress_bar(readouts.progress_percent, PROGRESS_WIDTH);
    if readouts.feeding {
        out.push_str(&format!("{} {:>3}%    ", bar, readouts.progress_percent));
    } else {
        out.push_str(&format!("{}         ", bar));
    }

    if readouts.feed_button_enabled() {
        out.push_str(&format!("[ {} ]", readouts.feed_button_label()));
    } else {
        out.push_str(&format!("[ {} ] (disabled)", readouts.feed_button_label()));
    }

    out
}

/// What the amount column shows for one record.
pub fn history_amount(record: &HistoryRecord) -> String {
    match (record.completed, record.target_amount) {
        (true, _) => format!("{} g", record.amount),
        (false, Some(target)) => format!("target: {} g", target),
        (false, None) => "target: ? g".to_string(),
    }
}

/// Feeding history, newest first.
pub fn history_table(history: &[HistoryRecord]) -> String {
    if history.is_empty() {
        return "History: (no feedings yet)".to_string();
    }

    let mut out = String::from("History:\n");
    out.push_str(&format!("  {:<20} {:<10} {}\n", "When", "Type", "Amount"));
    for record in history {
        out.push_str(&format!(
            "  {:<20} {:<10} {}\n",
            format!("{} {}", record.date, record.time),
            record.kind.to_string(),
            history_amount(record)
        ));
    }
    out.pop();
    out
}

/// Schedule list with ids, for editing.
pub fn schedule_list(entries: &[ScheduleEntry]) -> String {
    if entries.is_empty() {
        return "Schedule: (empty)".to_string();
    }

    let mut out = String::from("Schedule:\n");
    for entry in entries {
        let mark = if entry.enabled { "x" } else { " " };
        out.push_str(&format!(
            "  [{}] {}  {:>4} g   id {}\n",
            mark, entry.time, entry.amount, entry.id
        ));
    }
    out.pop();
    out
}

pub fn help() -> &'static str {
    "Commands:\n\
     \x20 feed <g>            start a manual feeding (10-200 g)\n\
     \x20 add [HH:MM] [g]     add a schedule entry\n\
     \x20 rm <id>             remove a schedule entry\n\
     \x20 time <id> <HH:MM>   change an entry's time\n\
     \x20 amount <id> <g>     change an entry's amount\n\
     \x20 toggle <id>         enable or disable an entry\n\
     \x20 save                send the schedule to the device\n\
     \x20 status              request a status report\n\
     \x20 reconnect           retry now if offline\n\
     \x20 show                redraw everything\n\
     \x20 quit                exit"
}
