//! # State Store
//!
//! Owns the [`DeviceState`] snapshot and applies device events to it.
//!
//! ## Transition Table
//! ```text
//! ┌──────────────────────┬──────────────────────────────────────┬──────────────────┐
//! │ Event                │ Effect                               │ Refresh          │
//! ├──────────────────────┼──────────────────────────────────────┼──────────────────┤
//! │ status_update        │ replace weight/total/feeding/target  │ Readouts         │
//! │ feeding_started      │ feeding=on, open manual record       │ Readouts History │
//! │ feeding_progress     │ current weight                       │ Readouts         │
//! │ feeding_completed    │ feeding=off, total += fed, close rec │ Readouts History │
//! │ scheduled_feeding    │ total += fed, add closed record      │ Readouts History │
//! │ schedule_config      │ replace schedule list                │ Schedules        │
//! └──────────────────────┴──────────────────────────────────────┴──────────────────┘
//! ```
//!
//! The open manual record is tracked by id in `pending_record`, so
//! completing it never needs a scan for "the incomplete one". There is at
//! most one open record at any time.
//!
//! Every call runs to completion on `&mut self`; a caller that reads the
//! state afterwards always sees the whole transition.

use chrono::NaiveDateTime;
use serde::Serialize;
use ts_rs::TS;

use crate::events::{
    DeviceEvent, FeedingCompleted, FeedingProgress, FeedingStarted, ScheduleConfig,
    ScheduledFeeding, StatusUpdate,
};
use crate::types::{DeviceState, FeedingKind, HistoryRecord, ScheduleEntry};

/// Date format of history records.
pub const HISTORY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Time format of history records.
pub const HISTORY_TIME_FORMAT: &str = "%H:%M:%S";

// =============================================================================
// Refresh Hints
// =============================================================================

/// Which part of the UI a transition invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Refresh {
    /// Online/offline indicator.
    Connection,
    /// Weight, today's total, progress bar, feed button.
    Readouts,
    /// History table.
    History,
    /// Schedule list.
    Schedules,
}

// =============================================================================
// Readouts
// =============================================================================

/// Everything the live readout panel shows, derived from the state.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Readouts {
    pub current_weight: f64,
    pub today_fed: f64,
    /// 0..=100, always 0 when idle.
    pub progress_percent: u8,
    pub feeding: bool,
}

impl Readouts {
    /// Derives the readouts from a state snapshot.
    pub fn from_state(state: &DeviceState) -> Self {
        Readouts {
            current_weight: state.current_weight,
            today_fed: state.today_fed,
            progress_percent: progress_percent(state),
            feeding: state.feeding,
        }
    }

    /// The feed-now control is disabled while a cycle runs.
    pub fn feed_button_enabled(&self) -> bool {
        !self.feeding
    }

    /// Caption for the feed-now control.
    pub fn feed_button_label(&self) -> &'static str {
        if self.feeding {
            "Feeding..."
        } else {
            "Feed now"
        }
    }
}

/// current / target as a whole percentage, clamped to 0..=100.
///
/// Zero when not feeding or when there is no positive target.
pub fn progress_percent(state: &DeviceState) -> u8 {
    if !state.feeding || state.target_weight <= 0.0 {
        return 0;
    }

    let percent = (state.current_weight / state.target_weight * 100.0).round();
    if percent.is_nan() {
        return 0;
    }
    percent.clamp(0.0, 100.0) as u8
}

// =============================================================================
// Record Ids
// =============================================================================

/// Largest id [`IdSequence::observe`] will follow.
pub const MAX_TRACKED_ID: u64 = i64::MAX as u64;

/// Millisecond-timestamp ids that stay unique when two records share a
/// millisecond.
#[derive(Debug, Clone, Default)]
pub struct IdSequence {
    last: u64,
}

impl IdSequence {
    /// Next id at `millis`: the timestamp, or one past the previous id.
    pub fn next(&mut self, millis: i64) -> u64 {
        let candidate = u64::try_from(millis).unwrap_or(0);
        let id = candidate.max(self.last.saturating_add(1));
        self.last = id;
        id
    }

    /// Ensures later ids are greater than `id`.
    ///
    /// Ids past the millisecond-timestamp range cannot have come from this
    /// sequence and are not tracked.
    pub fn observe(&mut self, id: u64) {
        if id <= MAX_TRACKED_ID {
            self.last = self.last.max(id);
        }
    }
}

/// Milliseconds of a local timestamp, used only as an id source.
pub fn millis_of(at: NaiveDateTime) -> i64 {
    at.and_utc().timestamp_millis()
}

// =============================================================================
// State Store
// =============================================================================

/// The single owner of the device state.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    state: DeviceState,
    pending_record: Option<u64>,
    ids: IdSequence,
}

impl StateStore {
    /// Fresh store: disconnected, zeros, no schedules, no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the state.
    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Id of the manual feeding record still waiting for completion.
    pub fn pending_record(&self) -> Option<u64> {
        self.pending_record
    }

    /// Derived readouts for the current state.
    pub fn readouts(&self) -> Readouts {
        Readouts::from_state(&self.state)
    }

    /// Records transport liveness.
    pub fn set_connected(&mut self, connected: bool) -> Vec<Refresh> {
        self.state.connected = connected;
        vec![Refresh::Connection]
    }

    /// Optimistically replaces the schedule list after a local save.
    ///
    /// Final from the client's point of view: nothing rolls it back.
    pub fn replace_schedules(&mut self, schedules: Vec<ScheduleEntry>) {
        self.state.schedules = schedules;
    }

    /// Applies one device event. `at` is the local receive time.
    pub fn apply(&mut self, event: DeviceEvent, at: NaiveDateTime) -> Vec<Refresh> {
        match event {
            DeviceEvent::StatusUpdate(e) => self.on_status_update(e),
            DeviceEvent::FeedingStarted(e) => self.on_feeding_started(e, at),
            DeviceEvent::FeedingProgress(e) => self.on_feeding_progress(e),
            DeviceEvent::FeedingCompleted(e) => self.on_feeding_completed(e),
            DeviceEvent::ScheduledFeeding(e) => self.on_scheduled_feeding(e, at),
            DeviceEvent::ScheduleConfig(e) => self.on_schedule_config(e),
        }
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    fn on_status_update(&mut self, e: StatusUpdate) -> Vec<Refresh> {
        // Full replace: the device's numbers win, even a lower total.
        self.state.current_weight = e.current_weight.unwrap_or(0.0);
        self.state.today_fed = e.today_fed.unwrap_or(0.0);
        self.state.feeding = e.feeding.unwrap_or(false);
        self.state.target_weight = e.target_weight.unwrap_or(0.0);
        vec![Refresh::Readouts]
    }

    fn on_feeding_started(&mut self, e: FeedingStarted, at: NaiveDateTime) -> Vec<Refresh> {
        // A start without a completion for the previous cycle: that cycle's
        // amount is never coming, close it so only one record stays open.
        if let Some(stale) = self.pending_record.take() {
            if let Some(record) = self.find_record(stale) {
                record.completed = true;
            }
        }

        self.state.feeding = true;
        self.state.target_weight = e.target_weight.unwrap_or(0.0);

        let id = self.push_record(at, FeedingKind::Manual, 0.0, e.target_weight, false);
        self.pending_record = Some(id);

        vec![Refresh::Readouts, Refresh::History]
    }

    fn on_feeding_progress(&mut self, e: FeedingProgress) -> Vec<Refresh> {
        self.state.current_weight = e.current_weight.unwrap_or(0.0);
        vec![Refresh::Readouts]
    }

    fn on_feeding_completed(&mut self, e: FeedingCompleted) -> Vec<Refresh> {
        let amount = e.amount_fed.unwrap_or(0.0);

        self.state.feeding = false;
        self.state.current_weight = e.current_weight.unwrap_or(0.0);
        self.state.today_fed += amount;

        let Some(id) = self.pending_record.take() else {
            return vec![Refresh::Readouts];
        };

        if let Some(record) = self.find_record(id) {
            record.amount = amount;
            record.completed = true;
        }

        vec![Refresh::Readouts, Refresh::History]
    }

    fn on_scheduled_feeding(&mut self, e: ScheduledFeeding, at: NaiveDateTime) -> Vec<Refresh> {
        let amount = e.amount_fed.unwrap_or(0.0);

        self.push_record(at, FeedingKind::Scheduled, amount, None, true);
        self.state.today_fed += amount;

        vec![Refresh::Readouts, Refresh::History]
    }

    fn on_schedule_config(&mut self, e: ScheduleConfig) -> Vec<Refresh> {
        self.state.schedules = e
            .schedules
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.into_entry())
            .collect();
        vec![Refresh::Schedules]
    }

    // -------------------------------------------------------------------------
    // History Helpers
    // -------------------------------------------------------------------------

    fn push_record(
        &mut self,
        at: NaiveDateTime,
        kind: FeedingKind,
        amount: f64,
        target_amount: Option<f64>,
        completed: bool,
    ) -> u64 {
        let id = self.ids.next(millis_of(at));

        // Newest first.
        self.state.history.insert(
            0,
            HistoryRecord {
                id,
                date: at.format(HISTORY_DATE_FORMAT).to_string(),
                time: at.format(HISTORY_TIME_FORMAT).to_string(),
                kind,
                amount,
                target_amount,
                completed,
            },
        );

        id
    }

    fn find_record(&mut self, id: u64) -> Option<&mut HistoryRecord> {
        self.state.history.iter_mut().find(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ReportedSchedule;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn started(target: f64) -> DeviceEvent {
        DeviceEvent::FeedingStarted(FeedingStarted {
            target_weight: Some(target),
        })
    }

    fn completed(fed: f64) -> DeviceEvent {
        DeviceEvent::FeedingCompleted(FeedingCompleted {
            current_weight: Some(fed),
            amount_fed: Some(fed),
        })
    }

    fn scheduled(fed: f64) -> DeviceEvent {
        DeviceEvent::ScheduledFeeding(ScheduledFeeding {
            amount_fed: Some(fed),
        })
    }

    fn incomplete_count(store: &StateStore) -> usize {
        store
            .state()
            .history
            .iter()
            .filter(|r| !r.completed)
            .count()
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = StateStore::new();
        assert_eq!(store.state(), &DeviceState::default());
        assert_eq!(store.pending_record(), None);
    }

    #[test]
    fn test_started_then_completed_yields_one_record() {
        let mut store = StateStore::new();

        let refresh = store.apply(started(50.0), at(8, 0, 0));
        assert_eq!(refresh, vec![Refresh::Readouts, Refresh::History]);
        assert!(store.state().feeding);
        assert_eq!(store.state().target_weight, 50.0);
        assert_eq!(incomplete_count(&store), 1);

        store.apply(completed(48.0), at(8, 0, 30));

        let history = &store.state().history;
        assert_eq!(history.len(), 1);
        assert!(history[0].completed);
        assert_eq!(history[0].amount, 48.0);
        assert_eq!(history[0].target_amount, Some(50.0));
        assert_eq!(history[0].kind, FeedingKind::Manual);
        assert_eq!(history[0].date, "2026-10-18");
        assert_eq!(history[0].time, "08:00:00");
        assert!(!store.state().feeding);
        assert_eq!(store.pending_record(), None);
    }

    #[test]
    fn test_completed_without_pending_leaves_history_alone() {
        let mut store = StateStore::new();
        store.apply(scheduled(20.0), at(7, 0, 0));

        let refresh = store.apply(completed(30.0), at(7, 5, 0));

        assert_eq!(refresh, vec![Refresh::Readouts]);
        assert_eq!(store.state().history.len(), 1);
        assert_eq!(store.state().today_fed, 50.0);
    }

    #[test]
    fn test_today_fed_is_sum_of_amounts() {
        let mut store = StateStore::new();
        let events = vec![
            scheduled(30.0),
            started(50.0),
            DeviceEvent::FeedingProgress(FeedingProgress {
                current_weight: Some(20.0),
            }),
            completed(45.5),
            completed(10.0),
            scheduled(25.0),
        ];

        let mut expected = 0.0;
        for (i, event) in events.into_iter().enumerate() {
            match &event {
                DeviceEvent::FeedingCompleted(e) => expected += e.amount_fed.unwrap_or(0.0),
                DeviceEvent::ScheduledFeeding(e) => expected += e.amount_fed.unwrap_or(0.0),
                _ => {}
            }
            store.apply(event, at(9, 0, i as u32));
            assert_eq!(store.state().today_fed, expected);
            assert!(incomplete_count(&store) <= 1);
        }

        assert_eq!(store.state().today_fed, 110.5);
    }

    #[test]
    fn test_second_start_closes_stale_record() {
        let mut store = StateStore::new();
        store.apply(started(50.0), at(8, 0, 0));
        store.apply(started(80.0), at(8, 1, 0));

        let history = &store.state().history;
        assert_eq!(history.len(), 2);
        assert_eq!(incomplete_count(&store), 1);
        assert!(!history[0].completed);
        assert_eq!(history[0].target_amount, Some(80.0));
        assert!(history[1].completed);
        assert_eq!(history[1].amount, 0.0);

        store.apply(completed(79.0), at(8, 2, 0));
        assert_eq!(store.state().history[0].amount, 79.0);
        assert_eq!(incomplete_count(&store), 0);
    }

    #[test]
    fn test_records_in_same_second_get_distinct_ids() {
        let mut store = StateStore::new();
        store.apply(scheduled(10.0), at(12, 0, 0));
        store.apply(scheduled(10.0), at(12, 0, 0));

        let history = &store.state().history;
        assert_ne!(history[0].id, history[1].id);
        assert!(history[0].id > history[1].id);
    }

    #[test]
    fn test_id_sequence_ignores_out_of_range_ids() {
        let mut ids = IdSequence::default();
        ids.observe(u64::MAX);
        assert_eq!(ids.next(1000), 1000);

        let mut ids = IdSequence { last: u64::MAX };
        assert_eq!(ids.next(1000), u64::MAX);
    }

    #[test]
    fn test_status_update_replaces_with_zero_defaults() {
        let mut store = StateStore::new();
        store.apply(
            DeviceEvent::StatusUpdate(StatusUpdate {
                current_weight: Some(12.0),
                today_fed: Some(100.0),
                feeding: Some(true),
                target_weight: Some(40.0),
            }),
            at(10, 0, 0),
        );
        assert_eq!(store.state().today_fed, 100.0);
        assert!(store.state().feeding);

        store.apply(
            DeviceEvent::StatusUpdate(StatusUpdate {
                current_weight: Some(5.0),
                ..Default::default()
            }),
            at(10, 0, 1),
        );
        let state = store.state();
        assert_eq!(state.current_weight, 5.0);
        assert_eq!(state.today_fed, 0.0);
        assert!(!state.feeding);
        assert_eq!(state.target_weight, 0.0);
    }

    #[test]
    fn test_progress_only_touches_weight() {
        let mut store = StateStore::new();
        store.apply(started(50.0), at(8, 0, 0));
        let refresh = store.apply(
            DeviceEvent::FeedingProgress(FeedingProgress {
                current_weight: Some(25.0),
            }),
            at(8, 0, 5),
        );
        assert_eq!(refresh, vec![Refresh::Readouts]);
        assert!(store.state().feeding);
        assert_eq!(store.state().current_weight, 25.0);
        assert_eq!(store.readouts().progress_percent, 50);
    }

    #[test]
    fn test_schedule_config_replaces_list() {
        let mut store = StateStore::new();
        store.replace_schedules(vec![ScheduleEntry {
            id: "old".into(),
            time: "06:00".into(),
            amount: 20,
            enabled: true,
        }]);

        let reported = vec![
            ReportedSchedule {
                id: Some(serde_json::json!("1")),
                time: "08:00".into(),
                amount: 50,
                enabled: true,
            },
            ReportedSchedule {
                id: Some(serde_json::json!("2")),
                time: "18:00".into(),
                amount: 60,
                enabled: false,
            },
        ];
        let refresh = store.apply(
            DeviceEvent::ScheduleConfig(ScheduleConfig {
                schedules: Some(reported.clone()),
            }),
            at(9, 0, 0),
        );

        assert_eq!(refresh, vec![Refresh::Schedules]);
        let expected: Vec<ScheduleEntry> =
            reported.into_iter().map(|s| s.into_entry()).collect();
        assert_eq!(store.state().schedules, expected);

        store.apply(
            DeviceEvent::ScheduleConfig(ScheduleConfig::default()),
            at(9, 0, 1),
        );
        assert!(store.state().schedules.is_empty());
    }

    #[test]
    fn test_set_connected() {
        let mut store = StateStore::new();
        assert_eq!(store.set_connected(true), vec![Refresh::Connection]);
        assert!(store.state().connected);
        store.set_connected(false);
        assert!(!store.state().connected);
    }

    #[test]
    fn test_progress_percent_edges() {
        let mut state = DeviceState {
            feeding: true,
            target_weight: 0.0,
            current_weight: 10.0,
            ..Default::default()
        };
        assert_eq!(progress_percent(&state), 0);

        state.target_weight = 40.0;
        state.current_weight = 60.0;
        assert_eq!(progress_percent(&state), 100);

        state.current_weight = -5.0;
        assert_eq!(progress_percent(&state), 0);

        state.current_weight = 10.0;
        assert_eq!(progress_percent(&state), 25);

        state.feeding = false;
        assert_eq!(progress_percent(&state), 0);
    }

    #[test]
    fn test_feed_button_follows_feeding() {
        let mut store = StateStore::new();
        assert!(store.readouts().feed_button_enabled());
        store.apply(started(50.0), at(8, 0, 0));
        let readouts = store.readouts();
        assert!(!readouts.feed_button_enabled());
        assert_eq!(readouts.feed_button_label(), "Feeding...");
    }
}
