//! # Schedule Editor
//!
//! The local, not-yet-saved schedule list the user edits.
//!
//! ```text
//!   schedule_config ──► load() ──► ScheduleEditor ◄── add / remove / edit
//!                                        │
//!                                        │ entries() on save
//!                                        ▼
//!                        StateStore::replace_schedules + set_schedule
//! ```
//!
//! Nothing here is range-checked: an amount of 0 or 5000 is kept and sent
//! as-is. Only the shape of the input (integer, HH:MM) is enforced by the
//! input layer.

use crate::error::{CoreError, CoreResult};
use crate::state::IdSequence;
use crate::types::{ScheduleDraft, ScheduleEntry};

/// Entries shown before the device has reported its own list.
pub fn default_drafts() -> Vec<ScheduleDraft> {
    vec![
        ScheduleDraft::new("08:00", 50, true),
        ScheduleDraft::new("12:00", 50, true),
        ScheduleDraft::new("18:00", 50, true),
    ]
}

/// Editable copy of the schedule list.
#[derive(Debug, Clone, Default)]
pub struct ScheduleEditor {
    entries: Vec<ScheduleEntry>,
    ids: IdSequence,
}

impl ScheduleEditor {
    /// Empty editor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Editor seeded with `drafts`, ids taken from `now_millis`.
    pub fn with_defaults(drafts: &[ScheduleDraft], now_millis: i64) -> Self {
        let mut editor = Self::new();
        for draft in drafts {
            editor.add(draft.clone(), now_millis);
        }
        editor
    }

    /// Entries in display order.
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends an entry with a fresh timestamp id and returns the id.
    pub fn add(&mut self, draft: ScheduleDraft, now_millis: i64) -> String {
        let id = self.ids.next(now_millis).to_string();
        self.entries.push(draft.into_entry(id.clone()));
        id
    }

    /// Removes an entry.
    pub fn remove(&mut self, id: &str) -> CoreResult<ScheduleEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| CoreError::ScheduleNotFound(id.to_string()))?;
        Ok(self.entries.remove(index))
    }

    pub fn set_time(&mut self, id: &str, time: &str) -> CoreResult<()> {
        self.entry_mut(id)?.time = time.to_string();
        Ok(())
    }

    pub fn set_amount(&mut self, id: &str, amount: u32) -> CoreResult<()> {
        self.entry_mut(id)?.amount = amount;
        Ok(())
    }

    /// Flips `enabled` and returns the new value.
    pub fn toggle(&mut self, id: &str) -> CoreResult<bool> {
        let entry = self.entry_mut(id)?;
        entry.enabled = !entry.enabled;
        Ok(entry.enabled)
    }

    /// Replaces the editor contents with a device-reported list.
    ///
    /// Device ids are kept. Entries that arrived without one get a fresh
    /// local id so they can still be edited and removed.
    pub fn load(&mut self, schedules: &[ScheduleEntry], now_millis: i64) {
        for id in schedules.iter().filter_map(|s| s.id.parse::<u64>().ok()) {
            self.ids.observe(id);
        }

        self.entries = schedules
            .iter()
            .map(|s| {
                let mut entry = s.clone();
                if entry.id.is_empty() {
                    entry.id = self.ids.next(now_millis).to_string();
                }
                entry
            })
            .collect();
    }

    fn entry_mut(&mut self, id: &str) -> CoreResult<&mut ScheduleEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| CoreError::ScheduleNotFound(id.to_string()))
    }
}
