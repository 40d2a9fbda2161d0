//! Project domain model.

use super::history::{HISTORY_CAPACITY, HistoryEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A project owned by one account.
///
/// `current_diagram` and `current_image` always hold the most recently
/// completed extraction. `history` is newest-first and never longer than
/// [`HISTORY_CAPACITY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub current_diagram: String,
    #[serde(default)]
    pub current_image: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(owner_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            name: name.into(),
            current_diagram: String::new(),
            current_image: String::new(),
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, account_id: &str) -> bool {
        self.owner_id == account_id
    }

    /// Inserts `entry` at the front, evicting the oldest entries past capacity.
    pub fn push_history(&mut self, entry: HistoryEntry) {
        self.history.insert(0, entry);
        self.history.truncate(HISTORY_CAPACITY);
    }

    /// Applies a completed extraction: new history entry plus current snapshot.
    pub fn record_completion(&mut self, entry: HistoryEntry) {
        self.current_diagram = entry.diagram.clone();
        self.current_image = entry.image.clone();
        self.updated_at = entry.updated_at;
        self.push_history(entry);
    }

    /// Takes back a completion made on top of `before`.
    ///
    /// Only the entry with `entry_id` is removed, so completions recorded by
    /// other writers in the meantime survive. The current snapshot goes back
    /// to `before` only while that entry is still the newest one, and entries
    /// it evicted from a full history are put back at the tail.
    pub fn revert_completion(&mut self, entry_id: &str, before: &Project) {
        let Some(position) = self.history.iter().position(|e| e.id == entry_id) else {
            return;
        };
        self.history.remove(position);
        if position == 0 {
            self.current_diagram = before.current_diagram.clone();
            self.current_image = before.current_image.clone();
            self.updated_at = before.updated_at;
        }
        for entry in &before.history {
            if self.history.len() >= HISTORY_CAPACITY {
                break;
            }
            if self.history.iter().all(|e| e.id != entry.id) {
                self.history.push(entry.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::UpdateType;

    #[test]
    fn completion_updates_snapshot_and_history() {
        let mut project = Project::new("acct", "demo");
        project.record_completion(HistoryEntry::chat("r1", "p", "graph TD", "<svg/>"));

        assert_eq!(project.current_diagram, "graph TD");
        assert_eq!(project.current_image, "<svg/>");
        assert_eq!(project.history.len(), 1);
        assert_eq!(project.history[0].update_type, UpdateType::Chat);
    }

    #[test]
    fn history_is_bounded_and_newest_first() {
        let mut project = Project::new("acct", "demo");
        for i in 0..45 {
            let entry = HistoryEntry::chat(format!("r{i}"), "p", format!("d{i}"), "");
            project.record_completion(entry);
        }

        assert_eq!(project.history.len(), HISTORY_CAPACITY);
        let ids: Vec<_> = project.history.iter().map(|e| e.id.as_str()).collect();
        let expected: Vec<_> = (15..45).rev().map(|i| format!("r{i}")).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn full_history_evicts_exactly_the_oldest() {
        let mut project = Project::new("acct", "demo");
        for i in 0..HISTORY_CAPACITY {
            project.push_history(HistoryEntry::chat(format!("r{i}"), "p", "", ""));
        }
        let oldest = project.history.last().unwrap().id.clone();

        project.record_completion(HistoryEntry::chat("newest", "p", "", ""));

        assert_eq!(project.history.len(), HISTORY_CAPACITY);
        assert_eq!(project.history[0].id, "newest");
        assert!(project.history.iter().all(|e| e.id != oldest));
    }

    #[test]
    fn revert_restores_snapshot_and_evicted_entry() {
        let mut project = Project::new("acct", "demo");
        for i in 0..HISTORY_CAPACITY {
            let entry = HistoryEntry::chat(format!("r{i}"), "p", format!("d{i}"), "");
            project.record_completion(entry);
        }
        let before = project.clone();

        project.record_completion(HistoryEntry::chat("newest", "p", "fresh", "<svg/>"));
        project.revert_completion("newest", &before);

        assert_eq!(project, before);
    }

    #[test]
    fn revert_keeps_completions_recorded_afterwards() {
        let mut project = Project::new("acct", "demo");
        project.record_completion(HistoryEntry::chat("r0", "p", "d0", ""));
        let before = project.clone();

        project.record_completion(HistoryEntry::chat("mine", "p", "d-mine", ""));
        project.record_completion(HistoryEntry::chat("theirs", "p", "d-theirs", ""));
        project.revert_completion("mine", &before);

        let ids: Vec<_> = project.history.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["theirs", "r0"]);
        assert_eq!(project.current_diagram, "d-theirs");
    }

    #[test]
    fn revert_of_unknown_entry_changes_nothing() {
        let mut project = Project::new("acct", "demo");
        project.record_completion(HistoryEntry::chat("r0", "p", "d0", ""));
        let before = project.clone();

        project.revert_completion("missing", &Project::new("acct", "demo"));

        assert_eq!(project, before);
    }
}
