//! Project history entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of entries a project keeps.
pub const HISTORY_CAPACITY: usize = 30;

/// What produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    /// Generated from a prompt.
    Chat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub prompt: String,
    pub diagram: String,
    pub image: String,
    pub update_type: UpdateType,
    pub updated_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn chat(
        id: impl Into<String>,
        prompt: impl Into<String>,
        diagram: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            diagram: diagram.into(),
            image: image.into(),
            update_type: UpdateType::Chat,
            updated_at: Utc::now(),
        }
    }

    /// Entry with a fresh identity.
    pub fn new_chat(
        prompt: impl Into<String>,
        diagram: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self::chat(Uuid::new_v4().to_string(), prompt, diagram, image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_entries_serialize_their_origin() {
        let entry = HistoryEntry::new_chat("p", "graph TD", "");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["update_type"], "chat");

        let unknown = json.to_string().replace("\"chat\"", "\"manual\"");
        assert!(serde_json::from_str::<HistoryEntry>(&unknown).is_err());
    }
}
