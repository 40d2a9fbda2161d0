//! Push-channel message schema.

use crate::error::{DgenError, ErrorCategory};
use serde::{Deserialize, Serialize};

/// One snapshot of the extracted payload as sent to the client.
///
/// Serialises as `{"payload": .., "isComplete": .., "recordId": ..}`;
/// `recordId` is present only on the terminal message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMessage {
    pub payload: String,
    pub is_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
}

impl SnapshotMessage {
    pub fn partial(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            is_complete: false,
            record_id: None,
        }
    }

    pub fn terminal(payload: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            is_complete: true,
            record_id: Some(record_id.into()),
        }
    }
}

/// Abnormal end of a push channel. Always the last item before close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFailure {
    pub category: ErrorCategory,
    pub message: String,
}

impl From<&DgenError> for StreamFailure {
    fn from(err: &DgenError) -> Self {
        Self {
            category: err.category(),
            message: err.to_string(),
        }
    }
}

/// Item carried by the push channel.
pub type PushItem = std::result::Result<SnapshotMessage, StreamFailure>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_message_omits_record_id() {
        let value = serde_json::to_value(SnapshotMessage::partial("graph TD\n")).unwrap();
        assert_eq!(value, json!({"payload": "graph TD\n", "isComplete": false}));
    }

    #[test]
    fn terminal_message_carries_record_id() {
        let value = serde_json::to_value(SnapshotMessage::terminal("graph TD", "rec-1")).unwrap();
        assert_eq!(
            value,
            json!({"payload": "graph TD", "isComplete": true, "recordId": "rec-1"})
        );
    }

    #[test]
    fn failure_keeps_error_category() {
        let failure = StreamFailure::from(&DgenError::upstream("503 from service"));
        assert_eq!(failure.category, ErrorCategory::Upstream);
        assert!(failure.message.contains("503"));
    }
}
