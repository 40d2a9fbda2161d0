//! Server-sent-event framing of push-channel items.

use dgen_core::Result;
use dgen_core::message::PushItem;

/// Renders one item as a single event frame.
///
/// Snapshots become `data: <json>\n\n`; a failure is sent as an `error`
/// event so clients can tell it apart from a snapshot.
pub fn frame(item: &PushItem) -> Result<String> {
    match item {
        Ok(message) => Ok(format!("data: {}\n\n", serde_json::to_string(message)?)),
        Err(failure) => Ok(format!(
            "event: error\ndata: {}\n\n",
            serde_json::to_string(failure)?
        )),
    }
}
