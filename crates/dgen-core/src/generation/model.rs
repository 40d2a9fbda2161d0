//! GenerationRecord domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The stored result of one completed extraction. Never modified after it
/// is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub id: String,
    /// Prompt text as the user entered it
    pub prompt: String,
    /// Every fragment the service returned, concatenated
    pub raw_response: String,
    /// Extracted payload, trimmed
    pub extracted_payload: String,
    /// Client-supplied rendered image
    pub image: String,
    pub project_id: String,
    pub created_at: DateTime<Utc>,
}

impl GenerationRecord {
    pub fn new(
        prompt: impl Into<String>,
        raw_response: impl Into<String>,
        extracted_payload: &str,
        image: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            prompt: prompt.into(),
            raw_response: raw_response.into(),
            extracted_payload: extracted_payload.trim().to_string(),
            image: image.into(),
            project_id: project_id.into(),
            created_at: Utc::now(),
        }
    }
}
