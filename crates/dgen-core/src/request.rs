//! Inbound generation request.

use serde::{Deserialize, Serialize};

/// A request to generate one diagram for a project.
///
/// The account identity travels separately; it is established by whoever
/// routes the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub diagram_type: String,
    pub project_id: String,
    /// Rendered image supplied by the client, stored as-is (usually SVG markup).
    #[serde(default)]
    pub client_image: String,
}

impl GenerationRequest {
    pub fn new(
        prompt: impl Into<String>,
        diagram_type: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            diagram_type: diagram_type.into(),
            project_id: project_id.into(),
            client_image: String::new(),
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.client_image = image.into();
        self
    }

    /// Image shortened for log output.
    pub fn image_preview(&self) -> &str {
        preview(&self.client_image, 100)
    }
}

/// Longest prefix of `text` that is at most `max` bytes and ends on a char
/// boundary.
pub fn preview(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
