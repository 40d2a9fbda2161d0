//! Diagram-type catalog.
//!
//! The catalog is loaded once at startup and handed to whoever builds
//! prompts or validates requests.

mod catalog;

pub use catalog::{DiagramCatalog, DiagramDefinition, PromptTemplates};
