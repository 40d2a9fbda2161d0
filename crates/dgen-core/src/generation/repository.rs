//! Generation record repository trait.

use super::model::GenerationRecord;
use crate::error::Result;
use async_trait::async_trait;

/// Persistence for [`GenerationRecord`]s.
#[async_trait]
pub trait GenerationRepository: Send + Sync {
    async fn find_by_id(&self, record_id: &str) -> Result<Option<GenerationRecord>>;

    /// Stores a new record. Records are immutable, so saving an id that
    /// already exists is an error.
    async fn save(&self, record: &GenerationRecord) -> Result<()>;

    /// Removes a record. Deleting a missing record succeeds.
    ///
    /// Used to undo a save when a later completion step fails.
    async fn delete(&self, record_id: &str) -> Result<()>;

    /// Records belonging to a project, newest first.
    async fn list_by_project(&self, project_id: &str) -> Result<Vec<GenerationRecord>>;
}
