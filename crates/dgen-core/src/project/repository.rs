//! Project repository trait.

use super::model::Project;
use crate::error::Result;
use async_trait::async_trait;

/// In-place edit applied by [`ProjectRepository::update`].
pub type ProjectEdit<'a> = Box<dyn FnOnce(&mut Project) -> Result<()> + Send + 'a>;

/// Persistence for [`Project`]s.
///
/// A single `save` is atomic but blind: it replaces whatever another writer
/// stored in between. Read-modify-write changes go through
/// [`update`](ProjectRepository::update), which holds the project's lock
/// across the read and the write, including against other processes.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Finds a project by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Project))`: Project found
    /// - `Ok(None)`: Project not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, project_id: &str) -> Result<Option<Project>>;

    /// Creates or replaces a project.
    async fn save(&self, project: &Project) -> Result<()>;

    /// Applies `edit` to the stored project under the project's lock.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Project))`: The project as written
    /// - `Ok(None)`: Project not found; `edit` was not called
    /// - `Err(_)`: `edit` failed (nothing is written) or storage failed
    async fn update(&self, project_id: &str, edit: ProjectEdit<'_>) -> Result<Option<Project>>;

    /// Deletes a project. Deleting a missing project succeeds.
    async fn delete(&self, project_id: &str) -> Result<()>;

    /// Projects owned by an account, most recently updated first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Project>>;
}
