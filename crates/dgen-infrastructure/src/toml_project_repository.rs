//! TOML-based ProjectRepository implementation

use crate::storage::DocumentDir;
use async_trait::async_trait;
use dgen_core::Result;
use dgen_core::project::{Project, ProjectEdit, ProjectRepository};
use std::path::Path;

/// Stores each project, history included, as `projects/<id>.toml`.
pub struct TomlProjectRepository {
    documents: DocumentDir<Project>,
}

impl TomlProjectRepository {
    pub fn new(projects_dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            documents: DocumentDir::open(projects_dir, "project")?,
        })
    }
}

#[async_trait]
impl ProjectRepository for TomlProjectRepository {
    async fn find_by_id(&self, project_id: &str) -> Result<Option<Project>> {
        self.documents.load(project_id)
    }

    async fn save(&self, project: &Project) -> Result<()> {
        self.documents.save(&project.id, project)
    }

    async fn update(&self, project_id: &str, edit: ProjectEdit<'_>) -> Result<Option<Project>> {
        self.documents
            .file(project_id)?
            .update(|project: &mut Project| -> Result<Project> {
                edit(project)?;
                Ok(project.clone())
            })
    }

    async fn delete(&self, project_id: &str) -> Result<()> {
        self.documents.remove(project_id)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Project>> {
        let mut projects: Vec<_> = self
            .documents
            .load_all()?
            .into_iter()
            .filter(|p| p.is_owned_by(owner_id))
            .collect();
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(projects)
    }
}
