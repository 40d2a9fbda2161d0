//! Project management for an account.

use crate::locks::KeyedLocks;
use dgen_core::account::{Account, AccountRepository};
use dgen_core::generation::{GenerationRecord, GenerationRepository};
use dgen_core::project::{HistoryEntry, Project, ProjectRepository};
use dgen_core::{DgenError, Result};
use std::sync::Arc;

/// Create, list, inspect and delete projects on behalf of an account.
///
/// A project that exists but belongs to someone else is reported as not
/// found.
pub struct ProjectService {
    projects: Arc<dyn ProjectRepository>,
    accounts: Arc<dyn AccountRepository>,
    generations: Arc<dyn GenerationRepository>,
    project_locks: KeyedLocks,
}

impl ProjectService {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        accounts: Arc<dyn AccountRepository>,
        generations: Arc<dyn GenerationRepository>,
    ) -> Self {
        Self {
            projects,
            accounts,
            generations,
            project_locks: KeyedLocks::new(),
        }
    }

    /// Serializes deletion with in-flight completions on the same project.
    pub fn with_project_locks(mut self, locks: KeyedLocks) -> Self {
        self.project_locks = locks;
        self
    }

    pub async fn create_project(&self, account_id: &str, name: &str) -> Result<Project> {
        self.require_account(account_id).await?;
        if name.trim().is_empty() {
            return Err(DgenError::validation("project name must not be empty"));
        }

        let project = Project::new(account_id, name.trim());
        self.projects.save(&project).await?;
        tracing::info!("Created project {} ({}) for {}", project.id, project.name, account_id);
        Ok(project)
    }

    pub async fn list_projects(&self, account_id: &str) -> Result<Vec<Project>> {
        self.require_account(account_id).await?;
        self.projects.list_by_owner(account_id).await
    }

    pub async fn get_project(&self, account_id: &str, project_id: &str) -> Result<Project> {
        self.require_account(account_id).await?;
        self.owned_project(account_id, project_id).await
    }

    /// History entries, newest first.
    pub async fn history(&self, account_id: &str, project_id: &str) -> Result<Vec<HistoryEntry>> {
        Ok(self.get_project(account_id, project_id).await?.history)
    }

    /// Stored generation records for the project, newest first.
    pub async fn records(
        &self,
        account_id: &str,
        project_id: &str,
    ) -> Result<Vec<GenerationRecord>> {
        self.get_project(account_id, project_id).await?;
        self.generations.list_by_project(project_id).await
    }

    /// Deletes a project owned by the account. Its generation records stay.
    pub async fn delete_project(&self, account_id: &str, project_id: &str) -> Result<()> {
        self.require_account(account_id).await?;
        let _guard = self.project_locks.lock(project_id).await;
        self.owned_project(account_id, project_id).await?;
        self.projects.delete(project_id).await?;
        tracing::info!("Deleted project {} for {}", project_id, account_id);
        Ok(())
    }

    async fn require_account(&self, account_id: &str) -> Result<Account> {
        if account_id.trim().is_empty() {
            return Err(DgenError::Unauthorized("missing account identity".to_string()));
        }
        self.accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| DgenError::not_found("account", account_id))
    }

    async fn owned_project(&self, account_id: &str, project_id: &str) -> Result<Project> {
        self.projects
            .find_by_id(project_id)
            .await?
            .filter(|project| project.is_owned_by(account_id))
            .ok_or_else(|| DgenError::not_found("project", project_id))
    }
}
