//! In-memory repositories.
//!
//! Used by tests and by `dgen` runs that should leave nothing on disk.

use async_trait::async_trait;
use dgen_core::account::{Account, AccountRepository};
use dgen_core::generation::{GenerationRecord, GenerationRepository};
use dgen_core::project::{Project, ProjectEdit, ProjectRepository};
use dgen_core::{DgenError, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryGenerationRepository {
    records: RwLock<HashMap<String, GenerationRecord>>,
}

impl InMemoryGenerationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl GenerationRepository for InMemoryGenerationRepository {
    async fn find_by_id(&self, record_id: &str) -> Result<Option<GenerationRecord>> {
        Ok(self.records.read().await.get(record_id).cloned())
    }

    async fn save(&self, record: &GenerationRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(DgenError::data_access(format!(
                "generation record '{}' already exists",
                record.id
            )));
        }
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, record_id: &str) -> Result<()> {
        self.records.write().await.remove(record_id);
        Ok(())
    }

    async fn list_by_project(&self, project_id: &str) -> Result<Vec<GenerationRecord>> {
        let mut records: Vec<_> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

#[derive(Default)]
pub struct InMemoryProjectRepository {
    projects: RwLock<HashMap<String, Project>>,
}

impl InMemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn find_by_id(&self, project_id: &str) -> Result<Option<Project>> {
        Ok(self.projects.read().await.get(project_id).cloned())
    }

    async fn save(&self, project: &Project) -> Result<()> {
        self.projects
            .write()
            .await
            .insert(project.id.clone(), project.clone());
        Ok(())
    }

    async fn update(&self, project_id: &str, edit: ProjectEdit<'_>) -> Result<Option<Project>> {
        let mut projects = self.projects.write().await;
        let Some(stored) = projects.get_mut(project_id) else {
            return Ok(None);
        };
        let mut edited = stored.clone();
        edit(&mut edited)?;
        *stored = edited.clone();
        Ok(Some(edited))
    }

    async fn delete(&self, project_id: &str) -> Result<()> {
        self.projects.write().await.remove(project_id);
        Ok(())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Project>> {
        let mut projects: Vec<_> = self
            .projects
            .read()
            .await
            .values()
            .filter(|p| p.is_owned_by(owner_id))
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(projects)
    }
}

#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let accounts = accounts
            .into_iter()
            .map(|account| (account.id.clone(), account))
            .collect();
        Self {
            accounts: RwLock::new(accounts),
        }
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_id(&self, account_id: &str) -> Result<Option<Account>> {
        Ok(self.accounts.read().await.get(account_id).cloned())
    }

    async fn save(&self, account: &Account) -> Result<()> {
        self.accounts
            .write()
            .await
            .insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn debit(&self, account_id: &str, cost: i64) -> Result<i64> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(account_id)
            .ok_or_else(|| DgenError::not_found("account", account_id))?;
        account.debit(cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dgen_core::account::USAGE_COST;

    #[tokio::test]
    async fn test_account_debit() {
        let repo = InMemoryAccountRepository::with_accounts([Account::new("a", 1500)]);
        assert_eq!(repo.debit("a", USAGE_COST).await.unwrap(), 500);
        assert!(matches!(
            repo.debit("a", USAGE_COST).await.unwrap_err(),
            DgenError::InsufficientBalance { .. }
        ));
        assert_eq!(repo.find_by_id("a").await.unwrap().unwrap().balance, 500);
    }

    #[tokio::test]
    async fn test_generation_save_rejects_duplicates() {
        let repo = InMemoryGenerationRepository::new();
        let record = GenerationRecord::new("p", "raw", "x", "", "proj");
        repo.save(&record).await.unwrap();
        assert!(repo.save(&record).await.is_err());
        assert_eq!(repo.len().await, 1);
        repo.delete(&record.id).await.unwrap();
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_project_listing_by_owner() {
        let repo = InMemoryProjectRepository::new();
        repo.save(&Project::new("alice", "a")).await.unwrap();
        repo.save(&Project::new("bob", "b")).await.unwrap();
        let listed = repo.list_by_owner("alice").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "a");
    }

    #[tokio::test]
    async fn test_failed_project_update_leaves_project_untouched() {
        let repo = InMemoryProjectRepository::new();
        let project = Project::new("alice", "a");
        repo.save(&project).await.unwrap();

        let result = repo
            .update(
                &project.id,
                Box::new(|p: &mut Project| {
                    p.name = "renamed".to_string();
                    Err(DgenError::validation("rejected"))
                }),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(repo.find_by_id(&project.id).await.unwrap(), Some(project));
        let missing = repo.update("nope", Box::new(|_| Ok(()))).await.unwrap();
        assert!(missing.is_none());
    }
}
