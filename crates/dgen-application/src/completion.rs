//! The completion transaction.
//!
//! Runs once per session, after the closing delimiter. Steps, in order:
//!
//! 1. save a new [`GenerationRecord`]
//! 2. prepend a chat history entry to the project (bounded ring)
//! 3. overwrite the project's current diagram and image
//! 4. save the project
//! 5. debit the account by the usage cost
//!
//! The project and account are locked (in that order) for the whole
//! sequence. Steps 2-4 run as one [`ProjectRepository::update`], so they
//! also hold the storage lock that other processes take. When a step fails,
//! earlier steps are undone: a failed project save deletes the record, a
//! failed debit takes this session's history entry back out of the project
//! and deletes the record.

use crate::locks::KeyedLocks;
use dgen_core::account::{AccountRepository, USAGE_COST};
use dgen_core::generation::{GenerationRecord, GenerationRepository};
use dgen_core::project::{HistoryEntry, Project, ProjectRepository};
use dgen_core::request::GenerationRequest;
use dgen_core::{DgenError, Result};
use std::sync::Arc;

/// What a session hands to the transaction.
#[derive(Debug, Clone)]
pub struct CompletionInput<'a> {
    pub account_id: &'a str,
    pub request: &'a GenerationRequest,
    /// All fragments received
    pub raw_response: &'a str,
    /// Extracted payload, untrimmed
    pub payload: &'a str,
}

#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub record: GenerationRecord,
    pub remaining_balance: i64,
}

pub struct CompletionTransaction {
    generations: Arc<dyn GenerationRepository>,
    projects: Arc<dyn ProjectRepository>,
    accounts: Arc<dyn AccountRepository>,
    project_locks: KeyedLocks,
    account_locks: KeyedLocks,
    cost: i64,
}

impl CompletionTransaction {
    pub fn new(
        generations: Arc<dyn GenerationRepository>,
        projects: Arc<dyn ProjectRepository>,
        accounts: Arc<dyn AccountRepository>,
    ) -> Self {
        Self {
            generations,
            projects,
            accounts,
            project_locks: KeyedLocks::new(),
            account_locks: KeyedLocks::new(),
            cost: USAGE_COST,
        }
    }

    /// Shares project locks with other writers (e.g. project deletion).
    pub fn with_project_locks(mut self, locks: KeyedLocks) -> Self {
        self.project_locks = locks;
        self
    }

    pub fn with_account_locks(mut self, locks: KeyedLocks) -> Self {
        self.account_locks = locks;
        self
    }

    pub fn cost(&self) -> i64 {
        self.cost
    }

    pub async fn commit(&self, input: CompletionInput<'_>) -> Result<CompletionOutcome> {
        let request = input.request;
        let project_id = request.project_id.as_str();
        let account_id = input.account_id;
        let _project_guard = self.project_locks.lock(project_id).await;
        let _account_guard = self.account_locks.lock(account_id).await;

        self.projects
            .find_by_id(project_id)
            .await?
            .filter(|project| project.is_owned_by(account_id))
            .ok_or_else(|| DgenError::not_found("project", project_id))?;

        let record = GenerationRecord::new(
            &request.prompt,
            input.raw_response,
            input.payload,
            &request.client_image,
            project_id,
        );
        self.generations.save(&record).await?;
        tracing::debug!(
            target: "completion",
            "Saved generation record {} (image: {}...)",
            record.id,
            dgen_core::request::preview(&record.image, 100)
        );

        let entry = HistoryEntry::new_chat(
            &record.prompt,
            &record.extracted_payload,
            &record.image,
        );
        let entry_id = entry.id.clone();
        let mut before = None;
        let applied = self
            .projects
            .update(
                project_id,
                Box::new(|project: &mut Project| {
                    if !project.is_owned_by(account_id) {
                        return Err(DgenError::not_found("project", project_id));
                    }
                    before = Some(project.clone());
                    project.record_completion(entry);
                    Ok(())
                }),
            )
            .await;

        let (project, before) = match (applied, before) {
            (Ok(Some(project)), Some(before)) => (project, before),
            (Ok(_), _) => {
                tracing::error!(
                    target: "completion",
                    "Project {} disappeared before saving",
                    project_id
                );
                self.discard_record(&record.id).await;
                return Err(DgenError::not_found("project", project_id));
            }
            (Err(err), _) => {
                tracing::error!(
                    target: "completion",
                    "Failed to save project {}: {}",
                    project_id,
                    err
                );
                self.discard_record(&record.id).await;
                return Err(err);
            }
        };

        let remaining_balance = match self.accounts.debit(account_id, self.cost).await {
            Ok(balance) => balance,
            Err(err) => {
                tracing::error!(
                    target: "completion",
                    "Failed to debit account {}: {}",
                    account_id,
                    err
                );
                self.revert_project(project_id, &entry_id, &before).await;
                self.discard_record(&record.id).await;
                return Err(err);
            }
        };

        tracing::info!(
            target: "completion",
            "Committed record {} for project {} (history: {}, balance: {})",
            record.id,
            project.id,
            project.history.len(),
            remaining_balance
        );

        Ok(CompletionOutcome {
            record,
            remaining_balance,
        })
    }

    async fn discard_record(&self, record_id: &str) {
        if let Err(err) = self.generations.delete(record_id).await {
            tracing::error!(
                target: "completion",
                "Rollback failed: could not delete generation record {}: {}",
                record_id,
                err
            );
        }
    }

    async fn revert_project(&self, project_id: &str, entry_id: &str, before: &Project) {
        let reverted = self
            .projects
            .update(
                project_id,
                Box::new(|project: &mut Project| {
                    project.revert_completion(entry_id, before);
                    Ok(())
                }),
            )
            .await;
        if let Err(err) = reverted {
            tracing::error!(
                target: "completion",
                "Rollback failed: could not revert project {}: {}",
                project_id,
                err
            );
        }
    }
}
