//! Completions from separate processes sharing one data directory.

use async_trait::async_trait;
use dgen_application::{CompletionInput, CompletionTransaction};
use dgen_core::Result;
use dgen_core::account::{Account, AccountRepository};
use dgen_core::generation::GenerationRepository;
use dgen_core::project::{Project, ProjectEdit, ProjectRepository};
use dgen_core::request::GenerationRequest;
use dgen_infrastructure::{TomlAccountRepository, TomlGenerationRepository, TomlProjectRepository};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const ACCOUNT: &str = "acct-shared";

/// Project repository that stalls after every read, widening the window
/// between a read and the following write.
struct SlowReads {
    inner: TomlProjectRepository,
}

#[async_trait]
impl ProjectRepository for SlowReads {
    async fn find_by_id(&self, project_id: &str) -> Result<Option<Project>> {
        let project = self.inner.find_by_id(project_id).await?;
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(project)
    }

    async fn save(&self, project: &Project) -> Result<()> {
        self.inner.save(project).await
    }

    async fn update(&self, project_id: &str, edit: ProjectEdit<'_>) -> Result<Option<Project>> {
        self.inner.update(project_id, edit).await
    }

    async fn delete(&self, project_id: &str) -> Result<()> {
        self.inner.delete(project_id).await
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Project>> {
        self.inner.list_by_owner(owner_id).await
    }
}

/// Everything one `dgen` process would open, with its own in-process locks.
fn process(root: &Path) -> CompletionTransaction {
    CompletionTransaction::new(
        Arc::new(TomlGenerationRepository::new(root.join("generations")).unwrap()),
        Arc::new(SlowReads {
            inner: TomlProjectRepository::new(root.join("projects")).unwrap(),
        }),
        Arc::new(TomlAccountRepository::new(root.join("accounts")).unwrap()),
    )
}

fn input<'a>(request: &'a GenerationRequest, payload: &'a str) -> CompletionInput<'a> {
    CompletionInput {
        account_id: ACCOUNT,
        request,
        raw_response: "```mermaid\ngraph TD\n```",
        payload,
    }
}

#[tokio::test]
async fn interleaved_commits_keep_both_history_entries() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let projects = TomlProjectRepository::new(root.join("projects")).unwrap();
    let accounts = TomlAccountRepository::new(root.join("accounts")).unwrap();
    let project = Project::new(ACCOUNT, "shared");
    projects.save(&project).await.unwrap();
    accounts.save(&Account::new(ACCOUNT, 5000)).await.unwrap();

    let first = process(root);
    let second = process(root);
    let request_a = GenerationRequest::new("first", "flowchart", &project.id);
    let request_b = GenerationRequest::new("second", "flowchart", &project.id);

    let (a, b) = tokio::join!(
        first.commit(input(&request_a, "graph TD\nA-->B\n")),
        second.commit(input(&request_b, "graph LR\nC-->D\n")),
    );
    a.unwrap();
    b.unwrap();

    let stored = projects.find_by_id(&project.id).await.unwrap().unwrap();
    let mut prompts: Vec<_> = stored.history.iter().map(|e| e.prompt.as_str()).collect();
    prompts.sort_unstable();
    assert_eq!(prompts, ["first", "second"]);
    assert_eq!(stored.current_diagram, stored.history[0].diagram);

    let balance = accounts.find_by_id(ACCOUNT).await.unwrap().unwrap().balance;
    assert_eq!(balance, 3000);
    let records = TomlGenerationRepository::new(root.join("generations"))
        .unwrap()
        .list_by_project(&project.id)
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
}
