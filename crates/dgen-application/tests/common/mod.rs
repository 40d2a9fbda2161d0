// Shared fixture for the integration tests. Each test binary uses a subset.
#![allow(dead_code)]

use dgen_application::{
    CompletionTransaction, DiagramGenerationUseCase, KeyedLocks, PreparedGeneration, SessionReport,
};
use dgen_core::Result;
use dgen_core::account::{Account, AccountRepository};
use dgen_core::diagram::DiagramCatalog;
use dgen_core::generation::{FragmentSource, GenerationRepository};
use dgen_core::message::{PushItem, SnapshotMessage};
use dgen_core::pacing::PacingPolicy;
use dgen_core::project::{Project, ProjectRepository};
use dgen_core::request::GenerationRequest;
use dgen_infrastructure::{
    InMemoryAccountRepository, InMemoryGenerationRepository, InMemoryProjectRepository,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const ACCOUNT: &str = "acct-1";

pub const SCENARIO_A: [&str; 3] = [
    "prefix ```mermaid\ngraph TD\n",
    "A-->B\n",
    "B-->C\n```suffix",
];

pub struct Fixture {
    pub generations: Arc<InMemoryGenerationRepository>,
    pub projects: Arc<InMemoryProjectRepository>,
    pub accounts: Arc<InMemoryAccountRepository>,
    pub project: Project,
}

impl Fixture {
    pub async fn new(balance: i64) -> Self {
        let projects = Arc::new(InMemoryProjectRepository::new());
        let project = Project::new(ACCOUNT, "demo");
        projects.save(&project).await.unwrap();

        Self {
            generations: Arc::new(InMemoryGenerationRepository::new()),
            projects,
            accounts: Arc::new(InMemoryAccountRepository::with_accounts([Account::new(
                ACCOUNT, balance,
            )])),
            project,
        }
    }

    pub fn completion(&self) -> CompletionTransaction {
        CompletionTransaction::new(
            self.generations.clone(),
            self.projects.clone(),
            self.accounts.clone(),
        )
        .with_project_locks(KeyedLocks::new())
    }

    pub fn usecase(&self, source: Arc<dyn FragmentSource>) -> DiagramGenerationUseCase {
        self.usecase_with(source, self.completion())
    }

    pub fn usecase_with(
        &self,
        source: Arc<dyn FragmentSource>,
        completion: CompletionTransaction,
    ) -> DiagramGenerationUseCase {
        DiagramGenerationUseCase::new(
            Arc::new(DiagramCatalog::builtin()),
            source,
            self.accounts.clone(),
            self.projects.clone(),
            Arc::new(completion),
        )
        .with_pacing(PacingPolicy::disabled())
    }

    pub fn request(&self, prompt: &str) -> GenerationRequest {
        GenerationRequest::new(prompt, "flowchart", &self.project.id)
            .with_image("<svg>diagram</svg>")
    }

    pub async fn balance(&self) -> i64 {
        self.accounts.find_by_id(ACCOUNT).await.unwrap().unwrap().balance
    }

    pub async fn stored_project(&self) -> Project {
        self.projects.find_by_id(&self.project.id).await.unwrap().unwrap()
    }

    pub async fn record_count(&self) -> usize {
        self.generations
            .list_by_project(&self.project.id)
            .await
            .unwrap()
            .len()
    }
}

/// Runs one prepared session to completion and drains its channel.
pub async fn run_session(
    usecase: &DiagramGenerationUseCase,
    prepared: PreparedGeneration,
) -> (Result<SessionReport>, Vec<PushItem>) {
    let (tx, mut rx) = mpsc::channel(256);
    let result = usecase.run(prepared, tx, CancellationToken::new()).await;
    let mut items = Vec::new();
    while let Some(item) = rx.recv().await {
        items.push(item);
    }
    (result, items)
}

pub fn snapshots(items: &[PushItem]) -> Vec<SnapshotMessage> {
    items.iter().filter_map(|item| item.clone().ok()).collect()
}

pub fn partial_payloads(items: &[PushItem]) -> Vec<String> {
    snapshots(items)
        .into_iter()
        .filter(|m| !m.is_complete)
        .map(|m| m.payload)
        .collect()
}

pub fn terminals(items: &[PushItem]) -> Vec<SnapshotMessage> {
    snapshots(items).into_iter().filter(|m| m.is_complete).collect()
}
