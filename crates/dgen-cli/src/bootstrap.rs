use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use dgen_application::{
    CompletionTransaction, DiagramGenerationUseCase, KeyedLocks, ProjectService,
};
use dgen_core::config::AppConfig;
use dgen_core::diagram::DiagramCatalog;
use dgen_core::generation::FragmentSource;
use dgen_core::secret::SecretService;
use dgen_infrastructure::{
    ConfigService, DgenPaths, SecretServiceImpl, TomlAccountRepository, TomlGenerationRepository,
    TomlProjectRepository,
};
use dgen_interaction::{OpenAIStreamClient, ScriptedFragmentSource};

/// Characters per fragment when replaying a script file.
const SCRIPT_FRAGMENT_CHARS: usize = 12;

/// Everything the commands need, wired from one base directory.
pub struct AppBootstrap {
    pub config: AppConfig,
    pub paths: DgenPaths,
    pub config_service: ConfigService,
    pub generations: Arc<TomlGenerationRepository>,
    pub projects: Arc<TomlProjectRepository>,
    pub accounts: Arc<TomlAccountRepository>,
    project_locks: KeyedLocks,
    account_locks: KeyedLocks,
}

impl AppBootstrap {
    pub fn load(base_dir: Option<&Path>) -> Result<Self> {
        let config = ConfigService::new(DgenPaths::new(base_dir))
            .load_config()
            .context("Failed to load configuration")?;

        // [storage] data_dir may move the data directory
        let paths = DgenPaths::new(base_dir).with_data_dir(config.storage.data_dir.clone());
        let config_service = ConfigService::new(paths.clone());

        let generations = Arc::new(TomlGenerationRepository::new(paths.records_dir()?)?);
        let projects = Arc::new(TomlProjectRepository::new(paths.projects_dir()?)?);
        let accounts = Arc::new(TomlAccountRepository::new(paths.accounts_dir()?)?);

        Ok(Self {
            config,
            paths,
            config_service,
            generations,
            projects,
            accounts,
            project_locks: KeyedLocks::new(),
            account_locks: KeyedLocks::new(),
        })
    }

    pub fn secret_service(&self) -> Result<SecretServiceImpl> {
        Ok(SecretServiceImpl::new(&self.paths)?)
    }

    pub fn project_service(&self) -> ProjectService {
        ProjectService::new(
            self.projects.clone(),
            self.accounts.clone(),
            self.generations.clone(),
        )
        .with_project_locks(self.project_locks.clone())
    }

    /// The OpenAI client, or a scripted replay of `script` when given.
    pub async fn fragment_source(&self, script: Option<&Path>) -> Result<Arc<dyn FragmentSource>> {
        if let Some(script) = script {
            let text = tokio::fs::read_to_string(script)
                .await
                .with_context(|| format!("Failed to read script {:?}", script))?;
            tracing::info!("Replaying script {:?} ({} bytes)", script, text.len());
            return Ok(Arc::new(ScriptedFragmentSource::from_text(
                &text,
                SCRIPT_FRAGMENT_CHARS,
            )));
        }

        let secrets = self.secret_service()?.load_secrets().await?;
        let credentials = secrets.openai.ok_or_else(|| {
            anyhow!(
                "No OpenAI credentials. Run `dgen init` and fill in {:?}, or set OPENAI_API_KEY",
                self.paths.secret_file().ok()
            )
        })?;
        let client = OpenAIStreamClient::new(&credentials, &self.config.generation)?;
        tracing::debug!("Using model {}", client.model());
        Ok(Arc::new(client))
    }

    pub fn catalog(&self) -> Result<DiagramCatalog> {
        Ok(self.config_service.load_catalog()?)
    }

    pub fn generation_usecase(
        &self,
        source: Arc<dyn FragmentSource>,
    ) -> Result<DiagramGenerationUseCase> {
        let completion = CompletionTransaction::new(
            self.generations.clone(),
            self.projects.clone(),
            self.accounts.clone(),
        )
        .with_project_locks(self.project_locks.clone())
        .with_account_locks(self.account_locks.clone());

        Ok(DiagramGenerationUseCase::new(
            Arc::new(self.catalog()?),
            source,
            self.accounts.clone(),
            self.projects.clone(),
            Arc::new(completion),
        )
        .with_pacing(self.config.pacing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dgen_core::account::{Account, AccountRepository};
    use dgen_core::pacing::PacingPolicy;
    use dgen_core::request::GenerationRequest;
    use dgen_execution::GenerationRunner;
    use tempfile::TempDir;

    #[tokio::test]
    async fn scripted_generation_persists_to_the_base_dir() {
        let temp = TempDir::new().unwrap();
        let script = temp.path().join("reply.txt");
        std::fs::write(&script, "Sure:\n```mermaid\ngraph TD\nA-->B\n```\nDone.").unwrap();

        let app = AppBootstrap::load(Some(temp.path())).unwrap();
        app.accounts.save(&Account::new("acct", 3000)).await.unwrap();
        let project = app.project_service().create_project("acct", "demo").await.unwrap();

        let source = app.fragment_source(Some(&script)).await.unwrap();
        let usecase = app
            .generation_usecase(source)
            .unwrap()
            .with_pacing(PacingPolicy::disabled());
        let prepared = usecase
            .prepare("acct", GenerationRequest::new("chain", "flowchart", &project.id))
            .await
            .unwrap();

        let mut handle = GenerationRunner::new(Arc::new(usecase)).spawn(prepared);
        while handle.receiver.recv().await.is_some() {}
        let report = handle.wait().await.unwrap();

        assert_eq!(report.payload, "graph TD\nA-->B");
        assert_eq!(report.remaining_balance, 2000);

        // A fresh bootstrap sees the committed state
        let reloaded = AppBootstrap::load(Some(temp.path())).unwrap();
        let history = reloaded
            .project_service()
            .history("acct", &project.id)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].diagram, "graph TD\nA-->B");
        let account = reloaded.accounts.find_by_id("acct").await.unwrap().unwrap();
        assert_eq!(account.balance, 2000);
    }

    #[tokio::test]
    async fn missing_credentials_are_reported() {
        let temp = TempDir::new().unwrap();
        let app = AppBootstrap::load(Some(temp.path())).unwrap();
        if std::env::var_os("OPENAI_API_KEY").is_some() {
            return;
        }
        assert!(app.fragment_source(None).await.is_err());
    }
}
