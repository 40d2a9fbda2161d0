//! Diagram generation use case.
//!
//! [`DiagramGenerationUseCase::prepare`] runs every precondition check before
//! any streaming resource exists. [`DiagramGenerationUseCase::run`] then
//! drives one session: fragments in, snapshots out, completion at the
//! closing delimiter.

use crate::completion::{CompletionInput, CompletionTransaction};
use crate::emitter::SnapshotEmitter;
use crate::prompt::{PromptBuilder, RenderedPrompt};
use dgen_core::account::AccountRepository;
use dgen_core::diagram::DiagramCatalog;
use dgen_core::extraction::{ExtractionEvent, ExtractionSession, StreamOutcome};
use dgen_core::generation::FragmentSource;
use dgen_core::message::PushItem;
use dgen_core::pacing::PacingPolicy;
use dgen_core::project::ProjectRepository;
use dgen_core::request::GenerationRequest;
use dgen_core::{DgenError, Result};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A request that passed every precondition.
#[derive(Debug, Clone)]
pub struct PreparedGeneration {
    pub account_id: String,
    pub request: GenerationRequest,
    pub prompt: RenderedPrompt,
}

/// Summary of a session that committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub record_id: String,
    /// Trimmed payload as stored
    pub payload: String,
    pub partial_messages: usize,
    pub remaining_balance: i64,
}

pub struct DiagramGenerationUseCase {
    prompts: PromptBuilder,
    source: Arc<dyn FragmentSource>,
    accounts: Arc<dyn AccountRepository>,
    projects: Arc<dyn ProjectRepository>,
    completion: Arc<CompletionTransaction>,
    pacing: PacingPolicy,
}

impl DiagramGenerationUseCase {
    pub fn new(
        catalog: Arc<DiagramCatalog>,
        source: Arc<dyn FragmentSource>,
        accounts: Arc<dyn AccountRepository>,
        projects: Arc<dyn ProjectRepository>,
        completion: Arc<CompletionTransaction>,
    ) -> Self {
        Self {
            prompts: PromptBuilder::new(catalog),
            source,
            accounts,
            projects,
            completion,
            pacing: PacingPolicy::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: PacingPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    /// Checks, in order: identity, required fields, diagram type, account,
    /// balance, project ownership. Renders the prompts on success.
    pub async fn prepare(
        &self,
        account_id: &str,
        request: GenerationRequest,
    ) -> Result<PreparedGeneration> {
        if account_id.trim().is_empty() {
            return Err(DgenError::Unauthorized("missing account identity".to_string()));
        }
        if request.prompt.trim().is_empty() {
            return Err(DgenError::validation("prompt must not be empty"));
        }
        if request.project_id.trim().is_empty() {
            return Err(DgenError::validation("project id must not be empty"));
        }

        let prompt = self.prompts.render(&request.diagram_type, &request.prompt)?;

        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| DgenError::not_found("account", account_id))?;
        account.ensure_affordable(self.completion.cost())?;

        self.projects
            .find_by_id(&request.project_id)
            .await?
            .filter(|project| project.is_owned_by(account_id))
            .ok_or_else(|| DgenError::not_found("project", &request.project_id))?;

        tracing::debug!(
            target: "generation",
            "Prepared {} generation for project {} (image: {}...)",
            request.diagram_type,
            request.project_id,
            request.image_preview()
        );

        Ok(PreparedGeneration {
            account_id: account_id.to_string(),
            request,
            prompt,
        })
    }

    /// Drives one session to its end.
    ///
    /// Every outcome other than `Ok` has already been reported on `tx` as a
    /// failure item (unless the receiver is gone). `tx` is dropped on return,
    /// which closes the channel.
    pub async fn run(
        &self,
        prepared: PreparedGeneration,
        tx: mpsc::Sender<PushItem>,
        cancel: CancellationToken,
    ) -> Result<SessionReport> {
        let mut emitter = SnapshotEmitter::new(tx, self.pacing, cancel.clone());
        match self.stream_session(&prepared, &mut emitter, &cancel).await {
            Ok(report) => Ok(report),
            Err(err) => {
                let project_id = &prepared.request.project_id;
                if err.is_cancelled() {
                    tracing::info!(
                        target: "generation",
                        "Session for project {} cancelled",
                        project_id
                    );
                } else {
                    tracing::warn!(
                        target: "generation",
                        "Session for project {} failed: {}",
                        project_id,
                        err
                    );
                }
                emitter.fail(&err).await;
                Err(err)
            }
        }
    }

    async fn stream_session(
        &self,
        prepared: &PreparedGeneration,
        emitter: &mut SnapshotEmitter,
        cancel: &CancellationToken,
    ) -> Result<SessionReport> {
        let mut fragments = tokio::select! {
            _ = cancel.cancelled() => return Err(DgenError::Cancelled("session cancelled".to_string())),
            opened = self.source.open(&prepared.prompt.system, &prepared.prompt.user) => opened?,
        };
        tracing::info!(
            target: "generation",
            "Streaming {} diagram from {} for project {}",
            prepared.request.diagram_type,
            self.source.name(),
            prepared.request.project_id
        );

        let mut session = ExtractionSession::new();
        let payload = 'stream: loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DgenError::Cancelled("session cancelled".to_string())),
                next = fragments.next() => next,
            };

            let fragment = match next {
                Some(Ok(fragment)) => fragment,
                Some(Err(err)) => return Err(err),
                None => {
                    return Err(match session.finish() {
                        StreamOutcome::NoDiagram => {
                            DgenError::Incomplete("response contained no diagram".to_string())
                        }
                        StreamOutcome::Unterminated => DgenError::Incomplete(
                            "stream ended before the diagram was closed".to_string(),
                        ),
                        StreamOutcome::Completed => {
                            DgenError::internal("stream completed without a closing event")
                        }
                    });
                }
            };

            for event in session.feed(&fragment) {
                match event {
                    ExtractionEvent::Opened => {
                        tracing::debug!(target: "generation", "Opening delimiter found");
                        emitter.settle_after_open().await?;
                    }
                    ExtractionEvent::Flushed { payload } => {
                        emitter.emit_partial(&payload).await?;
                    }
                    ExtractionEvent::Closed { payload } => break 'stream payload,
                }
            }
        };

        // Past the closing delimiter nothing is cancellable.
        drop(fragments);
        emitter.settle_before_completion().await;

        let outcome = self
            .completion
            .commit(CompletionInput {
                account_id: &prepared.account_id,
                request: &prepared.request,
                raw_response: session.raw(),
                payload: &payload,
            })
            .await?;

        if let Err(err) = emitter
            .emit_terminal(&outcome.record.extracted_payload, &outcome.record.id)
            .await
        {
            tracing::warn!(
                target: "generation",
                "Record {} committed but the terminal message was not delivered: {}",
                outcome.record.id,
                err
            );
        }

        Ok(SessionReport {
            record_id: outcome.record.id,
            payload: outcome.record.extracted_payload,
            partial_messages: emitter.partials_sent(),
            remaining_balance: outcome.remaining_balance,
        })
    }
}
