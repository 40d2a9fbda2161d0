//! Spawns generation sessions onto the tokio runtime.

use dgen_application::{DiagramGenerationUseCase, PreparedGeneration, SessionReport};
use dgen_core::message::PushItem;
use dgen_core::{DgenError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Capacity of each session's push channel. A slow client applies
/// backpressure to the session once this many messages are queued.
pub const CHANNEL_CAPACITY: usize = 32;

/// A running session.
pub struct GenerationHandle {
    /// Snapshots in emission order. Closes when the session ends.
    pub receiver: mpsc::Receiver<PushItem>,
    pub cancel: CancellationToken,
    pub join: JoinHandle<Result<SessionReport>>,
}

impl GenerationHandle {
    /// Requests cancellation. Has no effect once the closing delimiter was
    /// seen.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the session task. Drain `receiver` first or drop it.
    pub async fn wait(self) -> Result<SessionReport> {
        drop(self.receiver);
        self.join
            .await
            .map_err(|e| DgenError::internal(format!("generation task failed: {}", e)))?
    }
}

pub struct GenerationRunner {
    usecase: Arc<DiagramGenerationUseCase>,
    timeout: Option<Duration>,
}

impl GenerationRunner {
    pub fn new(usecase: Arc<DiagramGenerationUseCase>) -> Self {
        Self {
            usecase,
            timeout: None,
        }
    }

    /// Cancels sessions still streaming after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn usecase(&self) -> &DiagramGenerationUseCase {
        &self.usecase
    }

    pub fn spawn(&self, prepared: PreparedGeneration) -> GenerationHandle {
        let (tx, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let usecase = self.usecase.clone();
        let timeout = self.timeout;
        let session_cancel = cancel.clone();

        let join = tokio::spawn(async move {
            let watchdog = timeout.map(|limit| {
                let cancel = session_cancel.clone();
                let project_id = prepared.request.project_id.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(limit).await;
                    tracing::warn!(
                        target: "generation",
                        "Session for project {} timed out after {:?}",
                        project_id,
                        limit
                    );
                    cancel.cancel();
                })
            });

            let result = usecase.run(prepared, tx, session_cancel).await;
            if let Some(watchdog) = watchdog {
                watchdog.abort();
            }
            result
        });

        GenerationHandle {
            receiver,
            cancel,
            join,
        }
    }
}
