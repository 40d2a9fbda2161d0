//! Snapshot emission with pacing.

use dgen_core::message::{PushItem, SnapshotMessage, StreamFailure};
use dgen_core::pacing::PacingPolicy;
use dgen_core::{DgenError, Result};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Writes snapshots of one session to its push channel.
///
/// Pauses before partial snapshots are cut short by cancellation; the
/// pause before completion is not.
pub struct SnapshotEmitter {
    tx: mpsc::Sender<PushItem>,
    pacing: PacingPolicy,
    cancel: CancellationToken,
    partials_sent: usize,
}

impl SnapshotEmitter {
    pub fn new(
        tx: mpsc::Sender<PushItem>,
        pacing: PacingPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            tx,
            pacing,
            cancel,
            partials_sent: 0,
        }
    }

    pub fn partials_sent(&self) -> usize {
        self.partials_sent
    }

    /// Pause after the opening delimiter.
    pub async fn settle_after_open(&self) -> Result<()> {
        self.cancellable_pause(self.pacing.opening_settle()).await
    }

    pub async fn emit_partial(&mut self, payload: &str) -> Result<()> {
        self.cancellable_pause(self.pacing.partial_flush()).await?;
        tokio::select! {
            _ = self.cancel.cancelled() => return Err(cancelled()),
            sent = self.send(Ok(SnapshotMessage::partial(payload))) => sent?,
        }
        self.partials_sent += 1;
        Ok(())
    }

    /// Pause between the closing delimiter and persistence.
    pub async fn settle_before_completion(&self) {
        let delay = self.pacing.terminal_settle();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    pub async fn emit_terminal(&self, payload: &str, record_id: &str) -> Result<()> {
        self.send(Ok(SnapshotMessage::terminal(payload, record_id))).await
    }

    /// Reports an abnormal end. The client may already be gone.
    pub async fn fail(&self, err: &DgenError) {
        let _ = self.tx.send(Err(StreamFailure::from(err))).await;
    }

    async fn send(&self, item: PushItem) -> Result<()> {
        self.tx
            .send(item)
            .await
            .map_err(|_| DgenError::Cancelled("client disconnected".to_string()))
    }

    async fn cancellable_pause(&self, delay: Duration) -> Result<()> {
        if delay.is_zero() {
            return if self.cancel.is_cancelled() {
                Err(cancelled())
            } else {
                Ok(())
            };
        }
        tokio::select! {
            _ = self.cancel.cancelled() => Err(cancelled()),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

fn cancelled() -> DgenError {
    DgenError::Cancelled("session cancelled".to_string())
}
