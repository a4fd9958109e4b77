//! Contracts for the isolated execution context that runs a preview document.
//!
//! A runtime launches one context per attempt and hands it a
//! [`FaultReporter`], the context's only way to reach the host. Nothing flows
//! from the host into a running context except teardown.

mod process;

pub use process::ProcessRuntime;

use tokio::sync::{mpsc, watch};

use crate::display::AttemptId;
use crate::errors::RuntimeError;
use crate::protocol::BoundaryMessage;
use crate::source::PreviewDocument;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum AttemptEventKind {
    Settled,
    Fault(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct AttemptEvent {
    pub attempt: AttemptId,
    pub kind: AttemptEventKind,
}

/// Sending half of the fault channel, bound to a single attempt.
///
/// Once the attempt is torn down the reporter is detached and silently drops
/// further reports.
#[derive(Clone, Debug)]
pub struct FaultReporter {
    attempt: AttemptId,
    tx: mpsc::UnboundedSender<AttemptEvent>,
    detached: watch::Receiver<bool>,
}

impl FaultReporter {
    pub(crate) fn new(
        attempt: AttemptId,
        tx: mpsc::UnboundedSender<AttemptEvent>,
        detached: watch::Receiver<bool>,
    ) -> Self {
        Self {
            attempt,
            tx,
            detached,
        }
    }

    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    pub fn is_detached(&self) -> bool {
        *self.detached.borrow() || self.tx.is_closed()
    }

    /// Reports a fault. Returns `false` if the report was dropped because the
    /// attempt is no longer live.
    pub fn report(&self, message: impl Into<String>) -> bool {
        if self.is_detached() {
            return false;
        }
        self.tx
            .send(AttemptEvent {
                attempt: self.attempt,
                kind: AttemptEventKind::Fault(message.into()),
            })
            .is_ok()
    }

    pub fn relay(&self, message: BoundaryMessage) -> bool {
        self.report(message.into_message())
    }

    /// Resolves once the attempt has been torn down.
    pub async fn detached(&self) {
        let mut rx = self.detached.clone();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Starts isolated contexts for preview documents.
#[async_trait::async_trait]
pub trait PreviewRuntime: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Starts executing `document`. Faults raised at any point during the
    /// context's life are sent through `reporter`.
    async fn launch(
        &self,
        document: PreviewDocument,
        reporter: FaultReporter,
    ) -> Result<Box<dyn IsolatedContext>, RuntimeError>;
}

/// A running isolated context.
#[async_trait::async_trait]
pub trait IsolatedContext: Send {
    /// Stops the context and releases its resources.
    async fn teardown(self: Box<Self>);
}

#[cfg(test)]
pub(crate) fn test_reporter() -> (
    FaultReporter,
    mpsc::UnboundedReceiver<AttemptEvent>,
    watch::Sender<bool>,
) {
    let mut display = crate::display::PreviewDisplay::new();
    let attempt = display.begin_attempt();
    let (tx, rx) = mpsc::unbounded_channel();
    let (detach_tx, detach_rx) = watch::channel(false);
    (FaultReporter::new(attempt, tx, detach_rx), rx, detach_tx)
}
