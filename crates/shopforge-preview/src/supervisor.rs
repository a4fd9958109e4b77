//! Drives render attempts against a [`PreviewRuntime`].
//!
//! The supervisor owns at most one live isolated context. Every event on its
//! channel carries the attempt it belongs to; events for anything but the
//! attempt on screen are discarded before they reach the display.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::PreviewConfig;
use crate::display::{AttemptId, DisplayState, PreviewDisplay, Transition, ViewportMode};
use crate::document::build_preview_document_with;
use crate::runtime::{AttemptEvent, AttemptEventKind, FaultReporter, IsolatedContext, PreviewRuntime};
use crate::source::CandidateSource;

struct LiveAttempt {
    attempt: AttemptId,
    context: Option<Box<dyn IsolatedContext>>,
    detach: watch::Sender<bool>,
    settle_timer: Option<JoinHandle<()>>,
}

impl LiveAttempt {
    fn detach(&mut self) {
        if let Some(timer) = self.settle_timer.take() {
            timer.abort();
        }
        let _ = self.detach.send(true);
    }
}

impl Drop for LiveAttempt {
    fn drop(&mut self) {
        self.detach();
    }
}

pub struct PreviewSupervisor {
    runtime: Arc<dyn PreviewRuntime>,
    config: PreviewConfig,
    display: PreviewDisplay,
    events_tx: mpsc::UnboundedSender<AttemptEvent>,
    events_rx: mpsc::UnboundedReceiver<AttemptEvent>,
    live: Option<LiveAttempt>,
}

impl PreviewSupervisor {
    pub fn new(runtime: Arc<dyn PreviewRuntime>, config: PreviewConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            config,
            display: PreviewDisplay::new(),
            events_tx,
            events_rx,
            live: None,
        }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn display(&self) -> &PreviewDisplay {
        &self.display
    }

    pub fn state(&self) -> &DisplayState {
        self.display.state()
    }

    pub fn set_viewport(&mut self, viewport: ViewportMode) {
        self.display.set_viewport(viewport);
    }

    pub fn toggle_viewport(&mut self) -> ViewportMode {
        self.display.toggle_viewport()
    }

    /// Starts a render attempt for `source`, superseding whatever was on
    /// screen.
    ///
    /// The previous context is torn down and its settle timer cancelled
    /// before the new context is launched. A launch failure resolves the new
    /// attempt as `Failed` immediately.
    pub async fn present(&mut self, source: &CandidateSource) -> AttemptId {
        self.retire().await;
        let attempt = self.display.begin_attempt();
        info!(
            event = "preview.attempt_started",
            domain = "preview",
            attempt = %attempt,
            runtime = self.runtime.name(),
            source_len = source.len() as u64
        );

        let document = build_preview_document_with(source, &self.config.assets);
        let (detach_tx, detach_rx) = watch::channel(false);
        let reporter = FaultReporter::new(attempt, self.events_tx.clone(), detach_rx);
        match self.runtime.launch(document, reporter).await {
            Ok(context) => {
                let settle_timer = self.spawn_settle_timer(attempt);
                self.live = Some(LiveAttempt {
                    attempt,
                    context: Some(context),
                    detach: detach_tx,
                    settle_timer: Some(settle_timer),
                });
            }
            Err(err) => {
                warn!(
                    event = "preview.launch_failed",
                    domain = "preview",
                    attempt = %attempt,
                    error = %err
                );
                self.apply(AttemptEvent {
                    attempt,
                    kind: AttemptEventKind::Fault(err.to_string()),
                });
            }
        }
        attempt
    }

    /// Waits for the next event that changes the display and returns the new
    /// state. Stale and redundant events are consumed silently.
    ///
    /// After `Ready` this keeps waiting for late faults, so callers bound it
    /// with a timeout.
    pub async fn next_change(&mut self) -> Option<DisplayState> {
        while let Some(event) = self.events_rx.recv().await {
            if let Transition::Changed(state) = self.apply(event) {
                return Some(state);
            }
        }
        None
    }

    /// Waits until the current attempt is `Ready` or `Failed`. Returns at once
    /// when nothing is loading.
    pub async fn resolve(&mut self) -> DisplayState {
        while matches!(self.display.state(), DisplayState::Loading { .. }) {
            if self.next_change().await.is_none() {
                break;
            }
        }
        self.display.state().clone()
    }

    /// Closes the error panel and tears down the context behind it.
    pub async fn dismiss(&mut self) -> Transition {
        let transition = self.display.dismiss();
        if matches!(transition, Transition::Changed(_)) {
            self.retire().await;
        }
        transition
    }

    /// Shows a failure that happened before anything could be rendered
    /// (extraction or generation), replacing the current attempt.
    pub async fn report_generation_failure(&mut self, message: impl Into<String>) -> Transition {
        self.retire().await;
        let message = message.into();
        warn!(
            event = "preview.upstream_failure",
            domain = "preview",
            message = message.as_str()
        );
        self.display.fail_without_attempt(message)
    }

    /// Tears down the live context, if any.
    pub async fn shutdown(&mut self) {
        self.retire().await;
    }

    fn spawn_settle_timer(&self, attempt: AttemptId) -> JoinHandle<()> {
        let tx = self.events_tx.clone();
        let delay = self.config.settle_delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(AttemptEvent {
                attempt,
                kind: AttemptEventKind::Settled,
            });
        })
    }

    fn apply(&mut self, event: AttemptEvent) -> Transition {
        let AttemptEvent { attempt, kind } = event;
        let is_fault = matches!(kind, AttemptEventKind::Fault(_));
        let transition = match kind {
            AttemptEventKind::Settled => self.display.settle(attempt),
            AttemptEventKind::Fault(message) => {
                debug!(attempt = %attempt, message = message.as_str(), "fault received");
                self.display.fault(attempt, message)
            }
        };
        match &transition {
            Transition::Stale if is_fault => debug!(
                event = "preview.stale_fault_discarded",
                domain = "preview",
                attempt = %attempt
            ),
            Transition::Stale | Transition::Unchanged => {
                trace!(attempt = %attempt, "event left display unchanged");
            }
            Transition::Changed(DisplayState::Ready { .. }) => info!(
                event = "preview.settled",
                domain = "preview",
                attempt = %attempt
            ),
            Transition::Changed(DisplayState::Failed { message, .. }) => warn!(
                event = "preview.fault",
                domain = "preview",
                attempt = %attempt,
                message = message.as_str()
            ),
            Transition::Changed(_) => {}
        }
        transition
    }

    async fn retire(&mut self) {
        let Some(mut live) = self.live.take() else {
            return;
        };
        live.detach();
        if let Some(context) = live.context.take() {
            context.teardown().await;
        }
        debug!(
            event = "preview.attempt_torn_down",
            domain = "preview",
            attempt = %live.attempt
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::check::check;
    use crate::errors::RuntimeError;
    use crate::source::PreviewDocument;

    #[derive(Clone)]
    enum Script {
        Quiet,
        FaultAfter(Duration, &'static str),
        LaunchError,
    }

    #[derive(Default)]
    struct Counters {
        launches: AtomicUsize,
        teardowns: AtomicUsize,
        live: AtomicUsize,
        dropped_reports: AtomicUsize,
    }

    struct ScriptedRuntime {
        scripts: Mutex<VecDeque<Script>>,
        counters: Arc<Counters>,
        documents: Mutex<Vec<PreviewDocument>>,
    }

    impl ScriptedRuntime {
        fn new(scripts: impl IntoIterator<Item = Script>) -> Arc<Self> {
            Arc::new(Self {
                scripts: Mutex::new(scripts.into_iter().collect()),
                counters: Arc::new(Counters::default()),
                documents: Mutex::new(Vec::new()),
            })
        }
    }

    struct ScriptedContext {
        counters: Arc<Counters>,
    }

    #[async_trait::async_trait]
    impl IsolatedContext for ScriptedContext {
        async fn teardown(self: Box<Self>) {
            self.counters.live.fetch_sub(1, Ordering::SeqCst);
            self.counters.teardowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait::async_trait]
    impl PreviewRuntime for ScriptedRuntime {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn launch(
            &self,
            document: PreviewDocument,
            reporter: FaultReporter,
        ) -> Result<Box<dyn IsolatedContext>, RuntimeError> {
            let script = self
                .scripts
                .lock()
                .expect("scripts lock")
                .pop_front()
                .unwrap_or(Script::Quiet);
            self.counters.launches.fetch_add(1, Ordering::SeqCst);
            self.documents.lock().expect("documents lock").push(document);
            match script {
                Script::LaunchError => {
                    return Err(RuntimeError::Unavailable("no runner configured".into()));
                }
                // The fault task outlives teardown on purpose: it models a
                // context that keeps reporting after it was superseded.
                Script::FaultAfter(delay, message) => {
                    let counters = self.counters.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        if !reporter.report(message) {
                            counters.dropped_reports.fetch_add(1, Ordering::SeqCst);
                        }
                    });
                }
                Script::Quiet => {}
            }
            self.counters.live.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ScriptedContext {
                counters: self.counters.clone(),
            }))
        }
    }

    fn supervisor(runtime: &Arc<ScriptedRuntime>) -> PreviewSupervisor {
        PreviewSupervisor::new(runtime.clone(), PreviewConfig::default())
    }

    fn source() -> CandidateSource {
        CandidateSource::from_trusted(
            "export default function GeneratedPage(){return <div className=\"p-4\">Hi</div>;}",
        )
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_context_is_ready_after_the_settle_delay() {
        let runtime = ScriptedRuntime::new([Script::Quiet]);
        let mut supervisor = supervisor(&runtime);
        let started = tokio::time::Instant::now();

        let attempt = supervisor.present(&source()).await;
        assert_eq!(supervisor.state(), &DisplayState::Loading { attempt });
        assert_eq!(supervisor.resolve().await, DisplayState::Ready { attempt });
        assert!(started.elapsed() >= Duration::from_millis(1_000));

        let documents = runtime.documents.lock().expect("documents lock");
        assert!(documents[0].as_str().contains("root.render(<GeneratedPage />);"));
    }

    #[tokio::test(start_paused = true)]
    async fn fault_before_the_delay_fails_the_attempt() {
        let runtime = ScriptedRuntime::new([Script::FaultAfter(
            Duration::from_millis(200),
            "x is not defined",
        )]);
        let mut supervisor = supervisor(&runtime);
        let started = tokio::time::Instant::now();

        let attempt = supervisor.present(&source()).await;
        assert_eq!(
            supervisor.resolve().await,
            DisplayState::Failed {
                attempt: Some(attempt),
                message: "x is not defined".into(),
            }
        );
        assert!(started.elapsed() < Duration::from_millis(1_000));
    }

    #[tokio::test(start_paused = true)]
    async fn late_fault_after_ready_still_fails_the_attempt() {
        let runtime = ScriptedRuntime::new([Script::FaultAfter(
            Duration::from_millis(1_500),
            "click handler threw",
        )]);
        let mut supervisor = supervisor(&runtime);

        let attempt = supervisor.present(&source()).await;
        assert_eq!(supervisor.resolve().await, DisplayState::Ready { attempt });
        assert_eq!(
            supervisor.next_change().await,
            Some(DisplayState::Failed {
                attempt: Some(attempt),
                message: "click handler threw".into(),
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn second_present_supersedes_the_first() {
        let runtime = ScriptedRuntime::new([
            Script::FaultAfter(Duration::from_millis(300), "from the first attempt"),
            Script::Quiet,
        ]);
        let mut supervisor = supervisor(&runtime);

        let first = supervisor.present(&source()).await;
        let second = supervisor.present(&source()).await;
        assert!(second > first);

        // A fault that slipped into the channel before teardown.
        supervisor
            .events_tx
            .send(AttemptEvent {
                attempt: first,
                kind: AttemptEventKind::Fault("stale".into()),
            })
            .expect("send");

        assert_eq!(supervisor.resolve().await, DisplayState::Ready { attempt: second });
        assert_eq!(runtime.counters.launches.load(Ordering::SeqCst), 2);
        assert_eq!(runtime.counters.teardowns.load(Ordering::SeqCst), 1);
        assert_eq!(runtime.counters.live.load(Ordering::SeqCst), 1);
        assert_eq!(runtime.counters.dropped_reports.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn launch_error_fails_the_attempt() {
        let runtime = ScriptedRuntime::new([Script::LaunchError]);
        let mut supervisor = supervisor(&runtime);

        let attempt = supervisor.present(&source()).await;
        match supervisor.resolve().await {
            DisplayState::Failed {
                attempt: Some(failed),
                message,
            } => {
                assert_eq!(failed, attempt);
                assert!(message.contains("no runner configured"), "{message}");
            }
            other => panic!("unexpected state {other:?}"),
        }
        assert_eq!(runtime.counters.live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_verdict_does_not_block_rendering() {
        let runtime = ScriptedRuntime::new([Script::Quiet]);
        let mut supervisor = supervisor(&runtime);
        let source = CandidateSource::from_trusted(
            "export default function GeneratedPage(){ return <div style={{color:'red'}}>X</div>; }",
        );

        let verdict = check(&source);
        assert!(!verdict.valid);
        let attempt = supervisor.present(&source).await;
        assert_eq!(supervisor.resolve().await, DisplayState::Ready { attempt });
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_tears_down_and_returns_to_idle() {
        let runtime = ScriptedRuntime::new([Script::FaultAfter(Duration::from_millis(10), "boom")]);
        let mut supervisor = supervisor(&runtime);

        supervisor.present(&source()).await;
        assert!(matches!(supervisor.resolve().await, DisplayState::Failed { .. }));
        assert_eq!(
            supervisor.dismiss().await,
            Transition::Changed(DisplayState::Idle)
        );
        assert_eq!(runtime.counters.teardowns.load(Ordering::SeqCst), 1);
        assert_eq!(supervisor.resolve().await, DisplayState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn generation_failure_replaces_a_loading_attempt() {
        let runtime = ScriptedRuntime::new([Script::Quiet]);
        let mut supervisor = supervisor(&runtime);

        supervisor.present(&source()).await;
        supervisor
            .report_generation_failure("doesn't look like valid component code")
            .await;
        assert_eq!(
            supervisor.resolve().await,
            DisplayState::Failed {
                attempt: None,
                message: "doesn't look like valid component code".into(),
            }
        );
        assert_eq!(runtime.counters.live.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        let pending = tokio::time::timeout(Duration::from_millis(10), supervisor.next_change()).await;
        assert!(pending.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn viewport_toggle_leaves_render_state_alone() {
        let runtime = ScriptedRuntime::new([Script::Quiet]);
        let mut supervisor = supervisor(&runtime);
        let attempt = supervisor.present(&source()).await;
        assert_eq!(supervisor.toggle_viewport(), ViewportMode::Mobile);
        assert_eq!(supervisor.state(), &DisplayState::Loading { attempt });
        supervisor.shutdown().await;
        assert_eq!(runtime.counters.live.load(Ordering::SeqCst), 0);
    }
}
