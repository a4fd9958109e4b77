//! Preview pipeline for generated storefront components.
//!
//! Raw model output goes through [`extract`], gets an advisory [`check`], and
//! is wrapped into a [`PreviewDocument`] that a [`PreviewRuntime`] executes in
//! an isolated context. The [`PreviewSupervisor`] turns what that context
//! reports into a [`DisplayState`] for the host.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use shopforge_preview::{PreviewConfig, PreviewSupervisor, ProcessRuntime, RunnerCommand};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), shopforge_preview::ExtractionError> {
//! let source = shopforge_preview::extract("```tsx\nexport default function GeneratedPage() { return <main className=\"p-4\" />; }\n```")?;
//! let verdict = shopforge_preview::check_and_log(&source);
//! assert!(verdict.valid);
//!
//! let runtime = Arc::new(ProcessRuntime::new(RunnerCommand::new("preview-runner")));
//! let mut supervisor = PreviewSupervisor::new(runtime, PreviewConfig::default());
//! supervisor.present(&source).await;
//! println!("{:?}", supervisor.resolve().await);
//! # Ok(())
//! # }
//! ```

/// Advisory heuristics run on extracted source.
pub mod check;
/// Preview pipeline settings and runner command.
pub mod config;
/// Host-side display state machine.
pub mod display;
/// Preview document construction.
pub mod document;
/// Public error types.
pub mod errors;
/// Raw completion to candidate source.
pub mod extract;
/// Logging initialization.
pub mod observability;
/// Boundary message schema.
pub mod protocol;
/// Isolated execution context contracts and the process runtime.
pub mod runtime;
/// Value types flowing through the pipeline.
pub mod source;
/// Attempt supervisor tying runtime events to the display.
pub mod supervisor;

pub use check::{ValidationVerdict, check, check_and_log};
pub use config::{DocumentAssets, PreviewConfig, RunnerCommand};
pub use display::{
    AttemptId, DisplayState, Panel, PreviewDisplay, RenderOutcome, Transition, ViewportMode,
};
pub use document::{build_preview_document, build_preview_document_with};
pub use errors::{ConfigError, ExtractionError, RuntimeError};
pub use extract::extract;
pub use observability::init_observability;
pub use protocol::BoundaryMessage;
pub use runtime::{FaultReporter, IsolatedContext, PreviewRuntime, ProcessRuntime};
pub use source::{CandidateSource, PreviewDocument};
pub use supervisor::PreviewSupervisor;
