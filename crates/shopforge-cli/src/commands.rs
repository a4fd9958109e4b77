use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, bail};
use shopforge_generate::{GenerationRequest, Generator, PageType};
use shopforge_preview::display::RETRY_HINT;
use shopforge_preview::{
    CandidateSource, DisplayState, PreviewConfig, PreviewSupervisor, ProcessRuntime,
    RenderOutcome, RunnerCommand, ValidationVerdict, ViewportMode, build_preview_document_with,
    check, check_and_log, extract,
};
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tracing::info;

use crate::cli::{Commands, PageKind, Viewport};

/// File name used when exporting a component without an explicit path.
pub const EXPORT_FILE_NAME: &str = "generated-page.tsx";

pub async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Extract { input } => {
            let source = extract(&read_input(input.as_deref()).await?)?;
            write_output(None, source.as_str()).await
        }
        Commands::Check { input } => {
            let source = extract(&read_input(input.as_deref()).await?)?;
            print_json(&check(&source))
        }
        Commands::Render { input, out } => {
            let source = extract(&read_input(input.as_deref()).await?)?;
            let config = PreviewConfig::from_env()?;
            let document = build_preview_document_with(&source, &config.assets);
            write_output(out.as_deref(), document.as_str()).await
        }
        Commands::Preview {
            input,
            runner,
            settle_ms,
            watch_ms,
            viewport,
        } => {
            let raw = read_input(input.as_deref()).await?;
            let mut config = PreviewConfig::from_env()?;
            if let Some(runner) = runner {
                config = config.runner(RunnerCommand::parse(&runner)?);
            }
            if let Some(millis) = settle_ms {
                config = config.settle_delay_ms(millis);
            }
            let report = preview(&raw, config, viewport.into(), watch_ms.map(Duration::from_millis)).await?;
            print_json(&report)
        }
        Commands::Generate {
            description,
            page_type,
            reference_url,
            previous_code,
            model,
            out,
            json,
        } => {
            let mut request = GenerationRequest::new(description, page_type.into());
            request.reference_url = reference_url;
            if let Some(path) = previous_code {
                let code = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?;
                request = request.previous_code(code);
            }
            let mut generator = Generator::from_env()?;
            if let Some(model) = model {
                generator = generator.with_model(model);
            }
            if json {
                return print_json(&generator.respond(&request).await);
            }
            let generation = generator.generate(&request).await?;
            write_output(out.as_deref(), generation.source.as_str()).await
        }
        Commands::Export { input, out } => {
            let source = extract(&read_input(input.as_deref()).await?)?;
            let target = export_to(&out, &source).await?;
            eprintln!("wrote {}", target.display());
            Ok(())
        }
    }
}

impl From<Viewport> for ViewportMode {
    fn from(value: Viewport) -> Self {
        match value {
            Viewport::Desktop => ViewportMode::Desktop,
            Viewport::Mobile => ViewportMode::Mobile,
        }
    }
}

impl From<PageKind> for PageType {
    fn from(value: PageKind) -> Self {
        match value {
            PageKind::Landing => PageType::Landing,
            PageKind::Product => PageType::Product,
        }
    }
}

/// JSON printed by `shopforge preview`.
#[derive(Debug, PartialEq, serde::Serialize)]
pub struct PreviewReport {
    pub attempt: Option<u64>,
    pub outcome: Option<RenderOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<ValidationVerdict>,
    pub viewport: ViewportMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_size: Option<(u32, u32)>,
}

impl PreviewReport {
    fn new(state: &DisplayState, verdict: Option<ValidationVerdict>, viewport: ViewportMode) -> Self {
        let outcome = state.outcome();
        Self {
            attempt: state.attempt().map(|a| a.get()),
            hint: matches!(outcome, Some(RenderOutcome::Failed(_))).then_some(RETRY_HINT),
            outcome,
            verdict,
            viewport,
            frame_size: viewport.frame_size(),
        }
    }
}

async fn preview(
    raw: &str,
    config: PreviewConfig,
    viewport: ViewportMode,
    watch: Option<Duration>,
) -> anyhow::Result<PreviewReport> {
    let Some(runner) = config.runner.clone() else {
        bail!("no preview runner configured (set SHOPFORGE_RUNNER or pass --runner)");
    };
    let runtime = Arc::new(ProcessRuntime::new(runner));
    let mut supervisor = PreviewSupervisor::new(runtime, config);
    supervisor.set_viewport(viewport);

    let verdict = match extract(raw) {
        Ok(source) => {
            let verdict = check_and_log(&source);
            supervisor.present(&source).await;
            Some(verdict)
        }
        Err(err) => {
            supervisor.report_generation_failure(err.message()).await;
            None
        }
    };

    let mut state = supervisor.resolve().await;
    if let (Some(watch), DisplayState::Ready { .. }) = (watch, &state) {
        info!(watch_ms = watch.as_millis() as u64, "watching for late faults");
        if let Ok(Some(next)) = tokio::time::timeout(watch, supervisor.next_change()).await {
            state = next;
        }
    }
    let report = PreviewReport::new(&state, verdict, supervisor.display().viewport());
    supervisor.shutdown().await;
    Ok(report)
}

async fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("failed to read stdin")?;
            Ok(raw)
        }
    }
}

async fn write_output(path: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => tokio::fs::write(path, text)
            .await
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(text.as_bytes()).await?;
            if !text.ends_with('\n') {
                stdout.write_all(b"\n").await?;
            }
            stdout.flush().await?;
            Ok(())
        }
    }
}

/// Writes the raw component source; a directory target gets
/// [`EXPORT_FILE_NAME`] inside it.
pub async fn export_to(path: &Path, source: &CandidateSource) -> anyhow::Result<PathBuf> {
    let target = if tokio::fs::metadata(path).await.is_ok_and(|m| m.is_dir()) {
        path.join(EXPORT_FILE_NAME)
    } else {
        path.to_path_buf()
    };
    tokio::fs::write(&target, source.as_str())
        .await
        .with_context(|| format!("failed to write {}", target.display()))?;
    info!(
        event = "export.written",
        path = %target.display(),
        code_len = source.len() as u64
    );
    Ok(target)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETION: &str = "```tsx\nexport default function GeneratedPage(){return <div className=\"p-4\">Hi</div>;}\n```";

    #[tokio::test]
    async fn reads_input_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("completion.txt");
        std::fs::write(&path, COMPLETION).expect("write");
        assert_eq!(read_input(Some(&path)).await.expect("read"), COMPLETION);
        assert!(read_input(Some(&dir.path().join("missing.txt"))).await.is_err());
    }

    #[tokio::test]
    async fn export_writes_the_raw_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = extract(COMPLETION).expect("extract");

        let target = export_to(dir.path(), &source).await.expect("export");
        assert_eq!(target, dir.path().join(EXPORT_FILE_NAME));
        assert_eq!(std::fs::read_to_string(&target).expect("read"), source.as_str());

        let named = dir.path().join("shop.tsx");
        assert_eq!(export_to(&named, &source).await.expect("export"), named);
    }

    #[tokio::test]
    async fn preview_without_runner_is_an_error() {
        let err = preview(COMPLETION, PreviewConfig::default(), ViewportMode::Desktop, None)
            .await
            .expect_err("no runner");
        assert!(err.to_string().contains("no preview runner configured"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn preview_reports_ready_for_a_quiet_runner() {
        let config = PreviewConfig::default()
            .settle_delay_ms(50)
            .runner(RunnerCommand::new("/bin/sh").arg("-c").arg("cat >/dev/null; sleep 5"));
        let report = preview(COMPLETION, config, ViewportMode::Mobile, None)
            .await
            .expect("preview");
        assert_eq!(report.outcome, Some(RenderOutcome::Ready));
        assert_eq!(report.attempt, Some(1));
        assert_eq!(report.frame_size, Some((375, 667)));
        assert_eq!(report.hint, None);
        assert_eq!(report.verdict, Some(ValidationVerdict::pass()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn preview_reports_runner_faults_with_the_retry_hint() {
        let config = PreviewConfig::default().settle_delay_ms(2_000).runner(
            RunnerCommand::new("/bin/sh")
                .arg("-c")
                .arg(r#"cat >/dev/null; echo '{"type":"iframe-error","message":"React is not defined"}'; sleep 5"#),
        );
        let report = preview(COMPLETION, config, ViewportMode::Desktop, None)
            .await
            .expect("preview");
        assert_eq!(
            report.outcome,
            Some(RenderOutcome::Failed("React is not defined".into()))
        );
        assert_eq!(report.hint, Some(RETRY_HINT));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn extraction_failure_is_reported_without_an_attempt() {
        let config = PreviewConfig::default().runner(RunnerCommand::new("/bin/true"));
        let report = preview("just some prose", config, ViewportMode::Desktop, None)
            .await
            .expect("preview");
        assert_eq!(report.attempt, None);
        assert_eq!(
            report.outcome,
            Some(RenderOutcome::Failed("doesn't look like valid component code".into()))
        );
        assert_eq!(report.verdict, None);
    }

    #[test]
    fn report_serializes_outcome_and_viewport() {
        let report = PreviewReport::new(&DisplayState::Idle, None, ViewportMode::Desktop);
        assert_eq!(
            serde_json::to_value(&report).expect("json"),
            serde_json::json!({ "attempt": null, "outcome": null, "viewport": "desktop" })
        );
    }
}
