use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::config::RunnerCommand;
use crate::errors::RuntimeError;
use crate::protocol::BoundaryMessage;
use crate::source::PreviewDocument;

use super::{FaultReporter, IsolatedContext, PreviewRuntime};

/// Runs each preview document in a separate runner process.
///
/// The document is written to the runner's stdin. Every stdout line that is a
/// boundary message is relayed as a fault; other output is ignored. A runner
/// that exits unsuccessfully counts as a fault too.
pub struct ProcessRuntime {
    command: RunnerCommand,
}

impl ProcessRuntime {
    pub fn new(command: RunnerCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &RunnerCommand {
        &self.command
    }
}

#[async_trait::async_trait]
impl PreviewRuntime for ProcessRuntime {
    fn name(&self) -> &str {
        "process"
    }

    async fn launch(
        &self,
        document: PreviewDocument,
        reporter: FaultReporter,
    ) -> Result<Box<dyn IsolatedContext>, RuntimeError> {
        let program = self.command.program.clone();
        let mut child = Command::new(&program)
            .args(&self.command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RuntimeError::spawn(&program, e.to_string()))?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RuntimeError::io("failed to capture runner stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RuntimeError::io("failed to capture runner stdout"))?;
        debug!(
            event = "preview.runner_spawned",
            domain = "preview",
            attempt = %reporter.attempt(),
            program = program.as_str(),
            pid = ?child.id()
        );

        // Runners may exit without draining stdin; a broken pipe is not a fault.
        let writer = tokio::spawn(async move {
            if let Err(err) = stdin.write_all(document.as_str().as_bytes()).await {
                trace!(error = %err, "runner closed stdin before the document was written");
            }
            let _ = stdin.shutdown().await;
        });

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(supervise_runner(child, stdout, reporter, stop_rx));
        Ok(Box::new(ProcessContext {
            stop: stop_tx,
            task,
            writer,
        }))
    }
}

struct ProcessContext {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
    writer: JoinHandle<()>,
}

#[async_trait::async_trait]
impl IsolatedContext for ProcessContext {
    async fn teardown(self: Box<Self>) {
        let ProcessContext { stop, task, writer } = *self;
        let _ = stop.send(true);
        writer.abort();
        if let Err(err) = task.await
            && !err.is_cancelled()
        {
            warn!(error = %err, "preview runner supervisor task failed");
        }
    }
}

enum RunnerExit {
    Stopped,
    Exited(std::io::Result<ExitStatus>),
}

async fn supervise_runner(
    mut child: Child,
    stdout: ChildStdout,
    reporter: FaultReporter,
    mut stop: watch::Receiver<bool>,
) {
    let mut lines = BufReader::new(stdout).lines();
    let mut stdout_open = true;

    let exit = loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break RunnerExit::Stopped;
                }
            }
            line = lines.next_line(), if stdout_open => match line {
                Ok(Some(line)) => match BoundaryMessage::parse_line(&line) {
                    Some(message) => {
                        debug!(
                            event = "preview.runner_fault",
                            domain = "preview",
                            attempt = %reporter.attempt(),
                            message = message.message()
                        );
                        reporter.relay(message);
                    }
                    None => trace!(attempt = %reporter.attempt(), line = line.as_str(), "ignoring runner output"),
                },
                Ok(None) => stdout_open = false,
                Err(err) => {
                    trace!(error = %err, "runner stdout unreadable");
                    stdout_open = false;
                }
            },
            status = child.wait(), if !stdout_open => break RunnerExit::Exited(status),
        }
    };

    match exit {
        RunnerExit::Stopped => {
            if let Err(err) = child.kill().await {
                trace!(error = %err, "runner already gone at teardown");
            }
        }
        RunnerExit::Exited(Ok(status)) if status.success() => {
            debug!(attempt = %reporter.attempt(), "preview runner exited cleanly");
        }
        RunnerExit::Exited(Ok(status)) => {
            reporter.report(format!("preview runner exited with {status}"));
        }
        RunnerExit::Exited(Err(err)) => {
            reporter.report(format!("preview runner could not be awaited: {err}"));
        }
    }
}
