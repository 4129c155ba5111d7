//! Builder for external tool invocations with consistent error handling.
//!
//! Every tool the pipeline shells out to (`intltool-update`, `xml2po`,
//! `msgmerge`, `dot`) goes through [`ToolCommand`]. The working directory is
//! set on the child process only; the parent process directory is never
//! changed, so there is nothing to restore when a tool fails.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};
use tokio::time::timeout;

use crate::constants::DEFAULT_TOOL_TIMEOUT;
use crate::core::SweepError;

/// Fluent builder for one external tool invocation.
///
/// # Examples
///
/// ```rust,ignore
/// use blip_sweep::tool::ToolCommand;
///
/// # async fn example() -> anyhow::Result<()> {
/// let output = ToolCommand::new("msgmerge")
///     .args(["de.po", "/srv/files/l10n/gnome-help.pot"])
///     .current_dir("/src/gnome-user-docs/po")
///     .with_context("gnome-help/de")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
///
/// # Default Configuration
///
/// - **Timeout**: 5 minutes
/// - **Stdin**: closed unless [`stdin`](Self::stdin) supplies bytes
/// - **Output capture**: stdout and stderr are always captured
pub struct ToolCommand {
    /// Program to run, as configured
    program: String,

    /// Name used in errors and log lines (defaults to the program)
    name: String,

    /// Arguments, configured leading arguments first
    args: Vec<String>,

    /// Working directory of the child process
    current_dir: Option<PathBuf>,

    /// Bytes written to the child's standard input
    stdin: Option<Vec<u8>>,

    /// Maximum duration to wait for completion (None = no timeout)
    timeout_duration: Option<Duration>,

    /// Optional context string for log lines
    context: Option<String>,
}

impl ToolCommand {
    /// Creates a builder for `program` with default settings.
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        Self {
            name: program.clone(),
            program,
            args: Vec::new(),
            current_dir: None,
            stdin: None,
            timeout_duration: Some(DEFAULT_TOOL_TIMEOUT),
            context: None,
        }
    }

    /// Creates a builder from a configured command vector (program plus
    /// leading arguments).
    pub fn from_command_line(command: &[String]) -> Result<Self, SweepError> {
        let (program, leading) = command.split_first().ok_or_else(|| SweepError::ConfigError {
            message: "empty tool command".to_string(),
        })?;
        Ok(Self::new(program.clone()).args(leading.iter().cloned()))
    }

    /// Reports failures under `name` instead of the program path.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Feeds `input` to the tool's standard input.
    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Sets the timeout; `None` waits indefinitely.
    pub const fn timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    fn describe(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    /// Runs the tool and returns its captured output.
    ///
    /// # Errors
    ///
    /// - [`SweepError::ToolNotFound`] if the program cannot be spawned
    /// - [`SweepError::GeneratorFailure`] on a non-zero exit status or timeout,
    ///   with the tool's output as the message
    pub async fn execute(self) -> Result<ToolOutput> {
        let start = std::time::Instant::now();
        let command_line = self.describe();
        let ctx = self.context.as_deref().unwrap_or("-");

        tracing::debug!(target: "tool", "({}) Executing command: {}", ctx, command_line);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        cmd.stdin(if self.stdin.is_some() { Stdio::piped() } else { Stdio::null() });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SweepError::ToolNotFound {
                    tool: self.program,
                }
                .into());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to execute {command_line}"));
            }
        };

        // Input is fed while the output is collected, both under the timeout
        let program = &self.program;
        let pipe = child.stdin.take();
        let input = self.stdin;
        let run = async {
            let (written, output) = tokio::join!(feed_stdin(pipe, input), child.wait_with_output());
            written.with_context(|| format!("Failed to write stdin of {program}"))?;
            output.with_context(|| format!("Failed to execute {command_line}"))
        };

        let output = if let Some(duration) = self.timeout_duration {
            if let Ok(result) = timeout(duration, run).await {
                result?
            } else {
                tracing::warn!(
                    target: "tool",
                    "({}) Command timed out after {} seconds: {}",
                    ctx,
                    duration.as_secs(),
                    command_line
                );
                return Err(SweepError::GeneratorFailure {
                    tool: self.name,
                    message: format!("timed out after {} seconds", duration.as_secs()),
                }
                .into());
            }
        } else {
            run.await?
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            tracing::debug!(
                target: "tool",
                "({}) Command failed with exit code: {:?}",
                ctx,
                output.status.code()
            );
            let detail = if stderr.trim().is_empty() { stdout.trim() } else { stderr.trim() };
            let message = match output.status.code() {
                Some(code) if detail.is_empty() => format!("exit status {code}"),
                Some(code) => format!("exit status {code}: {detail}"),
                None if detail.is_empty() => "terminated by signal".to_string(),
                None => format!("terminated by signal: {detail}"),
            };
            return Err(SweepError::GeneratorFailure {
                tool: self.name,
                message,
            }
            .into());
        }

        if !stderr.trim().is_empty() {
            tracing::debug!(target: "tool", "({}) {}", ctx, stderr.trim());
        }

        let elapsed = start.elapsed();
        if elapsed.as_secs() > 1 {
            tracing::info!(target: "tool::perf", "({}) {} took {:.2}s", ctx, self.name, elapsed.as_secs_f64());
        } else if elapsed.as_millis() > 100 {
            tracing::debug!(target: "tool::perf", "({}) {} took {}ms", ctx, self.name, elapsed.as_millis());
        }

        Ok(ToolOutput {
            stdout,
            stderr,
        })
    }

    /// Runs the tool and discards its output.
    pub async fn execute_success(self) -> Result<()> {
        self.execute().await?;
        Ok(())
    }
}

/// Output from a tool invocation
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

/// Writes `input` to the child's standard input and closes it.
async fn feed_stdin(pipe: Option<ChildStdin>, input: Option<Vec<u8>>) -> std::io::Result<()> {
    let (Some(mut pipe), Some(input)) = (pipe, input) else {
        return Ok(());
    };
    // A tool that exits without reading its input is judged by its exit status
    match pipe.write_all(&input).await {
        Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => Err(e),
        _ => Ok(()),
    }
}
