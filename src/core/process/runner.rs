//! Spawn a single external command and capture its output.
//!
//! The executable is launched directly with its argument vector; no shell is
//! involved unless the executable itself is one. stdout and stderr are drained
//! concurrently by two scoped threads, each owning its own accumulator, so
//! interleaved writes never mix between the streams.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::error::{Error, ProcessNonZeroExitDetails, Result};
use crate::logging::{self, OUTPUT_TARGET};

pub const DEFAULT_NAMESPACE: &str = "shell";

const READ_CHUNK: usize = 8192;

/// Per-command execution options. Unset fields fall back to shared options
/// (see [`CommandOptions::merged_over`]) and then to the defaults below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOptions {
    /// Reject on non-zero exit. Defaults to true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_on_error: Option<bool>,
    /// Log channel for this command. Defaults to `shell`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging_finish: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,
}

impl CommandOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exit_on_error(mut self, value: bool) -> Self {
        self.exit_on_error = Some(value);
        self
    }

    pub fn namespace(mut self, value: impl Into<String>) -> Self {
        self.namespace = Some(value.into());
        self
    }

    pub fn logging_start(mut self, value: impl Into<String>) -> Self {
        self.logging_start = Some(value.into());
        self
    }

    pub fn logging_finish(mut self, value: impl Into<String>) -> Self {
        self.logging_finish = Some(value.into());
        self
    }

    pub fn verbose(mut self, value: bool) -> Self {
        self.verbose = Some(value);
        self
    }

    pub fn silent(mut self, value: bool) -> Self {
        self.silent = Some(value);
        self
    }

    /// Field-wise merge where `self` wins and `shared` fills the gaps.
    pub fn merged_over(&self, shared: &CommandOptions) -> CommandOptions {
        CommandOptions {
            exit_on_error: self.exit_on_error.or(shared.exit_on_error),
            namespace: self.namespace.clone().or_else(|| shared.namespace.clone()),
            logging_start: self
                .logging_start
                .clone()
                .or_else(|| shared.logging_start.clone()),
            logging_finish: self
                .logging_finish
                .clone()
                .or_else(|| shared.logging_finish.clone()),
            verbose: self.verbose.or(shared.verbose),
            silent: self.silent.or(shared.silent),
        }
    }

    pub fn should_exit_on_error(&self) -> bool {
        self.exit_on_error.unwrap_or(true)
    }

    pub fn namespace_or_default(&self) -> &str {
        self.namespace
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn is_silent(&self) -> bool {
        self.silent.unwrap_or(false)
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose.unwrap_or(false)
    }
}

/// A fully-specified request to run one external process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub executable: String,
    pub args: Vec<String>,
    pub options: CommandOptions,
    /// Caller-supplied key for looking the result up after a sequence run.
    pub label: Option<String>,
    pub working_dir: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl CommandDescriptor {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            options: CommandOptions::default(),
            label: None,
            working_dir: None,
            env: Vec::new(),
        }
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

    pub fn options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Executable followed by its arguments, space separated.
    pub fn formatted(&self) -> String {
        if self.args.is_empty() {
            return self.executable.clone();
        }
        format!("{} {}", self.executable, self.args.join(" "))
    }
}

/// Outcome of one completed process. stdout/stderr are trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub formatted_command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Seam between the sequencer/workflows and real process spawning.
pub trait CommandRunner {
    fn run(&self, descriptor: &CommandDescriptor) -> Result<CommandResult>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, descriptor: &CommandDescriptor) -> Result<CommandResult> {
        (**self).run(descriptor)
    }
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, descriptor: &CommandDescriptor) -> Result<CommandResult> {
        let formatted = descriptor.formatted();
        let options = &descriptor.options;
        let silent = options.is_silent();
        let echo = if silent {
            Echo::Off
        } else if options.is_verbose() {
            Echo::Info
        } else {
            Echo::Debug
        };

        let span = tracing::info_span!(
            "command",
            namespace = %options.namespace_or_default(),
            command = %formatted
        );
        let _entered = span.enter();

        tracing::debug!("Executing: {}", formatted);
        if !silent {
            if let Some(message) = &options.logging_start {
                logging::event(message);
            }
        }

        let mut cmd = Command::new(&descriptor.executable);
        cmd.args(&descriptor.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &descriptor.working_dir {
            cmd.current_dir(dir);
        }
        if !descriptor.env.is_empty() {
            cmd.envs(descriptor.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::process_spawn_failed(&formatted, e.to_string()))?;

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        // Reader threads log through the caller's dispatcher, not only the global one.
        let dispatch = tracing::dispatcher::get_default(|current| current.clone());
        let (stdout_bytes, stderr_bytes) = std::thread::scope(|scope| {
            let (out_span, out_dispatch) = (span.clone(), dispatch.clone());
            let (err_span, err_dispatch) = (span.clone(), dispatch.clone());
            let out = scope.spawn(move || {
                tracing::dispatcher::with_default(&out_dispatch, || {
                    let _entered = out_span.enter();
                    drain(stdout_pipe, StreamKind::Stdout, echo)
                })
            });
            let err = scope.spawn(move || {
                tracing::dispatcher::with_default(&err_dispatch, || {
                    let _entered = err_span.enter();
                    drain(stderr_pipe, StreamKind::Stderr, echo)
                })
            });
            (join_reader(out.join()), join_reader(err.join()))
        });

        let status = child
            .wait()
            .map_err(|e| Error::internal_io(e.to_string(), Some(format!("wait for {}", formatted))))?;
        let stdout_bytes = stdout_bytes?;
        let stderr_bytes = stderr_bytes?;

        // Signal-terminated processes have no exit code.
        let exit_code = status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&stdout_bytes).trim().to_string();
        let stderr = String::from_utf8_lossy(&stderr_bytes).trim().to_string();

        if exit_code != 0 && options.should_exit_on_error() {
            tracing::debug!(exit_code, "command failed");
            return Err(Error::process_non_zero_exit(ProcessNonZeroExitDetails {
                command: formatted,
                exit_code,
                stdout,
                stderr,
            }));
        }

        let result = CommandResult {
            formatted_command: formatted,
            exit_code,
            stdout,
            stderr,
            label: descriptor.label.clone(),
        };

        tracing::debug!(exit_code, "command completed");
        if !silent {
            if let Some(message) = &options.logging_finish {
                logging::event(message);
            }
        }

        Ok(result)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Echo {
    Off,
    Debug,
    Info,
}

/// Read a pipe to EOF, appending every chunk in arrival order and echoing
/// complete non-empty lines to the output log.
fn drain<R: Read>(pipe: Option<R>, kind: StreamKind, echo: Echo) -> Result<Vec<u8>> {
    let Some(mut pipe) = pipe else {
        return Ok(Vec::new());
    };

    let mut accumulated = Vec::new();
    let mut line = Vec::new();
    let mut buf = [0u8; READ_CHUNK];

    loop {
        let n = match pipe.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(Error::internal_io(
                    e.to_string(),
                    Some(format!("read {}", kind.as_str())),
                ))
            }
        };

        let chunk = &buf[..n];
        accumulated.extend_from_slice(chunk);

        for &byte in chunk {
            if byte == b'\n' {
                echo_line(&line, kind, echo);
                line.clear();
            } else {
                line.push(byte);
            }
        }
    }

    echo_line(&line, kind, echo);
    Ok(accumulated)
}

fn echo_line(line: &[u8], kind: StreamKind, echo: Echo) {
    if line.is_empty() {
        return;
    }
    let text = String::from_utf8_lossy(line);
    match echo {
        Echo::Off => {}
        Echo::Debug => tracing::debug!(target: OUTPUT_TARGET, stream = kind.as_str(), "{}", text),
        Echo::Info => tracing::info!(target: OUTPUT_TARGET, stream = kind.as_str(), "{}", text),
    }
}

fn join_reader(
    joined: std::thread::Result<Result<Vec<u8>>>,
) -> Result<Vec<u8>> {
    joined.map_err(|_| Error::internal_unexpected("Output reader thread panicked"))?
}
