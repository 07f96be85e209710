//! Process spawning behind a narrow, mockable interface.
//!
//! Hook commands are never executed directly: the program name and its
//! arguments are joined into a single string and handed to the platform
//! shell, so quoting inside hook commands is the shell's business.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStdin, Command};

use crate::stream::{reborrow, StreamWriter};

/// A readable end of a child's stdout or stderr.
pub type Pipe = Box<dyn AsyncRead + Send + Unpin>;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("exit status {0}")]
    ExitStatus(i32),

    #[error("terminated by signal")]
    Signal,

    #[error("command was not started")]
    NotStarted,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Failed(String),
}

/// Input fed to the child's stdin.
pub enum HookInput {
    /// Share this process's stdin with the child.
    Inherit,
    /// Write these bytes, then close stdin.
    Bytes(Vec<u8>),
    /// Copy this stream until EOF, then close stdin.
    Reader(Pipe),
}

impl std::fmt::Debug for HookInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookInput::Inherit => f.write_str("Inherit"),
            HookInput::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            HookInput::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

/// Everything needed to spawn one command, apart from its stdio.
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    pub name: String,
    pub args: Vec<String>,
    /// The complete environment of the child; nothing is inherited.
    pub env: Vec<(OsString, OsString)>,
    pub dir: Option<PathBuf>,
}

impl CommandSpec {
    /// The single command line handed to the shell.
    pub fn script(&self) -> String {
        format!("{} {}", self.name, self.args.join(" "))
    }
}

/// Writers and input wired to a command. Absent writers discard output.
#[derive(Default)]
pub struct CommandIo<'a> {
    pub stdout: Option<StreamWriter<'a>>,
    pub stderr: Option<StreamWriter<'a>>,
    pub stdin: Option<HookInput>,
}

/// Creates commands. [`ShellExec`] spawns real processes; tests substitute a mock.
pub trait ExecInterface: Send + Sync {
    fn command<'a>(&self, spec: CommandSpec, io: CommandIo<'a>) -> Box<dyn ShellCommand + 'a>;
}

#[async_trait]
pub trait ShellCommand: Send {
    /// Start the command, stream its output into the configured writers, and
    /// wait for it to exit.
    async fn run(&mut self) -> Result<(), CommandError>;

    /// Spawn the command without waiting.
    fn start(&mut self) -> Result<(), CommandError>;

    /// Take the stdout pipe after [`ShellCommand::start`]. Output read from
    /// the pipe bypasses the configured writer.
    fn stdout_pipe(&mut self) -> Option<Pipe>;

    fn stderr_pipe(&mut self) -> Option<Pipe>;

    /// Drain any pipes not taken into the configured writers and wait for exit.
    async fn wait(&mut self) -> Result<(), CommandError>;

    /// Run to completion and return stdout and stderr together.
    async fn combined_output(&mut self) -> Result<Vec<u8>, CommandError>;
}

// ─── ShellExec ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct ShellExec;

impl ExecInterface for ShellExec {
    fn command<'a>(&self, spec: CommandSpec, io: CommandIo<'a>) -> Box<dyn ShellCommand + 'a> {
        Box::new(ShellProcess {
            spec,
            io,
            child: None,
            stdout: None,
            stderr: None,
            stdin: None,
        })
    }
}

/// Program and arguments that interpret `script` on this platform.
pub fn shell_invocation(script: &str) -> (String, Vec<String>) {
    shell_for(cfg!(windows), std::env::var("SHELL").ok(), script)
}

fn shell_for(windows: bool, shell: Option<String>, script: &str) -> (String, Vec<String>) {
    if windows {
        return (
            "powershell".to_string(),
            vec!["-Command".to_string(), script.to_string()],
        );
    }
    match shell {
        Some(sh) if !sh.trim().is_empty() => (sh, vec!["-c".to_string(), script.to_string()]),
        _ => (
            "sh".to_string(),
            vec!["-c".to_string(), script.to_string()],
        ),
    }
}

struct ShellProcess<'a> {
    spec: CommandSpec,
    io: CommandIo<'a>,
    child: Option<Child>,
    stdout: Option<Pipe>,
    stderr: Option<Pipe>,
    stdin: Option<(ChildStdin, Pipe)>,
}

impl ShellProcess<'_> {
    fn build(&self) -> Command {
        let (program, args) = shell_invocation(&self.spec.script());
        let mut cmd = Command::new(program);
        cmd.args(args)
            .env_clear()
            .envs(self.spec.env.iter().map(|(k, v)| (k, v)))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.spec.dir {
            cmd.current_dir(dir);
        }
        match &self.io.stdin {
            Some(HookInput::Inherit) => cmd.stdin(Stdio::inherit()),
            Some(HookInput::Bytes(_) | HookInput::Reader(_)) => cmd.stdin(Stdio::piped()),
            None => cmd.stdin(Stdio::null()),
        };
        cmd
    }
}

#[async_trait]
impl<'a> ShellCommand for ShellProcess<'a> {
    async fn run(&mut self) -> Result<(), CommandError> {
        self.start()?;
        self.wait().await
    }

    fn start(&mut self) -> Result<(), CommandError> {
        let mut child = self.build().spawn().map_err(|source| CommandError::Spawn {
            program: self.spec.name.clone(),
            source,
        })?;
        self.stdout = child.stdout.take().map(|p| Box::new(p) as Pipe);
        self.stderr = child.stderr.take().map(|p| Box::new(p) as Pipe);
        if let Some(stdin) = child.stdin.take() {
            self.stdin = match self.io.stdin.take() {
                Some(HookInput::Bytes(bytes)) => {
                    Some((stdin, Box::new(std::io::Cursor::new(bytes)) as Pipe))
                }
                Some(HookInput::Reader(reader)) => Some((stdin, reader)),
                Some(HookInput::Inherit) | None => None,
            };
        }
        self.child = Some(child);
        Ok(())
    }

    fn stdout_pipe(&mut self) -> Option<Pipe> {
        self.stdout.take()
    }

    fn stderr_pipe(&mut self) -> Option<Pipe> {
        self.stderr.take()
    }

    async fn wait(&mut self) -> Result<(), CommandError> {
        let stdout = self.stdout.take();
        let stderr = self.stderr.take();
        let stdin = self.stdin.take();
        let out_sink = reborrow(&mut self.io.stdout);
        let err_sink = reborrow(&mut self.io.stderr);

        tokio::try_join!(
            pump(stdout, out_sink),
            pump(stderr, err_sink),
            feed_stdin(stdin),
        )?;

        let child = self.child.as_mut().ok_or(CommandError::NotStarted)?;
        exit_result(child.wait().await?)
    }

    async fn combined_output(&mut self) -> Result<Vec<u8>, CommandError> {
        self.start()?;
        let combined = Mutex::new(Vec::new());
        let stdout = self.stdout.take();
        let stderr = self.stderr.take();
        let stdin = self.stdin.take();

        tokio::try_join!(
            collect(stdout, &combined),
            collect(stderr, &combined),
            feed_stdin(stdin),
        )?;

        let child = self.child.as_mut().ok_or(CommandError::NotStarted)?;
        exit_result(child.wait().await?)?;
        combined
            .into_inner()
            .map_err(|_| CommandError::Failed("output buffer lock poisoned".into()))
    }
}

fn exit_result(status: ExitStatus) -> Result<(), CommandError> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(CommandError::ExitStatus(code)),
        None => Err(CommandError::Signal),
    }
}

/// Copy a pipe into a writer until EOF. A missing writer still drains the pipe.
async fn pump(pipe: Option<Pipe>, mut sink: Option<StreamWriter<'_>>) -> std::io::Result<()> {
    let Some(mut pipe) = pipe else {
        return Ok(());
    };
    let mut buf = vec![0u8; 32 * 1024];
    loop {
        let n = pipe.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        if let Some(sink) = sink.as_mut() {
            sink.write_all(&buf[..n])?;
        }
    }
    if let Some(sink) = sink.as_mut() {
        sink.flush()?;
    }
    Ok(())
}

async fn collect(pipe: Option<Pipe>, out: &Mutex<Vec<u8>>) -> std::io::Result<()> {
    let Some(mut pipe) = pipe else {
        return Ok(());
    };
    let mut buf = vec![0u8; 32 * 1024];
    loop {
        let n = pipe.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        out.lock()
            .map_err(|_| std::io::Error::other("output buffer lock poisoned"))?
            .extend_from_slice(&buf[..n]);
    }
}

async fn feed_stdin(stdin: Option<(ChildStdin, Pipe)>) -> std::io::Result<()> {
    let Some((mut stdin, mut input)) = stdin else {
        return Ok(());
    };
    match tokio::io::copy(&mut input, &mut stdin).await.map(drop) {
        // The child may exit without reading its input.
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
    // stdin is dropped here, closing the pipe
}
