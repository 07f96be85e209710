//! In-memory [`ExecInterface`] for executor and loader tests.

use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::shell::{CommandError, CommandIo, CommandSpec, ExecInterface, Pipe, ShellCommand};

type Responder = Arc<dyn Fn(&CommandSpec) -> Vec<u8> + Send + Sync>;

struct MockState {
    stdout: Responder,
    stderr: Vec<u8>,
    chunk_size: usize,
    error: Option<String>,
    calls: Vec<CommandSpec>,
}

/// Records every command it creates and replays canned output.
///
/// Output is written to the command's stdout writer in `chunk_size` pieces to
/// mimic a pipe delivering a large payload over several reads.
#[derive(Clone)]
pub(crate) struct MockExec {
    state: Arc<Mutex<MockState>>,
}

impl MockExec {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                stdout: Arc::new(|_| Vec::new()),
                stderr: Vec::new(),
                chunk_size: 32 * 1024,
                error: None,
                calls: Vec::new(),
            })),
        }
    }

    pub(crate) fn with_stdout(self, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        self.with_responder(move |_| bytes.clone())
    }

    /// Build stdout from the command, e.g. to echo the boundary flag back.
    pub(crate) fn with_responder<F>(self, f: F) -> Self
    where
        F: Fn(&CommandSpec) -> Vec<u8> + Send + Sync + 'static,
    {
        self.state.lock().unwrap().stdout = Arc::new(f);
        self
    }

    pub(crate) fn with_stderr(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.state.lock().unwrap().stderr = bytes.into();
        self
    }

    pub(crate) fn with_chunk_size(self, size: usize) -> Self {
        self.state.lock().unwrap().chunk_size = size.max(1);
        self
    }

    /// Make every run fail with `message` after its output was written.
    pub(crate) fn failing(self, message: &str) -> Self {
        self.state.lock().unwrap().error = Some(message.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<CommandSpec> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn last_call(&self) -> CommandSpec {
        self.calls().pop().expect("no command was run")
    }
}

impl ExecInterface for MockExec {
    fn command<'a>(&self, spec: CommandSpec, io: CommandIo<'a>) -> Box<dyn ShellCommand + 'a> {
        Box::new(MockCommand {
            spec,
            io,
            state: self.state.clone(),
            started: false,
        })
    }
}

pub(crate) struct MockCommand<'a> {
    spec: CommandSpec,
    io: CommandIo<'a>,
    state: Arc<Mutex<MockState>>,
    started: bool,
}

impl MockCommand<'_> {
    fn output(&self) -> (Vec<u8>, Vec<u8>, usize, Option<String>) {
        let state = self.state.lock().unwrap();
        (
            (state.stdout)(&self.spec),
            state.stderr.clone(),
            state.chunk_size,
            state.error.clone(),
        )
    }
}

#[async_trait]
impl<'a> ShellCommand for MockCommand<'a> {
    async fn run(&mut self) -> Result<(), CommandError> {
        self.start()?;
        self.wait().await
    }

    fn start(&mut self) -> Result<(), CommandError> {
        self.state.lock().unwrap().calls.push(self.spec.clone());
        self.started = true;
        Ok(())
    }

    fn stdout_pipe(&mut self) -> Option<Pipe> {
        None
    }

    fn stderr_pipe(&mut self) -> Option<Pipe> {
        None
    }

    async fn wait(&mut self) -> Result<(), CommandError> {
        if !self.started {
            return Err(CommandError::NotStarted);
        }
        let (stdout, stderr, chunk_size, error) = self.output();
        if let Some(out) = self.io.stdout.as_mut() {
            for chunk in stdout.chunks(chunk_size) {
                out.write_all(chunk)?;
                tokio::task::yield_now().await;
            }
        }
        if let Some(err) = self.io.stderr.as_mut() {
            err.write_all(&stderr)?;
        }
        match error {
            Some(message) => Err(CommandError::Failed(message)),
            None => Ok(()),
        }
    }

    async fn combined_output(&mut self) -> Result<Vec<u8>, CommandError> {
        self.start()?;
        let (mut stdout, stderr, _, error) = self.output();
        stdout.extend_from_slice(&stderr);
        match error {
            Some(message) => Err(CommandError::Failed(message)),
            None => Ok(stdout),
        }
    }
}
