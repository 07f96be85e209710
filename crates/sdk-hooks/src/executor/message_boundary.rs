use std::fmt;
use std::sync::Arc;

use crate::error::{ErrorDetail, Result};
use crate::protocol::Protocol;
use crate::shell::{CommandIo, ExecInterface, ShellExec};
use crate::stream::{BoundariedWriter, DebugWriter, FilteredWriter, IoStreams, TeeWriter};

use super::boundary::{BoundaryGenerator, RandomBoundary};
use super::{invocation_failed, process_exec_opts, CommandLog, HookExecOpts};

/// Executor for the message-boundary protocol.
///
/// The hook is told a fresh boundary token through `--boundary` and writes
/// its response between two occurrences of it. Anything printed outside the
/// boundaries is passed through to the caller's stdout writer.
#[derive(Clone)]
pub struct MessageBoundaryExecutor {
    io: IoStreams,
    boundary: Arc<dyn BoundaryGenerator>,
}

impl MessageBoundaryExecutor {
    pub fn new(io: IoStreams) -> Self {
        Self::with_boundary_generator(io, RandomBoundary)
    }

    pub fn with_boundary_generator(io: IoStreams, boundary: impl BoundaryGenerator + 'static) -> Self {
        Self {
            io,
            boundary: Arc::new(boundary),
        }
    }

    pub async fn execute(&self, mut opts: HookExecOpts<'_>) -> Result<String> {
        let mut prepared = process_exec_opts(&opts)?;
        let exec: &dyn ExecInterface = opts.exec.unwrap_or(&ShellExec);

        let boundary = self.boundary.generate();
        prepared.args.push(format!("--protocol={}", Protocol::MessageBoundaries));
        prepared.args.push(format!("--boundary={boundary}"));
        let spec = prepared.into_spec(opts.directory.clone());
        let _log = CommandLog::start(&spec);

        let streams_stderr = opts.stderr.is_some();
        let mut stdout = BoundariedWriter::new(
            &boundary,
            opts.stdout.take(),
            DebugWriter::new(&opts.hook.name, "stdout"),
        );
        let mut filtered_stderr = FilteredWriter::new(&boundary, opts.stderr.take());
        let mut stderr = TeeWriter::new(
            Some(&mut filtered_stderr),
            DebugWriter::new(&opts.hook.name, "stderr"),
        );

        let result = {
            let io = CommandIo {
                stdout: Some(&mut stdout),
                stderr: Some(&mut stderr),
                stdin: opts.stdin.take(),
            };
            let mut cmd = exec.command(spec, io);
            cmd.run().await
        };

        let response = stdout.finish();
        let captured = stderr.captured();
        drop(stderr);
        filtered_stderr.finish()?;

        if let Err(err) = result {
            let details = match captured.trim() {
                text if !streams_stderr && !text.is_empty() => vec![ErrorDetail::new(text)],
                _ => Vec::new(),
            };
            return Err(invocation_failed(&opts.hook, err, details));
        }
        Ok(response?)
    }
}

impl fmt::Debug for MessageBoundaryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBoundaryExecutor")
            .field("io", &self.io)
            .finish_non_exhaustive()
    }
}
