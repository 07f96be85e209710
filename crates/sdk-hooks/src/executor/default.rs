use crate::error::{ErrorDetail, Result};
use crate::shell::{CommandIo, ExecInterface, ShellExec};
use crate::stream::{DebugWriter, IoStreams, TeeWriter};

use super::{invocation_failed, process_exec_opts, CommandLog, HookExecOpts};

/// Name of the hook whose stdout mixes log lines with a final response line.
const START_HOOK: &str = "Start";

/// Executor for the legacy protocol: the response is the trimmed stdout.
///
/// The `Start` hook is long-running and prints progress before its result,
/// so only its last line is the response; the lines before it are shown to
/// the user on the executor's output stream.
#[derive(Debug, Clone, Default)]
pub struct DefaultProtocolExecutor {
    io: IoStreams,
}

impl DefaultProtocolExecutor {
    pub fn new(io: IoStreams) -> Self {
        Self { io }
    }

    pub async fn execute(&self, mut opts: HookExecOpts<'_>) -> Result<String> {
        let prepared = process_exec_opts(&opts)?;
        let exec: &dyn ExecInterface = opts.exec.unwrap_or(&ShellExec);
        let spec = prepared.into_spec(opts.directory.clone());
        let _log = CommandLog::start(&spec);

        let streams_stderr = opts.stderr.is_some();
        let mut stdout = TeeWriter::new(
            opts.stdout.take(),
            DebugWriter::new(&opts.hook.name, "stdout"),
        );
        let mut stderr = TeeWriter::new(
            opts.stderr.take(),
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

        if let Err(err) = result {
            let mut details = Vec::new();
            if !streams_stderr {
                details.push(ErrorDetail::new(stderr.captured().trim()));
            }
            return Err(invocation_failed(&opts.hook, err, details));
        }

        let response = stdout.captured().trim().to_string();
        if opts.hook.name != START_HOOK {
            return Ok(response);
        }
        match response.rsplit_once('\n') {
            Some((before, last)) => {
                self.io.write_out(format!("{before}\n").as_bytes())?;
                Ok(last.to_string())
            }
            None => Ok(response),
        }
    }
}
