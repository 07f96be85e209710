//! Hook executors, one per wire protocol.
//!
//! Both executors resolve a [`HookExecOpts`] into a single shell command,
//! run it to completion and turn its stdout into a response string. They
//! differ only in how the response is separated from everything else the hook
//! prints.

mod boundary;
mod default;
mod message_boundary;

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;

use tracing::debug;

use crate::config::SdkCliConfig;
use crate::error::{ErrorDetail, HookError, Result};
use crate::protocol::Protocol;
use crate::script::HookScript;
use crate::shell::{CommandError, CommandSpec, ExecInterface, HookInput};
use crate::stream::{IoStreams, StreamWriter};

pub use boundary::{BoundaryGenerator, RandomBoundary};
pub use default::DefaultProtocolExecutor;
pub use message_boundary::MessageBoundaryExecutor;

// ─── HookExecOpts ─────────────────────────────────────────────────────────

/// Everything one hook invocation needs.
#[derive(Default)]
pub struct HookExecOpts<'a> {
    pub hook: HookScript,
    /// Working directory of the child. Inherited when `None`.
    pub directory: Option<PathBuf>,
    /// Extra flags, rendered `--key="value"` in key order. Empty values are skipped.
    pub args: BTreeMap<String, String>,
    /// Variables set on top of the inherited environment.
    pub env: BTreeMap<String, String>,
    pub stdin: Option<HookInput>,
    /// Receives the hook's stdout as it is produced.
    pub stdout: Option<StreamWriter<'a>>,
    /// Receives the hook's stderr as it is produced. When absent, a failed
    /// run reports the captured stderr in the error details instead.
    pub stderr: Option<StreamWriter<'a>>,
    /// Process strategy; [`crate::shell::ShellExec`] when `None`.
    pub exec: Option<&'a dyn ExecInterface>,
}

/// A resolved hook command, ready to hand to an [`ExecInterface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommand {
    pub program: String,
    pub args: Vec<String>,
    /// The full environment of the child: this process's environment
    /// followed by the overrides.
    pub env: Vec<(OsString, OsString)>,
}

impl PreparedCommand {
    fn into_spec(self, dir: Option<PathBuf>) -> CommandSpec {
        CommandSpec {
            name: self.program,
            args: self.args,
            env: self.env,
            dir,
        }
    }
}

/// Resolve the hook's command, flags and environment.
///
/// Fails with [`HookError::NotFound`] when the hook has no command, before
/// anything is spawned.
pub fn process_exec_opts(opts: &HookExecOpts<'_>) -> Result<PreparedCommand> {
    let command = opts.hook.get()?;
    let mut tokens = command.split_whitespace();
    let Some(program) = tokens.next() else {
        return Err(HookError::NotFound {
            name: opts.hook.name.clone(),
        });
    };

    let mut args: Vec<String> = tokens.map(str::to_string).collect();
    args.extend(args_to_flags(&opts.args, cfg!(windows)));

    let env = std::env::vars_os()
        .chain(
            opts.env
                .iter()
                .map(|(k, v)| (OsString::from(k), OsString::from(v))),
        )
        .collect();

    Ok(PreparedCommand {
        program: program.to_string(),
        args,
        env,
    })
}

fn args_to_flags(args: &BTreeMap<String, String>, windows: bool) -> Vec<String> {
    args.iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("--{key}=\"{}\"", escape_quotes(value, windows)))
        .collect()
}

fn escape_quotes(value: &str, windows: bool) -> String {
    if windows {
        value.replace('"', "`\"")
    } else {
        value.replace('"', "\\\"")
    }
}

// ─── Shared helpers ───────────────────────────────────────────────────────

/// Logs the start of a hook command and, when dropped, its end.
struct CommandLog {
    line: String,
}

impl CommandLog {
    fn start(spec: &CommandSpec) -> Self {
        let line = format!("{} {}", spec.name, spec.args.join(" "));
        debug!("starting hook command: {line}");
        Self { line }
    }
}

impl Drop for CommandLog {
    fn drop(&mut self) {
        debug!("finished hook command: {}", self.line);
    }
}

fn invocation_failed(hook: &HookScript, err: CommandError, details: Vec<ErrorDetail>) -> HookError {
    HookError::InvocationFailed {
        message: format!("Error running '{}' command: {err}", hook.name),
        details,
    }
}

// ─── HookExecutor ─────────────────────────────────────────────────────────

/// The executor selected for a project's preferred protocol.
#[derive(Debug, Clone)]
pub enum HookExecutor {
    Default(DefaultProtocolExecutor),
    MessageBoundary(MessageBoundaryExecutor),
}

impl HookExecutor {
    /// Run a hook and return its response.
    pub async fn execute(&self, opts: HookExecOpts<'_>) -> Result<String> {
        match self {
            HookExecutor::Default(e) => e.execute(opts).await,
            HookExecutor::MessageBoundary(e) => e.execute(opts).await,
        }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            HookExecutor::Default(_) => Protocol::Default,
            HookExecutor::MessageBoundary(_) => Protocol::MessageBoundaries,
        }
    }
}

/// Pick the executor for the SDK's preferred protocol.
pub fn get_hook_executor(io: IoStreams, sdk_config: &SdkCliConfig) -> HookExecutor {
    match sdk_config.config.supported_protocols.preferred() {
        Protocol::MessageBoundaries => {
            HookExecutor::MessageBoundary(MessageBoundaryExecutor::new(io))
        }
        _ => HookExecutor::Default(DefaultProtocolExecutor::new(io)),
    }
}
