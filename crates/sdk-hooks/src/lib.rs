//! `sdk-hooks`: runs a project's SDK hook scripts and reads their responses.
//!
//! A hook is a shell command configured in the project's `.slack/hooks.json`
//! (for example `deno run -q manifest.ts`). The CLI runs it as a child process
//! and extracts a text response from its stdout using one of two wire
//! protocols, negotiated from the SDK's advertised `protocol-version` list.
//!
//! # Architecture
//!
//! ```text
//! .slack/hooks.json ──► loader ──► SdkCliConfig
//!                                      │ supported_protocols.preferred()
//!                                      ▼
//! HookExecOpts ──────────────► HookExecutor ─┬─ DefaultProtocolExecutor
//!                                            └─ MessageBoundaryExecutor
//!                                      │
//!                                      ▼
//!                           ExecInterface / ShellCommand
//!                                      │  `$SHELL -c "<command> <flags>"`
//!                                      ▼
//!                     stdout/stderr ──► stream writers ──► response
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use sdk_hooks::{get_hook_executor, load_sdk_config, HookExecOpts, IoStreams, ShellExec};
//!
//! let io = IoStreams::stdout();
//! let config = load_sdk_config(&std::env::current_dir()?, &io, &ShellExec).await?;
//! let executor = get_hook_executor(io, &config);
//! let manifest = executor
//!     .execute(HookExecOpts {
//!         hook: config.hooks.get_manifest.clone(),
//!         directory: Some(config.working_directory.clone()),
//!         ..Default::default()
//!     })
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod loader;
pub mod protocol;
pub mod script;
pub mod shell;
pub mod stream;

#[cfg(test)]
pub(crate) mod mock;

pub use config::{SdkCliConfig, SdkConfigOptions, SdkHooks, WatchOpts, WatchPaths};
pub use error::{ErrorDetail, HookError, Result};
pub use executor::{
    get_hook_executor, process_exec_opts, BoundaryGenerator, DefaultProtocolExecutor,
    HookExecOpts, HookExecutor, MessageBoundaryExecutor, PreparedCommand, RandomBoundary,
};
pub use loader::{find_hooks_file, load_sdk_config};
pub use protocol::{Protocol, ProtocolVersions};
pub use script::HookScript;
pub use shell::{CommandError, ExecInterface, HookInput, ShellCommand, ShellExec};
pub use stream::{IoStreams, SharedBuffer, HOOK_LOG_TARGET};
