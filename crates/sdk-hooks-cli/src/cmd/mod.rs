pub mod hooks;
pub mod protocol;
pub mod run;

use anyhow::Context;
use sdk_hooks::{load_sdk_config, IoStreams, SdkCliConfig, ShellExec};
use std::path::Path;

/// Current-thread runtime for a single command.
pub fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")
}

/// Load the project's merged SDK configuration.
pub async fn load_config(root: &Path, io: &IoStreams) -> anyhow::Result<SdkCliConfig> {
    load_sdk_config(root, io, &ShellExec)
        .await
        .with_context(|| format!("failed to load SDK config from {}", root.display()))
}
