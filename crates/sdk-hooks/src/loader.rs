//! Hooks-file discovery and loading.
//!
//! A command may be run from anywhere inside a project, so the hooks file is
//! searched for from the start directory upward. The project file is then
//! layered over the defaults reported by the SDK's `get-hooks` hook.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::SdkCliConfig;
use crate::error::{HookError, Result};
use crate::executor::{DefaultProtocolExecutor, HookExecOpts};
use crate::shell::ExecInterface;
use crate::stream::IoStreams;

/// Directory marking a project root.
pub const PROJECT_DIR: &str = ".slack";
/// Hooks file inside [`PROJECT_DIR`].
pub const HOOKS_FILE: &str = "hooks.json";
/// Deprecated hooks file at the project root.
pub const LEGACY_HOOKS_FILE: &str = "slack.json";

/// Walk upward from `start` and return the path of the first hooks file.
///
/// The search stops with [`HookError::HooksFileNotFound`] at a directory that
/// has a `.slack` directory but no hooks file, at the home directory, or at
/// the filesystem root.
pub fn find_hooks_file(start: &Path) -> Result<PathBuf> {
    let home = home::home_dir();
    let mut dir = start.to_path_buf();
    loop {
        let hooks = dir.join(PROJECT_DIR).join(HOOKS_FILE);
        if hooks.is_file() {
            return Ok(hooks);
        }
        let legacy = dir.join(LEGACY_HOOKS_FILE);
        if legacy.is_file() {
            warn!(
                path = %legacy.display(),
                "{LEGACY_HOOKS_FILE} is deprecated, move hooks to {PROJECT_DIR}/{HOOKS_FILE}"
            );
            return Ok(legacy);
        }
        if dir.join(PROJECT_DIR).is_dir() || home.as_deref() == Some(dir.as_path()) {
            break;
        }
        if !dir.pop() {
            break;
        }
    }
    Err(HookError::HooksFileNotFound {
        start: start.to_path_buf(),
    })
}

/// Project root for a hooks file returned by [`find_hooks_file`].
fn project_root(hooks_file: &Path) -> PathBuf {
    let parent = hooks_file.parent().unwrap_or(Path::new("."));
    if parent.file_name().is_some_and(|name| name == PROJECT_DIR) {
        parent.parent().unwrap_or(parent).to_path_buf()
    } else {
        parent.to_path_buf()
    }
}

/// Merge `custom` over `defaults`. Objects merge key by key, recursively;
/// any other value in `custom` replaces the default.
pub fn merge_json(defaults: Value, custom: Value) -> Value {
    match (defaults, custom) {
        (Value::Object(mut base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                let merged = match base.remove(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, custom) => custom,
    }
}

/// Find, read and merge the project's SDK configuration.
///
/// When the file configures `get-hooks`, that hook is run with the default
/// protocol in the project root and its JSON output provides the defaults.
pub async fn load_sdk_config(
    start: &Path,
    io: &IoStreams,
    exec: &dyn ExecInterface,
) -> Result<SdkCliConfig> {
    let path = find_hooks_file(start)?;
    let root = project_root(&path);
    let text = std::fs::read_to_string(&path)?;
    let parse_err = |source: serde_json::Error| HookError::ConfigLoad {
        path: path.clone(),
        source,
    };

    let custom: Value = serde_json::from_str(&text).map_err(parse_err)?;
    let project: SdkCliConfig = serde_json::from_value(custom.clone()).map_err(parse_err)?;

    let mut merged = custom;
    if project.hooks.get_hooks.is_available() {
        let mut hook = project.hooks.get_hooks.clone();
        hook.name = "GetHooks".to_string();
        let opts = HookExecOpts {
            hook,
            directory: Some(root.clone()),
            exec: Some(exec),
            ..Default::default()
        };
        let response = DefaultProtocolExecutor::new(io.clone())
            .execute(opts)
            .await?;
        if !response.is_empty() {
            let defaults: Value = serde_json::from_str(&response).map_err(parse_err)?;
            merged = merge_json(defaults, merged);
        }
    }

    let mut config: SdkCliConfig = serde_json::from_value(merged).map_err(parse_err)?;
    config.hooks.assign_names();
    config.working_directory = root;
    debug!(
        path = %path.display(),
        runtime = config.runtime.as_deref().unwrap_or(""),
        protocol = %config.config.supported_protocols.preferred(),
        "initialized SDK config"
    );
    Ok(config)
}
