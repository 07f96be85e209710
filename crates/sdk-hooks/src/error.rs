use std::path::PathBuf;

use thiserror::Error;

/// Extra context attached to a [`HookError`], typically captured stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    pub message: String,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum HookError {
    #[error("The command for '{name}' was not found")]
    NotFound { name: String },

    #[error("{message}")]
    InvocationFailed {
        message: String,
        details: Vec<ErrorDetail>,
    },

    #[error("no hooks file found searching upward from {}", start.display())]
    HooksFileNotFound { start: PathBuf },

    #[error("current directory is not an SDK project")]
    InvalidProjectDirectory,

    #[error("failed to load hooks file {}: {source}", path.display())]
    ConfigLoad {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid watch filter '{pattern}': {source}")]
    InvalidWatchFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HookError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            HookError::NotFound { .. } => "sdk_hook_not_found",
            HookError::InvocationFailed { .. } => "sdk_hook_invocation_failed",
            HookError::HooksFileNotFound { .. } => "hooks_json_location",
            HookError::InvalidProjectDirectory => "invalid_project_directory",
            HookError::ConfigLoad { .. } => "sdk_config_load",
            HookError::InvalidWatchFilter { .. } => "invalid_watch_filter",
            HookError::Io(_) => "io",
        }
    }

    pub fn details(&self) -> &[ErrorDetail] {
        match self {
            HookError::InvocationFailed { details, .. } => details,
            _ => &[],
        }
    }

    /// A hint for the user on how to recover, when one exists.
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            HookError::NotFound { .. } => Some(
                "Hook scripts are defined in the project's hooks file (.slack/hooks.json)",
            ),
            HookError::InvocationFailed { .. } | HookError::ConfigLoad { .. } => {
                Some("Check that the project's SDK and system dependencies are up-to-date")
            }
            HookError::HooksFileNotFound { .. } | HookError::InvalidProjectDirectory => {
                Some("A .slack/hooks.json file must be present in the project's root directory")
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HookError>;
