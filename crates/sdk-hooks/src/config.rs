use std::fmt;
use std::path::PathBuf;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{HookError, Result};
use crate::protocol::ProtocolVersions;
use crate::script::HookScript;

// ---------------------------------------------------------------------------
// SdkCliConfig
// ---------------------------------------------------------------------------

/// Merged SDK configuration: the project's hooks file layered over the
/// defaults returned by the `get-hooks` hook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SdkCliConfig {
    /// Runtime label, e.g. `deno` or `node`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    #[serde(default)]
    pub hooks: SdkHooks,
    #[serde(default)]
    pub config: SdkConfigOptions,
    /// Project root the hooks file was found in.
    #[serde(skip)]
    pub working_directory: PathBuf,
}

impl SdkCliConfig {
    /// Fails unless the config was loaded from a project directory.
    pub fn exists(&self) -> Result<()> {
        if self.working_directory.as_os_str().is_empty() {
            return Err(HookError::InvalidProjectDirectory);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SdkHooks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SdkHooks {
    #[serde(default)]
    pub build: HookScript,
    #[serde(default)]
    pub check_update: HookScript,
    #[serde(default)]
    pub deploy: HookScript,
    #[serde(default)]
    pub doctor: HookScript,
    #[serde(default)]
    pub get_hooks: HookScript,
    #[serde(default)]
    pub get_manifest: HookScript,
    #[serde(default)]
    pub get_trigger: HookScript,
    #[serde(default)]
    pub install_update: HookScript,
    #[serde(default)]
    pub start: HookScript,
}

impl SdkHooks {
    /// Key in the hooks file, display name, and script for every hook.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &HookScript)> {
        [
            ("build", &self.build),
            ("check-update", &self.check_update),
            ("deploy", &self.deploy),
            ("doctor", &self.doctor),
            ("get-hooks", &self.get_hooks),
            ("get-manifest", &self.get_manifest),
            ("get-trigger", &self.get_trigger),
            ("install-update", &self.install_update),
            ("start", &self.start),
        ]
        .into_iter()
    }

    /// Look up a hook by its hooks-file key (`build`, `get-manifest`, ...).
    pub fn get(&self, key: &str) -> Option<&HookScript> {
        self.iter().find(|(k, _)| *k == key).map(|(_, s)| s)
    }

    /// Give every hook the name used in errors and by the executors.
    ///
    /// Names are fixed per slot; the default executor relies on `Start`.
    pub fn assign_names(&mut self) {
        self.build.name = "BuildProject".into();
        self.check_update.name = "CheckUpdate".into();
        self.deploy.name = "Deploy".into();
        self.doctor.name = "Doctor".into();
        self.get_hooks.name = "GetHooks".into();
        self.get_manifest.name = "GetManifest".into();
        self.get_trigger.name = "GetTrigger".into();
        self.install_update.name = "InstallUpdate".into();
        self.start.name = "Start".into();
    }
}

// ---------------------------------------------------------------------------
// SdkConfigOptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SdkConfigOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch: Option<WatchOpts>,
    #[serde(rename = "sdk-managed-connection-enabled", default)]
    pub sdk_managed_connection: bool,
    #[serde(rename = "trigger-paths", default)]
    pub trigger_paths: Vec<String>,
    #[serde(rename = "protocol-version", default)]
    pub supported_protocols: ProtocolVersions,
}

// ---------------------------------------------------------------------------
// WatchOpts
// ---------------------------------------------------------------------------

/// File watcher configuration.
///
/// Top-level `paths` / `filter-regex` are the legacy form of the `manifest`
/// section and are only consulted when `manifest` is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatchOpts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<WatchPaths>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<WatchPaths>,
    #[serde(rename = "filter-regex", default, skip_serializing_if = "String::is_empty")]
    pub filter_regex: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatchPaths {
    #[serde(rename = "filter-regex", default, skip_serializing_if = "String::is_empty")]
    pub filter_regex: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
}

/// Resolved view of one watch target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget<'a> {
    pub paths: &'a [String],
    pub filter_regex: &'a str,
    pub enabled: bool,
}

impl WatchTarget<'_> {
    /// Compile the filter, `None` when no filter is configured.
    pub fn filter(&self) -> Result<Option<Regex>> {
        if self.filter_regex.is_empty() {
            return Ok(None);
        }
        Regex::new(self.filter_regex)
            .map(Some)
            .map_err(|source| HookError::InvalidWatchFilter {
                pattern: self.filter_regex.to_string(),
                source,
            })
    }
}

impl WatchOpts {
    pub fn manifest_watch(&self) -> WatchTarget<'_> {
        match &self.manifest {
            Some(m) => WatchTarget {
                paths: &m.paths,
                filter_regex: &m.filter_regex,
                enabled: !m.paths.is_empty(),
            },
            None => WatchTarget {
                paths: &self.paths,
                filter_regex: &self.filter_regex,
                enabled: !self.paths.is_empty(),
            },
        }
    }

    pub fn app_watch(&self) -> WatchTarget<'_> {
        match &self.app {
            Some(a) => WatchTarget {
                paths: &a.paths,
                filter_regex: &a.filter_regex,
                enabled: !a.paths.is_empty(),
            },
            None => WatchTarget {
                paths: &[],
                filter_regex: "",
                enabled: false,
            },
        }
    }
}

impl fmt::Display for WatchPaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Paths:[{}] FilterRegex:{}}}",
            self.paths.join(" "),
            self.filter_regex
        )
    }
}

impl fmt::Display for WatchOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(m) = &self.manifest {
            parts.push(format!("Manifest:{m}"));
        } else if !self.paths.is_empty() || !self.filter_regex.is_empty() {
            parts.push(format!("Paths:[{}]", self.paths.join(" ")));
            parts.push(format!("FilterRegex:{}", self.filter_regex));
        }
        if let Some(a) = &self.app {
            parts.push(format!("App:{a}"));
        }
        write!(f, "{{{}}}", parts.join(" "))
    }
}
