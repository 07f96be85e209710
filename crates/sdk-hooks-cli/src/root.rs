use std::path::{Path, PathBuf};

use sdk_hooks::loader::PROJECT_DIR;

/// Resolve the directory the hooks-file search starts from.
///
/// Priority:
/// 1. `--root` flag / `SDKHOOK_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.slack/`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_project_dir(&cwd).unwrap_or(cwd)
}

fn find_project_dir(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(PROJECT_DIR).is_dir())
        .map(Path::to_path_buf)
}
