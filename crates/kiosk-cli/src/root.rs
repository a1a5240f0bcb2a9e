use kiosk_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the kiosk install root.
///
/// Priority:
/// 1. `--root` flag / `KIOSK_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `data/kiosk.yaml`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_install(&cwd).unwrap_or(cwd)
}

fn find_install(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| paths::settings_path(dir).is_file())
        .map(Path::to_path_buf)
}
