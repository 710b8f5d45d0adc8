//! Config path resolution helpers.

use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "hoist.toml";

/// Directory holding hoist.toml under the platform config dir.
pub fn global_config_dir() -> anyhow::Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("hoist"))
}

/// The explicit path when given, otherwise hoist.toml in `global_dir`.
pub fn config_path(explicit: Option<&Path>, global_dir: &Path) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => global_dir.join(CONFIG_FILE_NAME),
    }
}
