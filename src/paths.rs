//! Config file location
//!
//! ## Resolution order
//!
//! 1. An explicit `--config` path.
//! 2. **Local mode**: `config.yaml` or `appsettings.json` in the current
//!    working directory, if either exists.
//! 3. **Installed mode** (default): `config.yaml` in the per-user config
//!    directory (`%APPDATA%\midi-letters`, `~/.config/midi-letters`, ...).

use std::path::{Path, PathBuf};
use tracing::debug;

/// Application name used for directories in installed mode
const APP_NAME: &str = "midi-letters";

/// File names recognized in the working directory, in priority order
const LOCAL_CANDIDATES: [&str; 2] = ["config.yaml", "appsettings.json"];

/// Where the configuration lives and how it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// Path to the configuration file
    pub config: PathBuf,
    /// Whether the file was picked from the working directory or flag
    pub is_local: bool,
}

impl AppPaths {
    /// Resolve the config path from the CLI flag and the environment
    pub fn detect(explicit: Option<&Path>) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::resolve(explicit, &cwd, dirs::config_dir())
    }

    fn resolve(explicit: Option<&Path>, cwd: &Path, config_dir: Option<PathBuf>) -> Self {
        if let Some(path) = explicit {
            return Self {
                config: path.to_path_buf(),
                is_local: true,
            };
        }

        if let Some(local) = LOCAL_CANDIDATES
            .iter()
            .map(|name| cwd.join(name))
            .find(|p| p.exists())
        {
            debug!("Using config from working directory: {}", local.display());
            return Self {
                config: local,
                is_local: true,
            };
        }

        let base = config_dir.unwrap_or_else(|| cwd.to_path_buf());
        Self {
            config: base.join(APP_NAME).join("config.yaml"),
            is_local: false,
        }
    }
}
