use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::log_warning;
use crate::paths::{self, ClientLayout};

pub const DEFAULT_METADATA_URL: &str = "https://bopimod.com/latest_release.json";
pub const DEFAULT_USER_AGENT: &str = concat!("Bopimod-Installer/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Settings File
// ============================================================================

/// Optional overrides read from `config.json`
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SettingsFile {
    pub metadata_url: Option<String>,
    pub target_dir: Option<PathBuf>,
    pub companion_dir: Option<PathBuf>,
    pub user_agent: Option<String>,
}

impl SettingsFile {
    pub fn default_path() -> Option<PathBuf> {
        paths::installer_config_dir().map(|d| d.join("config.json"))
    }

    /// Load from `path`; a missing or broken file falls back to defaults
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    log_warning(&format!("Ignoring invalid settings file {}: {}", path.display(), e));
                    Self::default()
                }
            },
            Err(e) => {
                log_warning(&format!("Could not read settings file {}: {}", path.display(), e));
                Self::default()
            }
        }
    }
}

// ============================================================================
// Run Flags
// ============================================================================

/// Behaviour switches given on the command line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunFlags {
    pub silent: bool,
    pub reinstall: bool,
    pub uninstall: bool,
    pub skip_companion: bool,
    pub quick_exit: bool,
}

// ============================================================================
// Settings
// ============================================================================

/// Everything a run needs, fixed before the orchestrator starts
#[derive(Clone, Debug)]
pub struct Settings {
    pub layout: ClientLayout,
    /// Companion client directory; `None` where the companion is unsupported
    pub companion_dir: Option<PathBuf>,
    pub metadata_url: String,
    pub user_agent: String,
    pub flags: RunFlags,
}

impl Settings {
    pub fn new(target_dir: impl Into<PathBuf>, flags: RunFlags) -> Self {
        Self {
            layout: ClientLayout::new(target_dir),
            companion_dir: None,
            metadata_url: DEFAULT_METADATA_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            flags,
        }
    }

    /// Build settings from discovered paths, a settings file and CLI input
    ///
    /// Precedence: `target_override` > settings file > platform default.
    /// Returns `None` when no client directory can be determined at all.
    pub fn resolve(file: SettingsFile, target_override: Option<PathBuf>, flags: RunFlags) -> Option<Self> {
        let target_dir = target_override
            .or(file.target_dir)
            .or_else(paths::default_client_dir)?;

        Some(Self {
            layout: ClientLayout::new(target_dir),
            companion_dir: file.companion_dir.or_else(paths::default_companion_dir),
            metadata_url: file.metadata_url.unwrap_or_else(|| DEFAULT_METADATA_URL.to_string()),
            user_agent: file.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            flags,
        })
    }

    pub fn with_companion_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.companion_dir = Some(dir.into());
        self
    }

    pub fn target_dir(&self) -> &Path {
        self.layout.root()
    }
}
