//! Client directory discovery and the managed file layout

use std::path::{Path, PathBuf};

/// Mod loader scene the host boots into once patched
pub const ENTRY_POINT_FILE: &str = "GUMM_mod_loader.tscn";
/// Splash image shown while the modded client boots
pub const ICON_FILE: &str = "ModdedIcon.png";
pub const MODS_DIR: &str = "mods";
pub const OVERRIDE_STORE_FILE: &str = "override.cfg";

/// Default Bopimo! client directory
///
/// `%APPDATA%/Bopimo!/Client` on Windows, `~/.local/share/Bopimo!/Client` on Linux.
pub fn default_client_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("Bopimo!").join("Client"))
}

/// Default Bopistrap client directory (Windows only)
pub fn default_companion_dir() -> Option<PathBuf> {
    if cfg!(windows) {
        dirs::data_local_dir().map(|d| d.join("Bopistrap").join("Client"))
    } else {
        None
    }
}

/// Directory for installer settings
pub fn installer_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("bopimod-installer"))
}

/// Directory for per-run log files
pub fn installer_log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("bopimod-installer").join("logs"))
}

/// Paths of everything the installer manages inside a client directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientLayout {
    root: PathBuf,
}

impl ClientLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn override_store(&self) -> PathBuf {
        self.root.join(OVERRIDE_STORE_FILE)
    }

    pub fn entry_point(&self) -> PathBuf {
        self.root.join(ENTRY_POINT_FILE)
    }

    pub fn icon(&self) -> PathBuf {
        self.root.join(ICON_FILE)
    }

    pub fn mods_dir(&self) -> PathBuf {
        self.root.join(MODS_DIR)
    }

    /// Path as the host expects it inside override.cfg: forward slashes only
    pub fn host_path(path: &Path) -> String {
        path.to_string_lossy().replace('\\', "/")
    }
}
