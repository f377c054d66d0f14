//! Installation state detection
//!
//! Every query checks the filesystem again; nothing is cached.

use std::path::Path;

use crate::companion::CompanionLink;
use crate::config::Settings;
use crate::paths::ClientLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    /// The Bopimo! client directory itself is missing
    TargetMissing,
    NotInstalled,
    /// Both the override store and the entry-point scene exist
    Installed,
}

/// Snapshot of the client directory and companion launcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Installation {
    pub state: InstallState,
    pub companion_present: bool,
}

impl Installation {
    /// Bopistrap is there but the mod loader is not
    pub fn companion_only(&self) -> bool {
        self.companion_present && self.state == InstallState::NotInstalled
    }
}

pub fn exists(target_dir: &Path) -> bool {
    target_dir.is_dir()
}

pub fn is_installed(layout: &ClientLayout) -> bool {
    layout.override_store().is_file() && layout.entry_point().is_file()
}

pub fn has_companion(companion: &CompanionLink) -> bool {
    companion.is_present()
}

/// Classify the target described by `settings`
pub fn detect(settings: &Settings) -> Installation {
    let state = if !exists(settings.target_dir()) {
        InstallState::TargetMissing
    } else if is_installed(&settings.layout) {
        InstallState::Installed
    } else {
        InstallState::NotInstalled
    };

    Installation {
        state,
        companion_present: has_companion(&CompanionLink::new(settings.companion_dir.clone())),
    }
}
