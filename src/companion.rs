//! Bopistrap companion launcher integration
//!
//! Bopistrap keeps its own copy of the Bopimo! client and reads
//! `override.cfg` from its own client directory. Instead of copying the store
//! we link Bopistrap's path to ours, so both launchers boot the mod loader
//! and see the same settings. Bopistrap only ever reads through the link.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{InstallerError, Result};
use crate::logging::log_info;
use crate::paths::OVERRIDE_STORE_FILE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionLink {
    client_dir: Option<PathBuf>,
}

impl CompanionLink {
    /// `client_dir` is `None` on platforms without Bopistrap support
    pub fn new(client_dir: Option<PathBuf>) -> Self {
        Self { client_dir }
    }

    /// Whether Bopistrap's client directory exists
    pub fn is_present(&self) -> bool {
        self.client_dir.as_deref().is_some_and(Path::is_dir)
    }

    /// Where Bopistrap expects its override store
    pub fn link_path(&self) -> Option<PathBuf> {
        self.client_dir.as_ref().map(|d| d.join(OVERRIDE_STORE_FILE))
    }

    /// Point Bopistrap's override store at `store`
    ///
    /// Returns `Ok(true)` when a link was created and `Ok(false)` when the
    /// companion is absent or `skip` is set.
    pub fn sync(&self, store: &Path, skip: bool) -> Result<bool> {
        if skip || !self.is_present() {
            return Ok(false);
        }
        let Some(link) = self.link_path() else {
            return Ok(false);
        };

        log_info("Creating symlink for Bopistrap");
        remove_link_file(&link).map_err(|source| InstallerError::LinkCreation {
            link: link.clone(),
            source,
        })?;
        create_file_link(store, &link).map_err(|source| InstallerError::LinkCreation {
            link: link.clone(),
            source,
        })?;
        Ok(true)
    }

    /// Remove Bopistrap's link; already gone is fine
    pub fn remove(&self) -> Result<()> {
        let Some(link) = self.link_path() else {
            return Ok(());
        };
        remove_link_file(&link).map_err(|source| InstallerError::Removal { path: link.clone(), source })
    }
}

/// Remove a file or symlink (dangling included), tolerating absence
fn remove_link_file(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            log_info(&format!("Removed {}", path.display()));
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn create_file_link(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_file_link(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
