//! Install / Update / Reinstall / Uninstall state machine
//!
//! [`Orchestrator::run`] inspects the client directory once, picks an
//! [`Operation`] from the flags and the detected [`InstallState`], and carries
//! it out. It never exits the process: the outcome or the failure goes back
//! to the caller, which owns the exit code.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::companion::CompanionLink;
use crate::config::{RunFlags, Settings};
use crate::error::{ExitResult, InstallerError, Operation, Result, RunError};
use crate::logging::{log_action, log_info, log_install};
use crate::overlay::{self, Section, ValueChange};
use crate::paths::ClientLayout;
use crate::release::{Release, ReleaseSource};
use crate::state::{self, InstallState};
use crate::version::{self, UpdateKind};

const APPLICATION_SECTION: &str = "application";
const MAIN_SCENE_KEY: &str = "run/main_scene";
const SPLASH_KEY: &str = "boot_splash/image";
const MODLOADER_SECTION: &str = "modloader";
const VERSION_KEY: &str = "version_string";
const AUTOLOAD_SECTION: &str = "autoload";

// ============================================================================
// Transitions
// ============================================================================

impl Operation {
    /// Pick the operation for an existing client directory
    ///
    /// Reinstall wins over everything, uninstall is only considered when not
    /// reinstalling. `None` means an uninstall was requested but there is
    /// nothing installed.
    pub fn select(flags: &RunFlags, state: InstallState) -> Option<Operation> {
        if flags.reinstall {
            return Some(Operation::Reinstall);
        }
        match (state, flags.uninstall) {
            (InstallState::Installed, true) => Some(Operation::Uninstall),
            (InstallState::Installed, false) => Some(Operation::Update),
            (_, false) => Some(Operation::Install),
            (_, true) => None,
        }
    }
}

/// How a successful run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Installed { version: String },
    Updated { from: String, to: String, kind: UpdateKind },
    Reinstalled { version: String },
    Uninstalled,
    UpToDate { version: String },
    NothingToUninstall,
}

impl Outcome {
    pub fn exit_result(&self) -> ExitResult {
        match self {
            Outcome::Installed { .. } => ExitResult::InstallSuccess,
            Outcome::Updated { .. } => ExitResult::UpdateSuccess,
            Outcome::Reinstalled { .. } => ExitResult::ReinstallSuccess,
            Outcome::Uninstalled => ExitResult::UninstallSuccess,
            Outcome::UpToDate { .. } | Outcome::NothingToUninstall => ExitResult::Unchanged,
        }
    }

    /// One-line status for the console
    pub fn message(&self) -> String {
        match self {
            Outcome::Installed { version } => format!("Bopimod! v{} has been installed.", version),
            Outcome::Updated { from, to, .. } => format!("Bopimod! has been updated from v{} to v{}.", from, to),
            Outcome::Reinstalled { version } => format!("Bopimod! v{} has been reinstalled.", version),
            Outcome::Uninstalled => "Bopimod! has been removed.".to_string(),
            Outcome::UpToDate { .. } => "No updates found.".to_string(),
            Outcome::NothingToUninstall => {
                "There is nothing to uninstall. If there IS an install, you might need to reinstall the mod loader."
                    .to_string()
            }
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

pub struct Orchestrator<'a, S: ReleaseSource> {
    settings: &'a Settings,
    source: S,
    companion: CompanionLink,
}

impl<'a, S: ReleaseSource> Orchestrator<'a, S> {
    pub fn new(settings: &'a Settings, source: S) -> Self {
        Self {
            settings,
            source,
            companion: CompanionLink::new(settings.companion_dir.clone()),
        }
    }

    fn layout(&self) -> &ClientLayout {
        &self.settings.layout
    }

    pub fn run(&self) -> std::result::Result<Outcome, RunError> {
        let installation = state::detect(self.settings);

        if installation.state == InstallState::TargetMissing {
            return Err(RunError::new(
                None,
                InstallerError::TargetNotFound {
                    path: self.settings.target_dir().to_path_buf(),
                },
            ));
        }
        if installation.companion_only() {
            log_info("Bopistrap is installed, but Bopimod is not");
        }

        let Some(operation) = Operation::select(&self.settings.flags, installation.state) else {
            log_action("Uninstall requested, but Bopimod is not installed");
            return Ok(Outcome::NothingToUninstall);
        };

        log_action(&format!("{:?} in {}", operation, self.settings.target_dir().display()));
        self.perform(operation).map_err(|e| RunError::new(Some(operation), e))
    }

    fn perform(&self, operation: Operation) -> Result<Outcome> {
        let skip_companion = self.settings.flags.skip_companion;
        match operation {
            Operation::Install => {
                let release = self.install(None, skip_companion)?;
                Ok(Outcome::Installed { version: release.version })
            }
            Operation::Reinstall => {
                let release = self.install(None, skip_companion)?;
                Ok(Outcome::Reinstalled { version: release.version })
            }
            Operation::Update => self.update(),
            Operation::Uninstall => {
                self.uninstall()?;
                Ok(Outcome::Uninstalled)
            }
        }
    }

    /// Download and unpack the package, then point the host at the mod loader
    ///
    /// Uses `release` when the caller already resolved it.
    fn install(&self, release: Option<Release>, skip_companion: bool) -> Result<Release> {
        let release = match release {
            Some(release) => release,
            None => self.source.fetch_latest_metadata()?,
        };
        let mut artifact = self.source.fetch_artifact(&release)?;

        let layout = self.layout();
        let store = layout.override_store();
        log_install(&format!("Installing to \"{}\"", layout.root().display()));

        let packaged = artifact.extract_into(layout)?.unwrap_or_default();
        for (section, entries) in packaged.sections() {
            for (key, value) in entries.iter() {
                self.apply(&store, section, key, value)?;
            }
        }

        // A stale version_string would make every later update check fire again
        if packaged.get(MODLOADER_SECTION, VERSION_KEY).is_none() {
            self.apply(&store, MODLOADER_SECTION, VERSION_KEY, &overlay::quote(&release.version))?;
        }

        let main_scene = overlay::quote(&ClientLayout::host_path(&layout.entry_point()));
        let splash = overlay::quote(&ClientLayout::host_path(&layout.icon()));
        self.apply(&store, APPLICATION_SECTION, MAIN_SCENE_KEY, &main_scene)?;
        self.apply(&store, APPLICATION_SECTION, SPLASH_KEY, &splash)?;

        if self.companion.sync(&store, skip_companion)? {
            log_install("Bopistrap now shares the Bopimod override store");
        }

        Ok(release)
    }

    fn update(&self) -> Result<Outcome> {
        let store = self.layout().override_store();

        let stored = overlay::get_value(&store, MODLOADER_SECTION, VERSION_KEY)?;
        let installed = overlay::unquote(&stored).to_string();
        let release = self.source.fetch_latest_metadata()?;

        log_info(&format!("Installed version: v{}", installed));
        log_info(&format!("Latest version: v{}", release.version));

        let Some(kind) = version::compare(version::strip_prerelease(&installed), &release.version)? else {
            return Ok(Outcome::UpToDate { version: installed });
        };
        log_info(&format!("New {} update found!", kind));

        // The package ships its own [autoload] defaults; keep the user's entries
        let autoloads = match overlay::get_section(&store, AUTOLOAD_SECTION) {
            Ok(section) => section,
            Err(InstallerError::SectionNotFound { .. }) => Section::default(),
            Err(e) => return Err(e),
        };

        let release = self.install(Some(release), true)?;

        for (key, value) in autoloads.iter() {
            self.apply(&store, AUTOLOAD_SECTION, key, value)?;
        }

        Ok(Outcome::Updated {
            from: installed,
            to: release.version,
            kind,
        })
    }

    fn uninstall(&self) -> Result<()> {
        let layout = self.layout();
        log_install("Uninstalling...");

        self.companion.remove()?;
        remove_dir_if_exists(&layout.mods_dir())?;
        remove_file_if_exists(&layout.icon())?;
        remove_file_if_exists(&layout.override_store())?;
        remove_file_if_exists(&layout.entry_point())?;
        Ok(())
    }

    /// Set one store value and report what changed
    fn apply(&self, store: &Path, section: &str, key: &str, value: &str) -> Result<()> {
        match overlay::set_value(store, section, key, value)? {
            ValueChange::Added => log_install(&format!("+ [{}]: {} = {}", section, key, value)),
            ValueChange::Changed { previous } => log_install(&format!("~ {} -> {}", previous, value)),
            ValueChange::Unchanged => {}
        }
        Ok(())
    }
}

fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            log_install(&format!("Removed {}", path.display()));
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(InstallerError::Removal {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            log_install(&format!("Removed {}", path.display()));
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(InstallerError::Removal {
            path: path.to_path_buf(),
            source,
        }),
    }
}
