//! Bopimod Installer
//!
//! Installs, updates or removes the Bopimod mod loader for Bopimo!.
//! The process exit code is the `ExitResult` of the run.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use clap::Parser;

use bopimod_installer::config::{RunFlags, Settings, SettingsFile};
use bopimod_installer::error::{ExitResult, InstallerError, RunError};
use bopimod_installer::logging::{init_logger, log_error, log_info};
use bopimod_installer::orchestrator::Orchestrator;
use bopimod_installer::release::HttpReleaseSource;

#[derive(Parser, Debug)]
#[command(
    name = "Bopimod! Installer",
    version,
    about = "Installs/Updates Bopimod. A Mod Loader for Bopimo! based on GUMM"
)]
struct Cli {
    /// Print nothing to the console
    #[arg(short, long)]
    silent: bool,

    /// Install again even if Bopimod is already installed
    #[arg(short, long)]
    reinstall: bool,

    /// Remove Bopimod from the client directory
    #[arg(short, long)]
    uninstall: bool,

    /// Do not link Bopistrap's override.cfg to the installed one
    #[arg(long)]
    skip_bopistrap: bool,

    /// Exit right away instead of waiting for Enter
    #[arg(long)]
    quick_exit: bool,

    /// Bopimo! client directory to use instead of the detected one
    #[arg(long, value_name = "PATH")]
    target_dir: Option<PathBuf>,

    /// Installer settings file (JSON)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    fn flags(&self) -> RunFlags {
        RunFlags {
            silent: self.silent,
            reinstall: self.reinstall,
            uninstall: self.uninstall,
            skip_companion: self.skip_bopistrap,
            quick_exit: self.quick_exit,
        }
    }
}

fn run(cli: &Cli) -> Result<ExitResult, RunError> {
    let flags = cli.flags();

    let settings_file = cli
        .config
        .clone()
        .or_else(SettingsFile::default_path)
        .map(|path| SettingsFile::load(&path))
        .unwrap_or_default();

    let Some(settings) = Settings::resolve(settings_file, cli.target_dir.clone(), flags) else {
        return Err(RunError::new(
            None,
            InstallerError::TargetNotFound {
                path: PathBuf::from("Bopimo!/Client"),
            },
        ));
    };

    log_info(&format!(
        "Bopimo! Mod Loader Installer v{}",
        env!("CARGO_PKG_VERSION")
    ));

    let source = HttpReleaseSource::from_settings(&settings);
    let outcome = Orchestrator::new(&settings, source).run()?;
    log_info(&outcome.message());
    Ok(outcome.exit_result())
}

/// Keep a double-clicked console window open until the user has read it
fn wait_for_enter() {
    if !io::stdin().is_terminal() {
        return;
    }
    print!("Press Enter to exit...");
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.silent);

    let result = match run(&cli) {
        Ok(result) => result,
        Err(e) => {
            if matches!(e.error, InstallerError::TargetNotFound { .. }) {
                log_error("You don't have Bopimo! installed. Exiting...");
            }
            log_error(&e.to_string());
            e.exit_result()
        }
    };

    if !cli.silent && !cli.quick_exit {
        wait_for_enter();
    }
    std::process::exit(result.code());
}
