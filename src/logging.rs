//! Installer Logging System
//!
//! Leveled log lines written to a per-run log file and, unless the run is
//! silent, to the console.

use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use crate::paths;

static LOGGER: OnceLock<Arc<Mutex<InstallerLogger>>> = OnceLock::new();

// ============================================================================
// Log Levels
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Info,
    Action, // Requested operation, chosen path through the state machine
    Download,
    Install,
    Warning,
    Error,
}

impl LogLevel {
    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Info => "[INFO]",
            LogLevel::Action => "[ACTION]",
            LogLevel::Download => "[DOWNLOAD]",
            LogLevel::Install => "[INSTALL]",
            LogLevel::Warning => "[WARNING]",
            LogLevel::Error => "[ERROR]",
        }
    }
}

// ============================================================================
// Installer Logger
// ============================================================================

pub struct InstallerLogger {
    log_file: Option<File>,
    console: bool,
}

impl InstallerLogger {
    /// Logger that only prints, used until `init_logger` runs
    fn console_only() -> Self {
        Self {
            log_file: None,
            console: true,
        }
    }

    pub fn new(log_dir: Option<&Path>, silent: bool) -> Self {
        let log_file = log_dir.and_then(|dir| {
            let _ = fs::create_dir_all(dir);
            let timestamp = Local::now().format("%Y%m%d_%H%M%S");
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(format!("installer_{}.log", timestamp)))
                .ok()
        });

        let mut logger = Self {
            log_file,
            console: !silent,
        };

        let header = format!(
            "================================================================================\n\
             Bopimod Installer v{} - {} ({})\n\
             ================================================================================",
            env!("CARGO_PKG_VERSION"),
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            std::env::consts::OS,
        );
        if let Some(ref mut file) = logger.log_file {
            let _ = writeln!(file, "{}", header);
        }

        logger
    }

    fn write_raw(&mut self, msg: &str) {
        if let Some(ref mut file) = self.log_file {
            let _ = writeln!(file, "{}", msg);
            let _ = file.flush();
        }

        if self.console {
            println!("{}", msg);
        }
    }

    pub fn log(&mut self, level: LogLevel, message: &str) {
        let timestamp = Local::now().format("%H:%M:%S");
        let formatted = format!("[{}] {} {}", timestamp, level.prefix(), message);
        self.write_raw(&formatted);
    }
}

// ============================================================================
// Global Logger Access
// ============================================================================

/// Initialize the global logger (call once at startup)
///
/// Has no effect if something was already logged, since the console-only
/// fallback logger is installed on first use.
pub fn init_logger(silent: bool) {
    let log_dir = paths::installer_log_dir();
    LOGGER.get_or_init(|| Arc::new(Mutex::new(InstallerLogger::new(log_dir.as_deref(), silent))));
}

fn logger() -> Arc<Mutex<InstallerLogger>> {
    LOGGER
        .get_or_init(|| Arc::new(Mutex::new(InstallerLogger::console_only())))
        .clone()
}

fn log(level: LogLevel, message: &str) {
    if let Ok(mut log) = logger().lock() {
        log.log(level, message);
    }
}

// ============================================================================
// Convenience Logging Functions
// ============================================================================

pub fn log_info(message: &str) {
    log(LogLevel::Info, message);
}

pub fn log_action(message: &str) {
    log(LogLevel::Action, message);
}

pub fn log_download(message: &str) {
    log(LogLevel::Download, message);
}

pub fn log_install(message: &str) {
    log(LogLevel::Install, message);
}

pub fn log_warning(message: &str) {
    log(LogLevel::Warning, message);
}

pub fn log_error(message: &str) {
    log(LogLevel::Error, message);
}
