//! Bopimod Installer
//!
//! Library crate for installing, updating and removing the Bopimod mod loader
//! in a Bopimo! client directory. The binary is a thin command-line wrapper.

pub mod companion;
pub mod config;
pub mod error;
pub mod logging;
#[cfg(feature = "installer")]
pub mod orchestrator;
pub mod overlay;
pub mod paths;
#[cfg(feature = "installer")]
pub mod release;
pub mod state;
pub mod version;
