//! Latest release lookup and package download
//!
//! `latest_release.json` names the current version and the zip package to
//! install. Looking up the version is cheap, so the update check does it on
//! its own and only downloads the package when there is something to install.

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use serde::Deserialize;

use crate::config::Settings;
use crate::error::{InstallerError, Result};
use crate::logging::log_download;
use crate::overlay::OverrideStore;
use crate::paths::{ClientLayout, OVERRIDE_STORE_FILE};

/// Release metadata as published by the endpoint
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub version: String,
    #[serde(rename = "file")]
    pub artifact_url: String,
}

/// Where releases come from
pub trait ReleaseSource {
    fn fetch_latest_metadata(&self) -> Result<Release>;
    fn fetch_artifact(&self, release: &Release) -> Result<Artifact>;
}

// ============================================================================
// HTTP Source
// ============================================================================

pub struct HttpReleaseSource {
    metadata_url: String,
    user_agent: String,
}

impl HttpReleaseSource {
    pub fn new(metadata_url: &str, user_agent: &str) -> Self {
        Self {
            metadata_url: metadata_url.to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.metadata_url, &settings.user_agent)
    }

    fn get(&self, url: &str) -> std::result::Result<ureq::Response, ureq::Error> {
        ureq::get(url).set("User-Agent", &self.user_agent).call()
    }
}

impl ReleaseSource for HttpReleaseSource {
    fn fetch_latest_metadata(&self) -> Result<Release> {
        let fail = |reason: String| InstallerError::MetadataFetch {
            url: self.metadata_url.clone(),
            reason,
        };

        let response = self.get(&self.metadata_url).map_err(|e| fail(e.to_string()))?;
        let release: Release = response.into_json().map_err(|e| fail(e.to_string()))?;
        Ok(release)
    }

    fn fetch_artifact(&self, release: &Release) -> Result<Artifact> {
        let fail = |reason: String| InstallerError::ArtifactDownload {
            url: release.artifact_url.clone(),
            reason,
        };

        log_download(&format!("Downloading Bopimod v{} from {}", release.version, release.artifact_url));
        let response = self.get(&release.artifact_url).map_err(|e| fail(e.to_string()))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| fail(e.to_string()))?;
        log_download(&format!("Downloaded {} bytes", bytes.len()));

        Artifact::from_bytes(bytes)
    }
}

// ============================================================================
// Artifact
// ============================================================================

/// A downloaded mod loader package, held in memory until extraction
pub struct Artifact {
    archive: zip::ZipArchive<Cursor<Vec<u8>>>,
}

impl Artifact {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| InstallerError::Extraction {
            reason: format!("not a readable zip archive: {}", e),
        })?;
        Ok(Self { archive })
    }

    /// Write the package into the client directory
    ///
    /// Every file is written as-is except the top-level `override.cfg`, which
    /// is returned parsed instead so its entries can be merged into the
    /// existing store rather than replacing it.
    pub fn extract_into(&mut self, layout: &ClientLayout) -> Result<Option<OverrideStore>> {
        let fail = |reason: String| InstallerError::Extraction { reason };
        let mut packaged_store = None;

        for index in 0..self.archive.len() {
            let mut entry = self.archive.by_index(index).map_err(|e| fail(e.to_string()))?;
            let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
                return Err(fail(format!("unsafe path in package: {}", entry.name())));
            };
            let out_path = layout.root().join(&relative);

            if entry.is_dir() {
                fs::create_dir_all(&out_path).map_err(|e| fail(format!("{}: {}", out_path.display(), e)))?;
                continue;
            }

            if relative == Path::new(OVERRIDE_STORE_FILE) {
                let mut content = String::new();
                entry
                    .read_to_string(&mut content)
                    .map_err(|e| fail(format!("{}: {}", OVERRIDE_STORE_FILE, e)))?;
                let store = OverrideStore::parse(&content)
                    .map_err(|e| fail(format!("packaged {}: {}", OVERRIDE_STORE_FILE, e)))?;
                packaged_store = Some(store);
                continue;
            }

            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent).map_err(|e| fail(format!("{}: {}", parent.display(), e)))?;
            }
            let mut file = fs::File::create(&out_path).map_err(|e| fail(format!("{}: {}", out_path.display(), e)))?;
            std::io::copy(&mut entry, &mut file).map_err(|e| fail(format!("{}: {}", out_path.display(), e)))?;
        }

        Ok(packaged_store)
    }
}
