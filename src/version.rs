//! Dotted version comparison for update checks

use std::fmt;

use thiserror::Error;

/// Kind of update between an installed and a released version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Major,
    Minor,
    Patch,
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateKind::Major => write!(f, "Major"),
            UpdateKind::Minor => write!(f, "Minor"),
            UpdateKind::Patch => write!(f, "Patch"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("'{0}' is not a major.minor.patch version")]
    Arity(String),
    #[error("'{version}' has a non-numeric component '{component}'")]
    NotNumeric { version: String, component: String },
}

/// Parse "1.4.2" into its numeric triple
fn parse_triple(version: &str) -> Result<[u64; 3], VersionError> {
    let parts: Vec<&str> = version.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(VersionError::Arity(version.to_string()));
    }

    let mut triple = [0u64; 3];
    for (slot, part) in triple.iter_mut().zip(&parts) {
        *slot = part.parse().map_err(|_| VersionError::NotNumeric {
            version: version.to_string(),
            component: part.to_string(),
        })?;
    }
    Ok(triple)
}

/// Compare the installed version `installed` against `latest`
///
/// Returns the most significant component in which `latest` is ahead, or
/// `None` when there is nothing to update. A `latest` that is older than
/// `installed` is also `None`.
pub fn compare(installed: &str, latest: &str) -> Result<Option<UpdateKind>, VersionError> {
    let a = parse_triple(installed)?;
    let b = parse_triple(latest)?;

    let kinds = [UpdateKind::Major, UpdateKind::Minor, UpdateKind::Patch];
    for ((x, y), kind) in a.iter().zip(&b).zip(kinds) {
        if x < y {
            return Ok(Some(kind));
        }
        if x > y {
            return Ok(None);
        }
    }
    Ok(None)
}

/// Drop a pre-release suffix: "1.2.0-beta1" -> "1.2.0"
pub fn strip_prerelease(version: &str) -> &str {
    version.split('-').next().unwrap_or(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_comparison() {
        assert_eq!(compare("1.4.2", "1.5.0"), Ok(Some(UpdateKind::Minor)));
        assert_eq!(compare("2.0.0", "2.0.0"), Ok(None));
        assert_eq!(compare("1.9.9", "2.0.0"), Ok(Some(UpdateKind::Major)));
        assert_eq!(compare("1.4.2", "1.4.10"), Ok(Some(UpdateKind::Patch)));
    }

    #[test]
    fn test_older_remote_is_not_an_update() {
        assert_eq!(compare("1.5.0", "1.4.9"), Ok(None));
        assert_eq!(compare("2.0.0", "1.9.9"), Ok(None));
        assert_eq!(compare("1.0.3", "1.0.2"), Ok(None));
    }

    #[test]
    fn test_numeric_not_lexical() {
        // "10" sorts before "9" as text
        assert_eq!(compare("1.9.0", "1.10.0"), Ok(Some(UpdateKind::Minor)));
    }

    #[test]
    fn test_malformed_versions() {
        assert!(matches!(compare("1.4", "1.4.0"), Err(VersionError::Arity(_))));
        assert!(matches!(compare("1.4.0", "1.4.0.1"), Err(VersionError::Arity(_))));
        assert!(matches!(
            compare("1.x.0", "1.4.0"),
            Err(VersionError::NotNumeric { .. })
        ));
        assert!(compare("1.2.0-beta1", "1.2.0").is_err());
    }

    #[test]
    fn test_strip_prerelease() {
        assert_eq!(strip_prerelease("1.2.0-beta1"), "1.2.0");
        assert_eq!(strip_prerelease("1.2.0"), "1.2.0");
        assert_eq!(compare(strip_prerelease("1.2.0-beta1"), "1.2.0"), Ok(None));
    }
}
