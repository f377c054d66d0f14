//! Override store (override.cfg) reading and patching
//!
//! The host reads `override.cfg` from its client directory on startup and
//! lets it override project settings, which is how the mod loader takes over
//! the boot scene. The file is ini-like:
//!
//! ```text
//! [application]
//! run/main_scene = "/home/user/.local/share/Bopimo!/Client/GUMM_mod_loader.tscn"
//!
//! [autoload]
//! Foo = "*res://foo.tscn"
//! ```
//!
//! Keys are case-sensitive and values are kept verbatim (including quotes),
//! so that every section and key this tool does not touch survives a rewrite.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{InstallerError, Result};

// ============================================================================
// Store Types
// ============================================================================

/// One `[section]` of the store, entries in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    entries: Vec<(String, String)>,
}

impl Section {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a key, returning the previous value if there was one
    pub fn set(&mut self, key: &str, value: &str) -> Option<String> {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value.to_string())),
            None => {
                self.entries.push((key.to_string(), value.to_string()));
                None
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The whole override store, sections in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideStore {
    sections: Vec<(String, Section)>,
}

/// Syntax error while parsing the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub reason: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.reason)
    }
}

impl OverrideStore {
    /// Parse store content
    pub fn parse(content: &str) -> std::result::Result<Self, ParseError> {
        let mut store = Self::default();
        let mut current: Option<usize> = None;
        // Entry that indented continuation lines extend
        let mut last_key: Option<usize> = None;

        for (index, raw) in content.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = raw.trim();
            let indented = raw.starts_with(|c: char| c.is_whitespace());

            if trimmed.is_empty() && !indented {
                last_key = None;
                continue;
            }
            if trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            // Indented lines continue the previous value; whitespace-only ones are empty value lines
            if indented {
                if let (Some(section), Some(entry)) = (current, last_key) {
                    let value = &mut store.sections[section].1.entries[entry].1;
                    value.push('\n');
                    value.push_str(trimmed);
                    continue;
                }
                if trimmed.is_empty() {
                    continue;
                }
            }

            if let Some(name) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                current = Some(store.section_index_or_insert(name.trim()));
                last_key = None;
                continue;
            }

            let Some(section) = current else {
                return Err(ParseError {
                    line: line_no,
                    reason: "entry before any [section] header".to_string(),
                });
            };

            let Some(split) = trimmed.find(['=', ':']) else {
                return Err(ParseError {
                    line: line_no,
                    reason: format!("expected 'key = value', found '{}'", trimmed),
                });
            };

            let key = trimmed[..split].trim();
            if key.is_empty() {
                return Err(ParseError {
                    line: line_no,
                    reason: "empty key".to_string(),
                });
            }
            let value = trimmed[split + 1..].trim();

            let entries = &mut store.sections[section].1;
            entries.set(key, value);
            last_key = entries.entries.iter().position(|(k, _)| k == key);
        }

        // Whitespace-only lines after a value belong to the gap, not the value
        for (_, section) in &mut store.sections {
            for (_, value) in &mut section.entries {
                let kept = value.trim_end_matches('\n').len();
                value.truncate(kept);
            }
        }

        Ok(store)
    }

    /// Load the store from disk; a missing file is an empty store
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(InstallerError::ConfigRead {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };

        Self::parse(&content).map_err(|e| InstallerError::ConfigRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Write the whole store back to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_string()).map_err(|source| InstallerError::ConfigWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?.get(key)
    }

    /// Set a value, creating the section if needed; returns the previous value
    pub fn set(&mut self, section: &str, key: &str, value: &str) -> Option<String> {
        let index = self.section_index_or_insert(section);
        self.sections[index].1.set(key, value)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(n, _)| n.as_str())
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.sections.iter().map(|(n, s)| (n.as_str(), s))
    }

    fn section_index_or_insert(&mut self, name: &str) -> usize {
        match self.sections.iter().position(|(n, _)| n == name) {
            Some(index) => index,
            None => {
                self.sections.push((name.to_string(), Section::default()));
                self.sections.len() - 1
            }
        }
    }
}

impl fmt::Display for OverrideStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, section) in &self.sections {
            writeln!(f, "[{}]", name)?;
            for (key, value) in section.iter() {
                writeln!(f, "{} = {}", key, value.replace('\n', "\n\t"))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ============================================================================
// File Operations
// ============================================================================

/// What `set_value` did to the key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueChange {
    Added,
    Changed { previous: String },
    Unchanged,
}

/// Check that an entry reads back unchanged once written
///
/// Names and value lines are trimmed when parsed, `=`/`:` end a key, `]`
/// ends a section name, and continuation lines starting with a comment
/// prefix are skipped.
fn validate_entry(section: &str, key: &str, value: &str) -> Result<()> {
    let invalid = |reason: &str| InstallerError::InvalidEntry {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if section.is_empty() || section != section.trim() || section.contains([']', '\n']) {
        return Err(invalid("malformed section name"));
    }
    if key.is_empty() || key != key.trim() {
        return Err(invalid("key is empty or padded with whitespace"));
    }
    if key.contains(['=', ':', '\n']) || key.starts_with(['[', '#', ';']) {
        return Err(invalid("key contains a separator or starts like a header or comment"));
    }

    if value.ends_with('\n') {
        return Err(invalid("value ends with a newline"));
    }
    for (index, line) in value.split('\n').enumerate() {
        if line != line.trim() {
            return Err(invalid("value line padded with whitespace"));
        }
        if index > 0 && line.starts_with(['#', ';']) {
            return Err(invalid("value continuation line starts like a comment"));
        }
    }
    Ok(())
}

/// Set `[section] key = value` in the store file at `path`
///
/// Loads, patches and rewrites the whole file. The file is left untouched
/// when the key already holds `value`. Entries that would not read back
/// exactly as given are rejected with `InvalidEntry`.
pub fn set_value(path: &Path, section: &str, key: &str, value: &str) -> Result<ValueChange> {
    validate_entry(section, key, value)?;
    let mut store = OverrideStore::load(path)?;

    let change = match store.set(section, key, value) {
        None => ValueChange::Added,
        Some(previous) if previous == value => ValueChange::Unchanged,
        Some(previous) => ValueChange::Changed { previous },
    };

    if change != ValueChange::Unchanged {
        store.save(path)?;
    }
    Ok(change)
}

/// Read a whole section from the store file at `path`
pub fn get_section(path: &Path, section: &str) -> Result<Section> {
    OverrideStore::load(path)?
        .section(section)
        .cloned()
        .ok_or_else(|| InstallerError::SectionNotFound {
            section: section.to_string(),
        })
}

/// Read one value from the store file at `path`
pub fn get_value(path: &Path, section: &str, key: &str) -> Result<String> {
    let store = OverrideStore::load(path)?;
    let section_entries = store
        .section(section)
        .ok_or_else(|| InstallerError::SectionNotFound {
            section: section.to_string(),
        })?;

    section_entries
        .get(key)
        .map(str::to_string)
        .ok_or_else(|| InstallerError::KeyNotFound {
            section: section.to_string(),
            key: key.to_string(),
        })
}

/// Strip one leading and one trailing double quote
pub fn unquote(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

/// Wrap a value in double quotes, the way the host writes string literals
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[application]
config/name = "Bopimo!"
run/main_scene = "res://main.tscn"

[autoload]
Foo = "*res://foo.tscn"
foo = "*res://lower.tscn"

[display]
window/size/viewport_width = 1920
"#;

    #[test]
    fn test_parse_sections_and_keys() {
        let store = OverrideStore::parse(SAMPLE).unwrap();
        let names: Vec<&str> = store.section_names().collect();
        assert_eq!(names, vec!["application", "autoload", "display"]);
        assert_eq!(store.get("application", "config/name"), Some("\"Bopimo!\""));
        assert_eq!(store.get("display", "window/size/viewport_width"), Some("1920"));
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let store = OverrideStore::parse(SAMPLE).unwrap();
        let autoload = store.section("autoload").unwrap();
        assert_eq!(autoload.iter().count(), 2);
        assert_eq!(autoload.get("Foo"), Some("\"*res://foo.tscn\""));
        assert_eq!(autoload.get("foo"), Some("\"*res://lower.tscn\""));
        assert_eq!(autoload.get("FOO"), None);
    }

    #[test]
    fn test_serialize_preserves_order() {
        let store = OverrideStore::parse(SAMPLE).unwrap();
        let reparsed = OverrideStore::parse(&store.to_string()).unwrap();
        assert_eq!(store, reparsed);
        assert!(store.to_string().starts_with("[application]\nconfig/name = \"Bopimo!\"\n"));
    }

    #[test]
    fn test_continuation_lines() {
        let content = "[autoload]\nList = [\n\t\"a\",\n\t\"b\" ]\nNext = 1\n";
        let store = OverrideStore::parse(content).unwrap();
        assert_eq!(store.get("autoload", "List"), Some("[\n\"a\",\n\"b\" ]"));
        assert_eq!(store.get("autoload", "Next"), Some("1"));

        let reparsed = OverrideStore::parse(&store.to_string()).unwrap();
        assert_eq!(reparsed, store);
    }

    #[test]
    fn test_comments_and_colon_separator() {
        let content = "; header comment\n[a]\n# note\nkey: value\n";
        let store = OverrideStore::parse(content).unwrap();
        assert_eq!(store.get("a", "key"), Some("value"));
    }

    #[test]
    fn test_entry_before_section_is_error() {
        let err = OverrideStore::parse("key = value\n[a]\n").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = OverrideStore::load(&dir.path().join("override.cfg")).unwrap();
        assert_eq!(store, OverrideStore::default());
    }

    #[test]
    fn test_set_value_round_trip_with_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("override.cfg");
        let value = r#""C:/Users/a \"b\"/GUMM_mod_loader.tscn""#;

        assert_eq!(set_value(&path, "application", "run/main_scene", value).unwrap(), ValueChange::Added);
        assert_eq!(get_value(&path, "application", "run/main_scene").unwrap(), value);
    }

    #[test]
    fn test_set_value_reports_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("override.cfg");

        set_value(&path, "modloader", "version_string", "\"1.0.0\"").unwrap();
        let change = set_value(&path, "modloader", "version_string", "\"1.1.0\"").unwrap();
        assert_eq!(change, ValueChange::Changed { previous: "\"1.0.0\"".to_string() });
    }

    #[test]
    fn test_set_value_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("override.cfg");
        fs::write(&path, SAMPLE).unwrap();

        set_value(&path, "application", "boot_splash/image", "\"icon.png\"").unwrap();
        let before = fs::read(&path).unwrap();
        let change = set_value(&path, "application", "boot_splash/image", "\"icon.png\"").unwrap();
        assert_eq!(change, ValueChange::Unchanged);
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_set_value_keeps_unrelated_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("override.cfg");
        fs::write(&path, SAMPLE).unwrap();

        set_value(&path, "application", "run/main_scene", "\"/x/GUMM_mod_loader.tscn\"").unwrap();
        set_value(&path, "modloader", "version_string", "\"1.0.0\"").unwrap();

        let store = OverrideStore::load(&path).unwrap();
        assert_eq!(store.get("application", "config/name"), Some("\"Bopimo!\""));
        assert_eq!(store.get("autoload", "Foo"), Some("\"*res://foo.tscn\""));
        assert_eq!(store.get("display", "window/size/viewport_width"), Some("1920"));
        let names: Vec<&str> = store.section_names().collect();
        assert_eq!(names, vec!["application", "autoload", "display", "modloader"]);
    }

    #[test]
    fn test_missing_section_and_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("override.cfg");
        fs::write(&path, SAMPLE).unwrap();

        assert!(matches!(
            get_section(&path, "modloader"),
            Err(InstallerError::SectionNotFound { .. })
        ));
        assert!(matches!(
            get_value(&path, "application", "nope"),
            Err(InstallerError::KeyNotFound { .. })
        ));
        assert_eq!(get_section(&path, "autoload").unwrap().iter().count(), 2);
    }

    #[test]
    fn test_whitespace_only_continuation_is_empty_line() {
        let content = "[a]\nkey = first\n\t\n\tsecond\n  \n\nnext = 1\n";
        let store = OverrideStore::parse(content).unwrap();
        assert_eq!(store.get("a", "key"), Some("first\n\nsecond"));
        assert_eq!(store.get("a", "next"), Some("1"));
    }

    #[test]
    fn test_set_value_multiline_with_empty_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("override.cfg");
        fs::write(&path, SAMPLE).unwrap();

        set_value(&path, "autoload", "List", "[\n\n\"a\" ]").unwrap();
        assert_eq!(get_value(&path, "autoload", "List").unwrap(), "[\n\n\"a\" ]");
        assert_eq!(get_value(&path, "display", "window/size/viewport_width").unwrap(), "1920");
    }

    #[test]
    fn test_set_value_rejects_entries_that_would_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("override.cfg");
        fs::write(&path, SAMPLE).unwrap();

        let rejected = [
            ("application", "config/name", " padded "),
            ("application", "config/name", "a\n;b"),
            ("application", "config/name", "a\n"),
            ("application", "a:b", "1"),
            ("application", "a=b", "1"),
            ("application", " key", "1"),
            ("application", "#key", "1"),
            ("a]b", "key", "1"),
        ];
        for (section, key, value) in rejected {
            assert!(
                matches!(
                    set_value(&path, section, key, value),
                    Err(InstallerError::InvalidEntry { .. })
                ),
                "[{}] {} = {:?} should be rejected",
                section,
                key,
                value
            );
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);
    }

    #[test]
    fn test_save_into_missing_directory_is_config_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("override.cfg");

        let err = set_value(&path, "modloader", "version_string", "\"1.0.0\"").unwrap_err();
        assert!(matches!(err, InstallerError::ConfigWrite { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"1.2.0-beta1\""), "1.2.0-beta1");
        assert_eq!(unquote("1.2.0"), "1.2.0");
        assert_eq!(unquote("\"\"a\"\""), "\"a\"");
        assert_eq!(quote("x"), "\"x\"");
    }
}
