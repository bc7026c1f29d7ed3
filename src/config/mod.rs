//! Configuration management for MIDI Letters
//!
//! Handles loading, saving and hot-reloading of the configuration file.
//! YAML is the default format; a `.json` extension switches to JSON so the
//! classic `appsettings.json` layout keeps working.

pub mod reload;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use tracing::warn;

use crate::mapping::MappingTable;
use crate::spelling::{NoteName, SpellingPolicy};

pub use reload::{ConfigStore, FileConfigStore, ReloadGate};

/// Extra keystroke sent for every note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TapMode {
    #[default]
    Off,
    /// Send only the tap key, skip note resolution
    Exclusive,
    /// Send the tap key, then the mapped character
    Combined,
}

impl TapMode {
    /// Parse a tap mode case-insensitively, falling back to `Off`
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "exclusive" => Self::Exclusive,
            "combined" => Self::Combined,
            _ => Self::Off,
        }
    }

    pub fn taps(self) -> bool {
        !matches!(self, Self::Off)
    }
}

impl fmt::Display for TapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Off => "Off",
            Self::Exclusive => "Exclusive",
            Self::Combined => "Combined",
        };
        f.write_str(name)
    }
}

/// On-disk document, kept as loose strings so bad values default instead of failing
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    #[serde(default, alias = "MidiDeviceIndex", alias = "midi_device_index")]
    pub midi_device_index: i64,
    #[serde(default = "default_mode", alias = "Mode")]
    pub mode: String,
    #[serde(default = "default_tap_mode", alias = "TapMode", alias = "tap_mode")]
    pub tap_mode: String,
    #[serde(default, alias = "Mappings")]
    pub mappings: BTreeMap<String, String>,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self {
            midi_device_index: 0,
            mode: default_mode(),
            tap_mode: default_tap_mode(),
            mappings: default_mappings(),
        }
    }
}

/// Active configuration, replaced wholesale on reload
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub midi_device_index: i64,
    pub mode: SpellingPolicy,
    pub tap_mode: TapMode,
    pub mappings: MappingTable,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_document(&ConfigDocument::default())
    }
}

/// File format, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

impl Format {
    fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

impl ConfigDocument {
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        let doc = match Format::for_path(path) {
            Format::Yaml => serde_yaml::from_str(contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
            Format::Json => serde_json::from_str(contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
        };
        Ok(doc)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&contents, path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = match Format::for_path(path) {
            Format::Yaml => {
                serde_yaml::to_string(self).context("Failed to serialize config to YAML")?
            }
            Format::Json => {
                serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?
            }
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        fs::write(path, text)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Warn about mapping keys that no note can ever resolve to
    pub fn validate(&self) -> Vec<String> {
        let unknown: Vec<String> = self
            .mappings
            .keys()
            .filter(|k| !NoteName::is_known(k))
            .cloned()
            .collect();

        for key in &unknown {
            warn!("Mapping key '{}' is not a note name and will never match", key);
        }

        unknown
    }
}

impl AppConfig {
    pub fn from_document(doc: &ConfigDocument) -> Self {
        let raw: HashMap<String, String> = doc
            .mappings
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            midi_device_index: doc.midi_device_index,
            mode: SpellingPolicy::parse_lenient(&doc.mode),
            tap_mode: TapMode::parse_lenient(&doc.tap_mode),
            mappings: MappingTable::from_raw(&raw),
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let doc = ConfigDocument::load(path)?;
        doc.validate();
        Ok(Self::from_document(&doc))
    }

    /// Load configuration, writing the default document first if the file is missing
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("{} not found. Creating default config.", path.display());
            ConfigDocument::default().save(path)?;
        }
        Self::load(path)
    }
}

/// Last-modified time of the config file
pub fn modified_time(path: &Path) -> Result<SystemTime> {
    let meta = fs::metadata(path)
        .with_context(|| format!("Failed to stat config file: {}", path.display()))?;
    meta.modified()
        .with_context(|| format!("No modification time for: {}", path.display()))
}

// Default value functions
fn default_mode() -> String { "Ante".to_string() }
fn default_tap_mode() -> String { "Off".to_string() }

fn default_mappings() -> BTreeMap<String, String> {
    [
        ("C", "c"), ("D", "d"), ("E", "e"), ("F", "f"), ("G", "g"), ("A", "a"), ("B", "b"),
        ("C#", "1"), ("D#", "2"), ("F#", "3"), ("G#", "4"), ("A#", "5"),
        ("Db", "6"), ("Eb", "7"), ("Gb", "8"), ("Ab", "9"), ("Bb", "0"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spelling::ALL_NOTE_NAMES;
    use tempfile::TempDir;

    #[test]
    fn test_default_maps_every_note_name() {
        let config = AppConfig::default();
        for name in ALL_NOTE_NAMES {
            assert!(config.mappings.lookup_str(name).is_some(), "{} unmapped", name);
        }
        assert_eq!(config.mode, SpellingPolicy::Ante);
        assert_eq!(config.tap_mode, TapMode::Off);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
midiDeviceIndex: 2
mode: cycle
tapMode: COMBINED
mappings:
  C: "x"
  "C#": " "
"#;
        let doc = ConfigDocument::parse(yaml, Path::new("config.yaml")).unwrap();
        let config = AppConfig::from_document(&doc);

        assert_eq!(config.midi_device_index, 2);
        assert_eq!(config.mode, SpellingPolicy::Cycle);
        assert_eq!(config.tap_mode, TapMode::Combined);
        assert_eq!(config.mappings.lookup_str("C"), Some('x'));
        assert_eq!(config.mappings.lookup_str("C#"), None);
    }

    #[test]
    fn test_parse_json_pascal_case() {
        let json = r#"{
            "MidiDeviceIndex": 1,
            "Mode": "Post",
            "TapMode": "nonsense",
            "Mappings": { "Db": "q" }
        }"#;
        let doc = ConfigDocument::parse(json, Path::new("appsettings.json")).unwrap();
        let config = AppConfig::from_document(&doc);

        assert_eq!(config.midi_device_index, 1);
        assert_eq!(config.mode, SpellingPolicy::Post);
        assert_eq!(config.tap_mode, TapMode::Off);
        assert_eq!(config.mappings.lookup_str("Db"), Some('q'));
    }

    #[test]
    fn test_missing_fields_default() {
        let doc = ConfigDocument::parse("{}", Path::new("c.json")).unwrap();
        let config = AppConfig::from_document(&doc);
        assert_eq!(config.midi_device_index, 0);
        assert_eq!(config.mode, SpellingPolicy::Ante);
        assert!(config.mappings.is_empty());
    }

    #[test]
    fn test_malformed_document_is_error() {
        assert!(ConfigDocument::parse("mode: [unclosed", Path::new("c.yaml")).is_err());
        assert!(ConfigDocument::parse("{ nope", Path::new("c.json")).is_err());
    }

    #[test]
    fn test_validate_reports_unknown_keys() {
        let mut doc = ConfigDocument::default();
        doc.mappings.insert("H".to_string(), "h".to_string());
        doc.mappings.insert("c".to_string(), "c".to_string());
        assert_eq!(doc.validate(), vec!["H".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_load_or_create_writes_default() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("config.yaml");

        let config = AppConfig::load_or_create(&path)?;
        assert!(path.exists());
        assert_eq!(config, AppConfig::default());

        // Second call reads the existing file
        let mut doc = ConfigDocument::load(&path)?;
        doc.mode = "Cycle".to_string();
        doc.save(&path)?;
        assert_eq!(AppConfig::load_or_create(&path)?.mode, SpellingPolicy::Cycle);
        Ok(())
    }

    #[test]
    fn test_json_save_load_keeps_camel_case() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("appsettings.json");

        ConfigDocument::default().save(&path)?;
        let text = fs::read_to_string(&path)?;
        assert!(text.contains("\"midiDeviceIndex\""));
        assert!(text.contains("\"tapMode\""));
        assert_eq!(ConfigDocument::load(&path)?, ConfigDocument::default());
        Ok(())
    }
}
