//! CLI configuration
//!
//! Values come from `~/.jukugo/config.toml`, then `JUKUGO_*` environment
//! variables, then command line flags.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Get default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".jukugo")
}

/// Location of the config file. `JUKUGO_CONFIG` overrides the default.
pub fn config_file_path() -> PathBuf {
    match std::env::var_os("JUKUGO_CONFIG") {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => default_data_dir().join("config.toml"),
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Redb,
    Sqlite,
    Memory,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Redb => "redb",
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        };
        f.write_str(name)
    }
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "redb" => Ok(Self::Redb),
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("Unknown backend '{}' (expected redb, sqlite or memory)", other),
        }
    }
}

/// Configuration for the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub backend: Backend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dictionary_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub levels_path: Option<PathBuf>,
    pub allow_wipe: bool,
    pub distractors: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: Backend::Redb,
            dictionary_path: None,
            levels_path: None,
            allow_wipe: false,
            distractors: 3,
        }
    }
}

const KEYS: &[&str] = &[
    "data_dir",
    "backend",
    "dictionary_path",
    "levels_path",
    "allow_wipe",
    "distractors",
];

impl Config {
    /// Effective configuration: the config file with environment overrides applied
    pub fn load() -> Self {
        let mut config = Self::load_file();
        config.apply_env();
        config
    }

    /// The config file alone, or defaults when it is missing or unreadable
    pub fn load_file() -> Self {
        let path = config_file_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config file {}: {:#}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Apply `JUKUGO_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        let set = |name: &str| var(name).filter(|v| !v.is_empty());

        if let Some(dir) = set("JUKUGO_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = set("JUKUGO_DICTIONARY") {
            self.dictionary_path = Some(PathBuf::from(path));
        }
        if let Some(path) = set("JUKUGO_LEVELS") {
            self.levels_path = Some(PathBuf::from(path));
        }
        if let Some(value) = set("JUKUGO_ALLOW_WIPE") {
            match parse_bool(&value) {
                Ok(allow) => self.allow_wipe = allow,
                Err(e) => tracing::warn!("Ignoring JUKUGO_ALLOW_WIPE: {}", e),
            }
        }
    }

    pub fn keys() -> &'static [&'static str] {
        KEYS
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let path = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        };
        match key {
            "data_dir" => Some(self.data_dir.display().to_string()),
            "backend" => Some(self.backend.to_string()),
            "dictionary_path" => Some(path(&self.dictionary_path)),
            "levels_path" => Some(path(&self.levels_path)),
            "allow_wipe" => Some(self.allow_wipe.to_string()),
            "distractors" => Some(self.distractors.to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let optional_path = |v: &str| (!v.is_empty()).then(|| PathBuf::from(v));
        match key {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "backend" => self.backend = value.parse()?,
            "dictionary_path" => self.dictionary_path = optional_path(value),
            "levels_path" => self.levels_path = optional_path(value),
            "allow_wipe" => self.allow_wipe = parse_bool(value)?,
            "distractors" => {
                self.distractors = value
                    .parse()
                    .with_context(|| format!("Invalid distractor count: {}", value))?
            }
            _ => anyhow::bail!(
                "Unknown config key: {}. Available keys: {}",
                key,
                KEYS.join(", ")
            ),
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("Expected true or false, got '{}'", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend, Backend::Redb);
        assert!(!config.allow_wipe);
        assert_eq!(config.distractors, 3);
        assert!(config.data_dir.ends_with(".jukugo"));
    }

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();
        config.set("backend", "SQLite").unwrap();
        config.set("allow_wipe", "yes").unwrap();
        config.set("dictionary_path", "/data/JMdict_e.xml").unwrap();

        assert_eq!(config.get("backend").as_deref(), Some("sqlite"));
        assert_eq!(config.get("allow_wipe").as_deref(), Some("true"));
        assert_eq!(
            config.get("dictionary_path").as_deref(),
            Some("/data/JMdict_e.xml")
        );

        config.set("dictionary_path", "").unwrap();
        assert!(config.dictionary_path.is_none());

        assert!(config.set("distractors", "many").is_err());
        assert!(config.set("colour", "blue").is_err());
        assert!(config.get("colour").is_none());
    }

    #[test]
    fn test_every_key_is_readable() {
        let config = Config::default();
        for key in Config::keys() {
            assert!(config.get(key).is_some(), "{}", key);
        }
    }

    #[test]
    fn test_toml_round_trip_with_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "backend = \"memory\"\ndistractors = 5\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.distractors, 5);
        assert!(!config.allow_wipe);

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("JUKUGO_DATA_DIR", "/tmp/jukugo"),
            ("JUKUGO_LEVELS", "/tmp/levels.tsv"),
            ("JUKUGO_ALLOW_WIPE", "1"),
            ("JUKUGO_DICTIONARY", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.data_dir, PathBuf::from("/tmp/jukugo"));
        assert_eq!(config.levels_path, Some(PathBuf::from("/tmp/levels.tsv")));
        assert!(config.allow_wipe);
        assert!(config.dictionary_path.is_none());
    }
}
