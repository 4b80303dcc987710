//! Configuration management with YAML support

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub data: DataConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

/// Input dataset locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_song_dir")]
    pub song_dir: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Glob matched against file names (not full paths)
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

// Default value functions
fn default_database_path() -> String {
    "~/.local/share/songplays/songplays.db".to_string()
}

fn default_song_dir() -> String {
    "data/song_data".to_string()
}

fn default_log_dir() -> String {
    "data/log_data".to_string()
}

fn default_pattern() -> String {
    "*.json".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            song_dir: default_song_dir(),
            log_dir: default_log_dir(),
            pattern: default_pattern(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    /// Searches in order:
    /// 1. Provided path
    /// 2. ./songplays.yaml (current directory)
    /// 3. ~/.config/songplays/songplays.yaml
    pub fn load(path: &str) -> Result<Self> {
        let search_paths = vec![
            shellexpand::tilde(path).to_string(),
            "songplays.yaml".to_string(),
            shellexpand::tilde("~/.config/songplays/songplays.yaml").to_string(),
        ];

        Self::load_first(&search_paths)
    }

    /// Parse the first existing file in `search_paths`, or fall back to defaults
    fn load_first(search_paths: &[String]) -> Result<Self> {
        for search_path in search_paths {
            if std::path::Path::new(search_path).exists() {
                let content = std::fs::read_to_string(search_path)?;
                let config: Config = serde_yaml::from_str(&content)?;
                return Ok(config);
            }
        }

        // No config file found, use defaults
        Ok(Config::default())
    }

    /// Get the database path, expanding ~ to home directory
    pub fn database_path(&self) -> PathBuf {
        expand(&self.database.path)
    }

    pub fn song_dir(&self) -> PathBuf {
        expand(&self.data.song_dir)
    }

    pub fn log_dir(&self) -> PathBuf {
        expand(&self.data.log_dir)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}
