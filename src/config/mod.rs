// Configuration management for ethos
// TOML file under the user's config dir, created with defaults when missing.
// Spotify credentials come from the environment (or .env) and are never written back.

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CLIENT_ID_VAR: &str = "SPOTIFY_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "SPOTIFY_CLIENT_SECRET";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub spotify: SpotifyConfig,
    pub library: LibraryConfig,
    pub audio: AudioConfig,
    pub network: NetworkConfig,
    pub tools: ToolsConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    #[serde(skip_serializing)]
    pub client_id: Option<String>,
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
    pub token_url: String,
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Holds `playlists/` and `recents.json`
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub initial_volume: u8, // 0 to 100
    pub volume_step: u8,
    pub fade_in_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub yt_dlp: PathBuf,
    pub songrec: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub tick_ms: u64,
    pub max_log_lines: usize,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            api_base: "https://api.spotify.com/v1".to_string(),
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("ethos"),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            initial_volume: 70,
            volume_step: 5,
            fade_in_ms: 300,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp: PathBuf::from("yt-dlp"),
            songrec: PathBuf::from("songrec"),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            max_log_lines: 200,
        }
    }
}

impl SpotifyConfig {
    pub fn has_credentials(&self) -> bool {
        matches!(
            (&self.client_id, &self.client_secret),
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty()
        )
    }
}

impl LibraryConfig {
    pub fn playlists_dir(&self) -> PathBuf {
        self.data_dir.join("playlists")
    }

    pub fn recents_path(&self) -> PathBuf {
        self.data_dir.join("recents.json")
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Config {
    /// Load from `path` (or the default location), then layer the environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let mut config = Self::load_from(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    /// Environment wins over the file for credentials; empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(id) = non_empty(CLIENT_ID_VAR) {
            self.spotify.client_id = Some(id);
        }
        if let Some(secret) = non_empty(CLIENT_SECRET_VAR) {
            self.spotify.client_secret = Some(secret);
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("ethos");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.audio.volume_step, 5);
        assert_eq!(config.network.timeout_secs, 10);
        assert!(!config.spotify.has_credentials());
    }

    #[test]
    fn test_credentials_never_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.spotify.client_id = Some("id-123".to_string());
        config.spotify.client_secret = Some("shh".to_string());
        config.save_to(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(!written.contains("id-123"));
        assert!(!written.contains("shh"));
        assert!(written.contains("token_url"));
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[audio]\ninitial_volume = 40\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.audio.initial_volume, 40);
        assert_eq!(config.audio.volume_step, 5);
        assert_eq!(config.ui.tick_ms, 100);
    }

    #[test]
    fn test_env_overrides_credentials() {
        let env: HashMap<&str, &str> = [
            (CLIENT_ID_VAR, "env-id"),
            (CLIENT_SECRET_VAR, "env-secret"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.spotify.client_id = Some("file-id".to_string());
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.spotify.client_id.as_deref(), Some("env-id"));
        assert_eq!(config.spotify.client_secret.as_deref(), Some("env-secret"));
        assert!(config.spotify.has_credentials());
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env(|_| Some("   ".to_string()));
        assert!(config.spotify.client_id.is_none());
        assert!(!config.spotify.has_credentials());
    }

    #[test]
    fn test_library_paths() {
        let mut config = Config::default();
        config.library.data_dir = PathBuf::from("/tmp/ethos-data");
        assert_eq!(config.library.playlists_dir(), PathBuf::from("/tmp/ethos-data/playlists"));
        assert_eq!(config.library.recents_path(), PathBuf::from("/tmp/ethos-data/recents.json"));
    }
}
