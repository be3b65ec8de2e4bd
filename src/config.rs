use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheSettings,

    pub http: HttpSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Root directory for cached responses. Each provider gets a
    /// subdirectory under it. Defaults to `<cache_dir>/draftdata`.
    pub dir: Option<PathBuf>,

    /// How long a cached response stays valid, in days.
    pub retention_days: i64,

    /// Honor `Cache-Control` response headers (`max-age`, `no-store`)
    /// instead of always applying `retention_days`.
    pub respect_cache_control: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub user_agent: String,

    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            http: HttpSettings::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: None,
            retention_days: 180,
            respect_cache_control: true,
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: format!("draftdata/{}", env!("CARGO_PKG_VERSION")),
            timeout_seconds: 30,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("draftdata.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("draftdata").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".draftdata").join("config.toml"));
        }

        paths
    }
}

impl CacheSettings {
    /// Resolves the cache directory for one provider, e.g. `scryfall`.
    #[must_use]
    pub fn provider_dir(&self, provider: &str) -> PathBuf {
        self.dir.clone().map_or_else(
            || {
                dirs::cache_dir()
                    .unwrap_or_else(std::env::temp_dir)
                    .join("draftdata")
                    .join(provider)
            },
            |root| root.join(provider),
        )
    }

    #[must_use]
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.retention_days)
    }
}
