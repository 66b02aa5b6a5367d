//! Configuration types for the yedalm service

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Backend URL that selects the built-in in-memory store
pub const MEMORY_BACKEND: &str = "memory";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub images: ImagesConfig,
}

impl Config {
    /// Fill secrets that are not in the file from the environment
    pub fn resolve_secrets(&mut self) -> crate::Result<()> {
        if self.backend.anon_key.is_empty() && !self.backend.is_memory() {
            self.backend.anon_key = std::env::var(&self.backend.anon_key_env).map_err(|_| {
                crate::YedalmError::Config(format!(
                    "backend.anon_key is empty and {} is not set",
                    self.backend.anon_key_env
                ))
            })?;
        }
        Ok(())
    }
}

/// Hosted data API connection
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
    #[serde(default = "default_anon_key_env")]
    pub anon_key_env: String,
}

impl BackendConfig {
    pub fn is_memory(&self) -> bool {
        self.url == MEMORY_BACKEND
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            anon_key: String::new(),
            anon_key_env: default_anon_key_env(),
        }
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("anon_key_env", &self.anon_key_env)
            .finish()
    }
}

/// HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Admin sessions unused for this long are dropped
    #[serde(default = "default_session_idle_seconds")]
    pub session_idle_seconds: u64,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            port: default_site_port(),
            bind: default_bind(),
            session_idle_seconds: default_session_idle_seconds(),
            max_sessions: default_max_sessions(),
        }
    }
}

/// Render parameters for hosted images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagesConfig {
    #[serde(default = "default_image_width")]
    pub width: u32,
    #[serde(default = "default_image_quality")]
    pub quality: u8,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            width: default_image_width(),
            quality: default_image_quality(),
        }
    }
}

fn default_backend_url() -> String {
    MEMORY_BACKEND.to_string()
}

fn default_anon_key_env() -> String {
    "YEDALM_ANON_KEY".to_string()
}

fn default_site_port() -> u16 {
    11120
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_session_idle_seconds() -> u64 {
    crate::session::DEFAULT_IDLE_TIMEOUT.as_secs()
}

fn default_max_sessions() -> usize {
    crate::session::DEFAULT_MAX_SESSIONS
}

fn default_image_width() -> u32 {
    1080
}

pub(crate) fn default_image_quality() -> u8 {
    75
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::YedalmError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
