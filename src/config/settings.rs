use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GatewayError, Result};

pub const DEFAULT_PROVIDER: &str = "gemini";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Registry key of the provider that serves every invoke call.
    pub active: String,
    /// First entry of the model candidate list; an empty value is skipped.
    pub default_model: String,
    pub gemini_base_url: String,
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            active: DEFAULT_PROVIDER.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub database_path: String,
    // 设置后切换到 Postgres 存储
    pub pg_url: Option<String>,
    pub pg_pool_size: Option<usize>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            database_path: "data/gateway.db".to_string(),
            pg_url: None,
            pg_pool_size: None,
        }
    }
}

impl Settings {
    /// Optional config file, then process environment (which `main` has
    /// already seeded from `.env`); later layers win.
    pub fn load() -> Result<Self> {
        let base = match Self::find_config_file() {
            Some(path) => {
                let content = std::fs::read_to_string(&path)?;
                let parsed: Settings = toml::from_str(&content)
                    .map_err(|e| GatewayError::Config(format!("{}: {}", path, e)))?;
                tracing::info!("Loaded configuration file: {}", path);
                parsed
            }
            None => Settings::default(),
        };

        Self::from_lookup(base, |key| std::env::var(key).ok())
    }

    /// Applies environment overrides through `lookup` and validates the result.
    pub fn from_lookup<F>(mut base: Settings, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("HOST") {
            base.server.host = v;
        }
        if let Some(v) = lookup("PORT") {
            base.server.port = v
                .trim()
                .parse()
                .map_err(|_| GatewayError::Config(format!("PORT is not a valid port: {}", v)))?;
        }
        if let Some(v) = lookup("ALLOWED_ORIGINS") {
            base.cors.allowed_origin = v;
        }
        if let Some(v) = lookup("PROVIDER") {
            base.provider.active = v;
        }
        if let Some(v) = lookup("MODEL") {
            base.provider.default_model = v;
        }
        if let Some(v) = lookup("GEMINI_BASE_URL") {
            base.provider.gemini_base_url = v;
        }
        if let Some(v) = lookup("GEMINI_API_KEY") {
            base.provider.gemini_api_key = Some(v);
        }
        if let Some(v) = lookup("DATABASE_PATH") {
            base.logging.database_path = v;
        }
        if let Some(v) = lookup("DATABASE_URL") {
            base.logging.pg_url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Some(v) = lookup("PG_POOL_SIZE") {
            base.logging.pg_pool_size = Some(v.trim().parse().map_err(|_| {
                GatewayError::Config(format!("PG_POOL_SIZE is not a number: {}", v))
            })?);
        }

        base.provider.default_model = base.provider.default_model.trim().to_string();

        if base.gemini_api_key().is_none() {
            return Err(GatewayError::Config("GEMINI_API_KEY is required".into()));
        }

        Ok(base)
    }

    pub fn gemini_api_key(&self) -> Option<&str> {
        self.provider
            .gemini_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
    }

    fn find_config_file() -> Option<String> {
        let possible_names = ["custom-config.toml", "config.toml"];

        possible_names
            .iter()
            .find(|name| Path::new(name).exists())
            .map(|name| name.to_string())
    }
}
