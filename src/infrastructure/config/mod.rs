use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::{GeminiConfig, TestRailConfig};
use crate::infrastructure::security::keyring::KeyringManager;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const CONFIG_FILE: &str = "casegen.toml";
pub const ENV_PREFIX: &str = "CASEGEN_";
const KEYRING_SERVICE: &str = "casegen";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AttachmentsConfig {
    /// Upper bound for the consolidated attachment text.
    pub max_chars: usize,
}

impl Default for AttachmentsConfig {
    fn default() -> Self {
        Self { max_chars: 200_000 }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub testrail: TestRailConfig,
    #[serde(default)]
    pub attachments: AttachmentsConfig,
}

impl AppConfig {
    /// Defaults, then `casegen.toml`, then `CASEGEN_*` variables
    /// (`CASEGEN_GEMINI__MAX_ATTEMPTS=2` sets `gemini.max_attempts`).
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file loaded: {}", e);
        }
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::ConfigError(format!("Failed to load configuration: {}", e)))?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.gemini.max_attempts == 0 {
            return Err(AppError::ConfigError(
                "gemini.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.gemini.refine_attempts == 0 {
            return Err(AppError::ConfigError(
                "gemini.refine_attempts must be at least 1".to_string(),
            ));
        }
        if self.gemini.base_url.trim().is_empty() || self.gemini.model.trim().is_empty() {
            return Err(AppError::ConfigError(
                "gemini.base_url and gemini.model are required".to_string(),
            ));
        }
        if self.testrail.base_url.trim().is_empty() {
            return Err(AppError::ConfigError(
                "testrail.base_url is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolves secrets: the configured value wins, the OS keyring is the fallback.
pub struct ConfigService {
    keyring: KeyringManager,
}

impl ConfigService {
    pub fn new() -> Self {
        Self {
            keyring: KeyringManager::new(KEYRING_SERVICE),
        }
    }

    pub fn resolve_api_key(&self, provider: &str, configured: Option<&str>) -> Option<String> {
        if let Some(key) = configured.map(str::trim).filter(|k| !k.is_empty()) {
            return Some(key.to_string());
        }

        match self.keyring.find_secret(provider) {
            Ok(found) => found,
            Err(e) => {
                warn!(provider, "Keyring lookup failed: {}", e);
                None
            }
        }
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
