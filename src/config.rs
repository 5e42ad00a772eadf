// Bot configuration: defaults, then an optional TOML file, then HOTEL_BOT_* environment variables

use crate::api::DEFAULT_PAGE_SIZE;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const ENV_PREFIX: &str = "HOTEL_BOT_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] figment::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub api: ApiConfig,
    pub search: SearchConfig,
    pub log_filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_host: String,
    // No timeout unless configured
    pub timeout_ms: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://hotels4.p.rapidapi.com".to_string(),
            api_key: String::new(),
            api_host: "hotels4.p.rapidapi.com".to_string(),
            timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub page_size: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl BotConfig {
    // Loads the configuration from the optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(BotConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: BotConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.page_size == 0 {
            return Err(ConfigError::Invalid(
                "search.page_size must be positive".to_string(),
            ));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Figment {
        Figment::from(Serialized::defaults(BotConfig::default()))
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::from_figment(defaults()).unwrap();

        assert_eq!(config.search.page_size, 25);
        assert_eq!(config.api.api_host, "hotels4.p.rapidapi.com");
        assert_eq!(config.api.timeout_ms, None);
        assert_eq!(config.log_filter, None);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let figment = defaults().merge(Toml::string(
            r#"
            log_filter = "hotel_search_bot=debug"

            [api]
            api_key = "secret"
            timeout_ms = 5000

            [search]
            page_size = 10
            "#,
        ));

        let config = BotConfig::from_figment(figment).unwrap();
        assert_eq!(config.api.api_key, "secret");
        assert_eq!(config.api.timeout_ms, Some(5000));
        assert_eq!(config.api.base_url, "https://hotels4.p.rapidapi.com");
        assert_eq!(config.search.page_size, 10);
        assert_eq!(config.log_filter.as_deref(), Some("hotel_search_bot=debug"));
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let figment = defaults().merge(Toml::string("[search]\npage_size = 0"));
        assert!(matches!(
            BotConfig::from_figment(figment),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_malformed_value_is_a_load_error() {
        let figment = defaults().merge(Toml::string("[search]\npage_size = \"many\""));
        assert!(matches!(
            BotConfig::from_figment(figment),
            Err(ConfigError::Load(_))
        ));
    }
}
