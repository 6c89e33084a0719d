use crate::error::SettingsError;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Rendered views kept by the render cache.
    pub render_capacity: usize,
    /// Hostnames remembered by the known-service matcher.
    pub known_service_capacity: usize,
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            render_capacity: 64,
            known_service_capacity: 10_000,
            enabled: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub cache: CacheConfig,
    pub log: LogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, SettingsError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(environment());

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let builder = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment());

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.cache.render_capacity == 0 {
            return Err(SettingsError::Invalid {
                key: "cache.render_capacity",
                reason: "must be greater than zero".into(),
            });
        }
        if self.cache.known_service_capacity == 0 {
            return Err(SettingsError::Invalid {
                key: "cache.known_service_capacity",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

fn environment() -> Environment {
    Environment::with_prefix("TOPOVIEW")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
