//! Service configuration

use anyhow::Result;
use serde::Deserialize;
use tracing::warn;

/// Service configuration, read from `VOYAGE_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Label attached to structured log events
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// HTTP listen port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// SQLite file backing history and the model registry
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Seed a synthetic fleet when the store has no ships
    #[serde(default)]
    pub seed_demo_data: bool,

    /// Train every task before reporting ready
    #[serde(default = "default_train_on_startup")]
    pub train_on_startup: bool,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "voyage-predictor".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_database_path() -> String {
    "voyage.db".to_string()
}

fn default_train_on_startup() -> bool {
    true
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            api_port: default_api_port(),
            database_path: default_database_path(),
            seed_demo_data: false,
            train_on_startup: default_train_on_startup(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("VOYAGE").try_parsing(true))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|e| {
            warn!(error = %e, "Invalid VOYAGE_* configuration, using defaults");
            ServiceConfig::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.database_path, "voyage.db");
        assert!(!config.seed_demo_data);
        assert!(config.train_on_startup);
        assert!(!config.instance_name.is_empty());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: ServiceConfig = serde_json::from_str(r#"{"api_port": 9000}"#).unwrap();
        assert_eq!(config.api_port, 9000);
        assert_eq!(config.database_path, "voyage.db");
        assert!(config.train_on_startup);
    }
}
