use anyhow::{Context, Result};
use compute::DayOverflow;
use config::{Config, Environment, File};
use moka::future::Cache;
use sea_orm::Database;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::schemas::AppState;

/// Settings read from defaults, `taxdesk.toml` and `TAXDESK_*` variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    pub request_timeout_secs: u64,
    pub cache_capacity: u64,
    pub cache_ttl_secs: u64,
    /// Upper bound for request bodies; documents travel as base64.
    pub max_body_bytes: usize,
    /// `clamp` or `reject`
    pub due_day_overflow: String,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://taxdesk.db?mode=rwc".to_string(),
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
            cache_capacity: 1000,
            cache_ttl_secs: 300,
            max_body_bytes: 20 * 1024 * 1024,
            due_day_overflow: "clamp".to_string(),
            log_filter: "taxdesk=debug,tower_http=debug,axum::rejection=trace".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads the layered configuration. A `.env` file is read first.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = AppConfig::default();

        let settings = Config::builder()
            .set_default("database_url", defaults.database_url)?
            .set_default("bind_address", defaults.bind_address)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default("cache_capacity", defaults.cache_capacity as i64)?
            .set_default("cache_ttl_secs", defaults.cache_ttl_secs as i64)?
            .set_default("max_body_bytes", defaults.max_body_bytes as i64)?
            .set_default("due_day_overflow", defaults.due_day_overflow)?
            .set_default("log_filter", defaults.log_filter)?
            .add_source(File::with_name("taxdesk").required(false))
            .add_source(Environment::with_prefix("TAXDESK").try_parsing(true))
            .build()
            .context("Failed to read configuration")?;

        let config: AppConfig = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        config
            .due_day_overflow
            .parse::<DayOverflow>()
            .map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    /// Policy for due days that do not exist in the due month.
    pub fn day_overflow(&self) -> DayOverflow {
        self.due_day_overflow.parse().unwrap_or_default()
    }

    pub fn with_database_url(mut self, database_url: Option<String>) -> Self {
        if let Some(url) = database_url {
            self.database_url = url;
        }
        self
    }

    pub fn with_bind_address(mut self, bind_address: Option<String>) -> Self {
        if let Some(address) = bind_address {
            self.bind_address = address;
        }
        self
    }
}

/// Connects to the database and builds the shared state.
pub async fn initialize_app_state(config: &AppConfig) -> Result<AppState> {
    tracing::info!("Connecting to database: {}", config.database_url);
    let db = Database::connect(&config.database_url).await?;

    let cache = Cache::builder()
        .max_capacity(config.cache_capacity)
        .time_to_live(Duration::from_secs(config.cache_ttl_secs))
        .build();

    Ok(AppState {
        db,
        cache,
        config: Arc::new(config.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.day_overflow(), DayOverflow::Clamp);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.log_filter.starts_with("taxdesk="));
    }

    #[test]
    fn test_cli_overrides() {
        let config = AppConfig::default()
            .with_database_url(Some("sqlite::memory:".to_string()))
            .with_bind_address(None);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.bind_address, "0.0.0.0:3000");
    }

    #[test]
    fn test_reject_policy() {
        let config = AppConfig {
            due_day_overflow: "reject".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.day_overflow(), DayOverflow::Reject);
    }
}
