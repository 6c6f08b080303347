use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::DatabaseError;

pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: usize,
}

impl DatabaseConfig {
    pub fn from_cli_or_env_or_yaml(cli_arg: Option<String>, yaml_config: Option<String>) -> Self {
        let url = if let Some(arg) = cli_arg {
            arg
        } else if let Ok(env) = std::env::var("DATABASE_URL") {
            env
        } else if let Some(yaml) = yaml_config {
            yaml
        } else {
            "sqlite::memory:".to_string()
        };

        Self { url, pool_size: 20 }
    }

    pub fn is_in_memory(&self) -> bool {
        matches!(self.url.as_str(), "sqlite::memory:" | ":memory:")
    }

    pub async fn create_pool(&self) -> Result<sqlx::SqlitePool, DatabaseError> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
        } else if self.url.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(&self.url)
        } else {
            Ok(SqliteConnectOptions::new().filename(&self.url))
        }
        .map_err(|e| DatabaseError::Connection(e.to_string()))?
        .create_if_missing(true);

        // every connection to sqlite::memory: is its own database, so pin one
        let pool_options = if self.is_in_memory() {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(self.pool_size as u32)
        };

        tracing::info!("Opening verification cache at {}", self.url);
        pool_options
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))
    }
}
