/// Configuration management for the bot
///
/// Loads configuration from environment variables into a type-safe struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `ADMIN_PASSPHRASE`: shared secret for the admin login flow (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `KEEPALIVE_URL`: URL to ping periodically in push-delivery deployments
///   (absent in polling mode; no heartbeat is started)
/// - `KEEPALIVE_INTERVAL_SECONDS`: ping interval (default: 300)
/// - `RUST_LOG`: log filter (default: info)
///
/// # Example
///
/// ```no_run
/// use taskrelay_shared::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// if config.keepalive.is_some() {
///     println!("Running in push-delivery mode");
/// }
/// # Ok(())
/// # }
/// ```
use serde::{Deserialize, Serialize};
use std::env;

use crate::db::pool::DatabaseConfig;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Shared secret granting the admin role via the login flow
    pub admin_passphrase: String,

    /// Keep-alive heartbeat configuration (None in polling mode)
    pub keepalive: Option<KeepaliveConfig>,
}

/// Keep-alive heartbeat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeepaliveConfig {
    /// URL to ping
    pub url: String,

    /// Ping interval in seconds
    pub interval_seconds: u64,

    /// Backoff after a failed ping in seconds
    pub backoff_seconds: u64,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or values fail to
    /// parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let admin_passphrase = env::var("ADMIN_PASSPHRASE")
            .map_err(|_| anyhow::anyhow!("ADMIN_PASSPHRASE environment variable is required"))?;

        if admin_passphrase.is_empty() {
            anyhow::bail!("ADMIN_PASSPHRASE must not be empty");
        }

        let keepalive = match env::var("KEEPALIVE_URL") {
            Ok(url) if !url.is_empty() => {
                let interval_seconds = env::var("KEEPALIVE_INTERVAL_SECONDS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse::<u64>()?;
                Some(KeepaliveConfig {
                    url,
                    interval_seconds,
                    backoff_seconds: 60,
                })
            }
            _ => None,
        };

        Ok(Self {
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                ..DatabaseConfig::default()
            },
            admin_passphrase,
            keepalive,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keepalive_config_fields() {
        let config = KeepaliveConfig {
            url: "https://example.com/ping".to_string(),
            interval_seconds: 300,
            backoff_seconds: 60,
        };

        assert_eq!(config.interval_seconds, 300);
        assert_eq!(config.backoff_seconds, 60);
    }
}
