//! Runtime configuration, read from the environment (and `.env` via dotenvy).

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::ConfigError;
use crate::pricing::PricingTables;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_POOL_SIZE: usize = 5;
const DEFAULT_TOKEN_TTL_HOURS: u64 = 24;
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Top-level configuration.
#[derive(Debug)]
pub struct Config {
    pub server: ServerConfig,
    /// `None` runs the server on the in-memory database.
    pub database: Option<DatabaseConfig>,
    pub auth: AuthConfig,
    pub pricing_file: Option<PathBuf>,
    pub client: ClientConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// PostgreSQL connection settings.
#[derive(Debug)]
pub struct DatabaseConfig {
    url: SecretString,
    pub pool_size: usize,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>, pool_size: usize) -> Self {
        Self {
            url: SecretString::from(url.into()),
            pool_size,
        }
    }

    pub fn url(&self) -> &str {
        self.url.expose_secret()
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Lifetime of issued bearer tokens.
    pub token_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_HOURS * 3600),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("SITECOST_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_var(&lookup, "SITECOST_PORT", DEFAULT_PORT)?;

        let database = match lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => {
                let pool_size = parse_var(&lookup, "DATABASE_POOL_SIZE", DEFAULT_POOL_SIZE)?;
                if pool_size == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "DATABASE_POOL_SIZE".into(),
                        message: "must be at least 1".into(),
                    });
                }
                Some(DatabaseConfig::new(url, pool_size))
            }
            None => None,
        };

        let ttl_hours = parse_var(&lookup, "SITECOST_TOKEN_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS)?;
        if ttl_hours == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SITECOST_TOKEN_TTL_HOURS".into(),
                message: "must be at least 1".into(),
            });
        }

        Ok(Self {
            server: ServerConfig { host, port },
            database,
            auth: AuthConfig {
                token_ttl: Duration::from_secs(ttl_hours * 3600),
            },
            pricing_file: lookup("SITECOST_PRICING_FILE").map(PathBuf::from),
            client: ClientConfig {
                api_url: lookup("SITECOST_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            },
        })
    }

    /// The pricing tables to run with: the configured file, or the built-in reference.
    pub fn load_pricing(&self) -> Result<PricingTables, ConfigError> {
        match &self.pricing_file {
            Some(path) => {
                tracing::info!("Loading pricing tables from {}", path.display());
                PricingTables::from_toml_file(path)
            }
            None => Ok(PricingTables::reference()),
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}
