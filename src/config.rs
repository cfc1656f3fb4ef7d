//! Service configuration using Figment
//!
//! Sources, highest precedence first:
//! 1. Environment variables prefixed `USER_API_` (nested keys split on `__`)
//! 2. `./user_api.toml`
//! 3. Defaults

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const CONFIG_FILE: &str = "user_api.toml";
pub const ENV_PREFIX: &str = "USER_API_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    /// `EnvFilter` directive, e.g. `info` or `user_api=debug,tower_http=info`
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite URL, e.g. `sqlite::memory:` or `sqlite://users.db`
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Pool size for file databases. In-memory databases always use one connection.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_database_url() -> String {
    "sqlite::memory:".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from defaults, `user_api.toml` and the environment.
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment())
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(
                figment::Error::from("server.port must be greater than 0".to_string()).into(),
            );
        }

        if self.database.url.trim().is_empty() {
            return Err(
                figment::Error::from("database.url cannot be empty".to_string()).into(),
            );
        }

        if self.database.max_connections == 0 {
            return Err(figment::Error::from(
                "database.max_connections must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Socket address the HTTP listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
