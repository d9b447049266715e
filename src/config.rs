use crate::error::{DirectoryError, Result};
use serde::Deserialize;
use std::env;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Base URL clients can reach this service on. Used to resolve the
    /// relative image references stored with items and points into
    /// absolute URLs.
    pub public_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Either a local file path or a remote libsql:// / https:// URL.
    pub url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            DirectoryError::Config(format!("Failed to read config file '{config_path}': {e}"))
        })?;

        let mut config: Config = toml::from_str(&config_content)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Environment variables take precedence over config.toml so deploys
    /// can keep a single checked-in file.
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(port) = env::var("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| DirectoryError::Config(format!("Invalid PORT value '{port}'")))?;
        }
        if let Ok(public_url) = env::var("PUBLIC_URL") {
            self.server.public_url = public_url;
        }
        if let Ok(url) = env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(token) = env::var("DATABASE_AUTH_TOKEN") {
            self.database.auth_token = Some(token);
        }
        Ok(())
    }
}
