use std::time::Duration;

use swiss_core::config::{ConfigError, TournamentConfig};

pub const DEFAULT_DATABASE_URL: &str = "sqlite:swiss.db?mode=rwc";

/// Server settings, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// Largest roster accepted when creating a tournament.
    pub max_competitors: usize,
    /// Tournaments untouched for this long are dropped from memory (not from the database).
    pub idle_eviction: Duration,
    /// Defaults for new tournaments; request fields override them.
    pub tournament: TournamentConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 100,
            max_competitors: 256,
            idle_eviction: Duration::from_secs(600),
            tournament: TournamentConfig::default(),
        }
    }
}

impl ServerConfig {
    /// `PORT`, `DATABASE_URL`, `SWISS_MAX_CONNECTIONS`, `SWISS_MAX_COMPETITORS` and
    /// `SWISS_CONFIG` (path to a TOML file with tournament defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(port) = std::env::var("PORT") {
            config.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT is not a port number: {port}")))?;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }
        if let Ok(max) = std::env::var("SWISS_MAX_CONNECTIONS") {
            config.max_connections = max.parse().map_err(|_| {
                ConfigError::Invalid(format!("SWISS_MAX_CONNECTIONS is not a number: {max}"))
            })?;
        }
        if let Ok(max) = std::env::var("SWISS_MAX_COMPETITORS") {
            config.max_competitors = max.parse().map_err(|_| {
                ConfigError::Invalid(format!("SWISS_MAX_COMPETITORS is not a number: {max}"))
            })?;
        }
        if let Ok(path) = std::env::var("SWISS_CONFIG") {
            config.tournament = TournamentConfig::load(path)?;
        }

        Ok(config)
    }

    /// Configuration for tests: private in-memory database.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            ..Self::default()
        }
    }
}
