//! Tournament settings, loadable from TOML.
//!
//! ```
//! use swiss_core::config::TournamentConfig;
//!
//! let config = TournamentConfig::from_toml_str(r#"
//!     k_factor = 24.0
//!     bye_name = "Rest"
//! "#).unwrap();
//!
//! assert_eq!(config.k_factor, 24.0);
//! assert_eq!(config.initial_rating, 1500.0);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::elo::{DEFAULT_RATING, K_FACTOR};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct TournamentConfig {
    /// Rating given to every regular competitor at setup.
    pub initial_rating: f64,
    /// Elo K-factor used for every rated matchup.
    pub k_factor: f64,
    /// Display name of the padding competitor for odd rosters.
    pub bye_name: String,
    /// Shuffle the pairing order of the roster before scheduling.
    pub shuffle_roster: bool,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            initial_rating: DEFAULT_RATING,
            k_factor: K_FACTOR,
            bye_name: "Bye".to_string(),
            shuffle_roster: false,
        }
    }
}

impl TournamentConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_rating.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "initial_rating must be finite, got {}",
                self.initial_rating
            )));
        }
        if !(self.k_factor.is_finite() && self.k_factor > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "k_factor must be positive, got {}",
                self.k_factor
            )));
        }
        if self.bye_name.trim().is_empty() {
            return Err(ConfigError::Invalid("bye_name must not be empty".into()));
        }
        Ok(())
    }

    pub fn with_k_factor(mut self, k: f64) -> Self {
        self.k_factor = k;
        self
    }

    pub fn with_initial_rating(mut self, rating: f64) -> Self {
        self.initial_rating = rating;
        self
    }
}
