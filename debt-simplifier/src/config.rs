//! Configuration for debt simplification

use crate::types::MatchOrder;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Simplifier configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Positions and transfers at or below this are ignored
    pub epsilon: Decimal,

    /// Pairing order of creditors and debtors
    pub match_order: MatchOrder,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            epsilon: Decimal::new(1, 3), // 0.001
            match_order: MatchOrder::ById,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML document
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(order) = std::env::var("SIMPLIFIER_MATCH_ORDER") {
            config.match_order = order.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration
    pub fn validate(&self) -> crate::Result<()> {
        if self.epsilon <= Decimal::ZERO {
            return Err(crate::Error::Config("epsilon must be positive".to_string()));
        }
        Ok(())
    }
}
