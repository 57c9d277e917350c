//! Configuration for the ledger

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Largest supported minor-unit scale
pub const MAX_CURRENCY_SCALE: u32 = 8;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Arithmetic settings
    pub ledger: LedgerSettings,

    /// Actor configuration
    pub actor: ActorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "balance-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            ledger: LedgerSettings::default(),
            actor: ActorConfig::default(),
        }
    }
}

/// Arithmetic settings shared by the ledger and everything feeding it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    /// Smallest magnitude treated as non-zero
    pub epsilon: Decimal,

    /// Decimal places of the currency minor unit (2 = cents)
    pub currency_scale: u32,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            epsilon: Decimal::new(1, 3), // 0.001
            currency_scale: 2,
        }
    }
}

impl LedgerSettings {
    /// One minor unit (0.01 at scale 2)
    pub fn minor_unit(&self) -> Decimal {
        Decimal::new(1, self.currency_scale)
    }

    /// Round to the minor unit, ties to even
    pub fn round(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.currency_scale, RoundingStrategy::MidpointNearestEven)
    }

    /// Truncate towards zero at the minor unit
    pub fn floor(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.currency_scale, RoundingStrategy::ToZero)
    }

    /// Check the settings are usable
    pub fn validate(&self) -> crate::Result<()> {
        if self.epsilon <= Decimal::ZERO {
            return Err(crate::Error::Config("epsilon must be positive".to_string()));
        }
        if self.currency_scale > MAX_CURRENCY_SCALE {
            return Err(crate::Error::Config(format!(
                "currency_scale {} exceeds {}",
                self.currency_scale, MAX_CURRENCY_SCALE
            )));
        }
        if self.epsilon >= self.minor_unit() {
            return Err(crate::Error::Config(format!(
                "epsilon {} must be below one minor unit ({})",
                self.epsilon,
                self.minor_unit()
            )));
        }
        Ok(())
    }
}

/// Actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Bounded mailbox size (backpressure)
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
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

        if let Ok(epsilon) = std::env::var("LEDGER_EPSILON") {
            config.ledger.epsilon = Decimal::from_str(&epsilon)
                .map_err(|e| crate::Error::Config(format!("LEDGER_EPSILON: {}", e)))?;
        }

        if let Ok(scale) = std::env::var("LEDGER_CURRENCY_SCALE") {
            config.ledger.currency_scale = scale
                .parse()
                .map_err(|e| crate::Error::Config(format!("LEDGER_CURRENCY_SCALE: {}", e)))?;
        }

        if let Ok(capacity) = std::env::var("LEDGER_MAILBOX_CAPACITY") {
            config.actor.mailbox_capacity = capacity
                .parse()
                .map_err(|e| crate::Error::Config(format!("LEDGER_MAILBOX_CAPACITY: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the whole configuration
    pub fn validate(&self) -> crate::Result<()> {
        self.ledger.validate()?;
        if self.actor.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "mailbox_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "balance-ledger");
        assert_eq!(config.ledger.epsilon, Decimal::new(1, 3));
        assert_eq!(config.ledger.currency_scale, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = Config::from_toml(
            r#"
            [ledger]
            epsilon = "0.0001"

            [actor]
            mailbox_capacity = 16
            "#,
        )
        .unwrap();

        assert_eq!(config.ledger.epsilon, Decimal::new(1, 4));
        assert_eq!(config.ledger.currency_scale, 2);
        assert_eq!(config.actor.mailbox_capacity, 16);
        assert_eq!(config.service_name, "balance-ledger");
    }

    #[test]
    fn test_reject_epsilon_above_minor_unit() {
        let result = Config::from_toml(
            r#"
            [ledger]
            epsilon = "0.5"
            "#,
        );
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_rounding_helpers() {
        let settings = LedgerSettings::default();
        assert_eq!(settings.minor_unit(), Decimal::new(1, 2));
        assert_eq!(settings.round(Decimal::new(33335, 3)), Decimal::new(3334, 2));
        assert_eq!(settings.floor(Decimal::new(33339, 3)), Decimal::new(3333, 2));
    }
}
