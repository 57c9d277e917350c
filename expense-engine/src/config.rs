//! Configuration for the expense engine

use balance_ledger::LedgerSettings;
use serde::{Deserialize, Serialize};

/// Expense engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Ledger settings and actor mailbox
    pub ledger: balance_ledger::Config,

    /// Simplifier settings
    pub simplifier: debt_simplifier::Config,

    /// Notification bus
    pub notifications: NotificationConfig,

    /// Simplify a group's debts after every expense
    pub auto_simplify: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "expense-engine".to_string(),
            ledger: balance_ledger::Config::default(),
            simplifier: debt_simplifier::Config::default(),
            notifications: NotificationConfig::default(),
            auto_simplify: false,
        }
    }
}

/// Notification bus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Broadcast buffer per subscriber
    pub channel_capacity: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
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
        let mut config = Config {
            ledger: balance_ledger::Config::from_env()?,
            simplifier: debt_simplifier::Config::from_env()?,
            ..Config::default()
        };

        if let Ok(auto) = std::env::var("EXPENSE_AUTO_SIMPLIFY") {
            config.auto_simplify = auto
                .parse()
                .map_err(|e| crate::Error::Config(format!("EXPENSE_AUTO_SIMPLIFY: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the whole configuration
    pub fn validate(&self) -> crate::Result<()> {
        self.ledger.validate()?;
        self.simplifier.validate()?;
        if self.notifications.channel_capacity == 0 {
            return Err(crate::Error::Config(
                "channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Arithmetic settings shared by splits and ledgers
    pub fn settings(&self) -> LedgerSettings {
        self.ledger.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use debt_simplifier::MatchOrder;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "expense-engine");
        assert!(!config.auto_simplify);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_nested_toml() {
        let config = Config::from_toml(
            r#"
            auto_simplify = true

            [ledger.ledger]
            epsilon = "0.0001"
            currency_scale = 3

            [simplifier]
            match_order = "largest_first"

            [notifications]
            channel_capacity = 8
            "#,
        )
        .unwrap();

        assert!(config.auto_simplify);
        assert_eq!(config.settings().currency_scale, 3);
        assert_eq!(config.simplifier.match_order, MatchOrder::LargestFirst);
        assert_eq!(config.notifications.channel_capacity, 8);
    }

    #[test]
    fn test_reject_zero_capacity() {
        let result = Config::from_toml(
            r#"
            [notifications]
            channel_capacity = 0
            "#,
        );
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }
}
