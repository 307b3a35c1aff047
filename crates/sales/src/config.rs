//! Coordinator configuration loaded from environment variables.

use std::time::Duration;

/// Transaction and reporting settings with sensible defaults.
///
/// Reads from environment variables:
/// - `SALES_MAX_ATTEMPTS` (default: `3`)
/// - `SALES_TX_TIMEOUT_MS` (default: `5000`)
/// - `SALES_RETRY_BACKOFF_MS` (default: `20`)
/// - `SALES_LOW_STOCK_THRESHOLD` (default: `10`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Attempts per operation when commits conflict; at least 1.
    pub max_attempts: u32,
    /// Upper bound for a single attempt.
    pub transaction_timeout: Duration,
    /// Pause before retry `n` is `n * retry_backoff`.
    pub retry_backoff: Duration,
    /// Articles strictly below this quantity are reported as low stock.
    pub low_stock_threshold: u32,
}

impl CoordinatorConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |name: &str| lookup(name).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            max_attempts: number("SALES_MAX_ATTEMPTS")
                .map(|n| n.clamp(1, u32::MAX as u64) as u32)
                .unwrap_or(defaults.max_attempts),
            transaction_timeout: number("SALES_TX_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.transaction_timeout),
            retry_backoff: number("SALES_RETRY_BACKOFF_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_backoff),
            low_stock_threshold: number("SALES_LOW_STOCK_THRESHOLD")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.low_stock_threshold),
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            transaction_timeout: Duration::from_millis(5000),
            retry_backoff: Duration::from_millis(20),
            low_stock_threshold: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.transaction_timeout, Duration::from_secs(5));
        assert_eq!(config.retry_backoff, Duration::from_millis(20));
        assert_eq!(config.low_stock_threshold, 10);
    }

    #[test]
    fn test_values_read_from_variables() {
        let config = CoordinatorConfig::from_lookup(lookup(&[
            ("SALES_MAX_ATTEMPTS", "5"),
            ("SALES_TX_TIMEOUT_MS", "250"),
            ("SALES_RETRY_BACKOFF_MS", "0"),
            ("SALES_LOW_STOCK_THRESHOLD", "3"),
        ]));
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.transaction_timeout, Duration::from_millis(250));
        assert_eq!(config.retry_backoff, Duration::ZERO);
        assert_eq!(config.low_stock_threshold, 3);
    }

    #[test]
    fn test_unparsable_values_fall_back_to_defaults() {
        let config = CoordinatorConfig::from_lookup(lookup(&[
            ("SALES_MAX_ATTEMPTS", "many"),
            ("SALES_TX_TIMEOUT_MS", "-1"),
        ]));
        assert_eq!(config, CoordinatorConfig::default());
    }

    #[test]
    fn test_zero_attempts_is_raised_to_one() {
        let config = CoordinatorConfig::from_lookup(lookup(&[("SALES_MAX_ATTEMPTS", "0")]));
        assert_eq!(config.max_attempts, 1);
    }
}
