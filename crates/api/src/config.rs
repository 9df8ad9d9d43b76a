//! Application configuration loaded from environment variables.

use domain::{Money, PricingPolicy};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL URL; unset selects the in-memory store
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `FREE_SHIPPING_THRESHOLD_CENTS`: subtotal above which shipping is free
///   (default: `10000`)
/// - `FLAT_SHIPPING_CENTS`: shipping charged otherwise (default: `1000`)
/// - `TAX_RATE_BPS`: tax rate in basis points (default: `1000`)
///
/// Unparseable numbers fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub pricing: PricingPolicy,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |key: &str| lookup(key).and_then(|v| v.trim().parse::<i64>().ok());

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.database_max_connections),
            pricing: PricingPolicy {
                free_shipping_threshold: number("FREE_SHIPPING_THRESHOLD_CENTS")
                    .filter(|cents| *cents >= 0)
                    .map(Money::from_cents)
                    .unwrap_or(defaults.pricing.free_shipping_threshold),
                flat_shipping_cost: number("FLAT_SHIPPING_CENTS")
                    .filter(|cents| *cents >= 0)
                    .map(Money::from_cents)
                    .unwrap_or(defaults.pricing.flat_shipping_cost),
                tax_rate_bps: lookup("TAX_RATE_BPS")
                    .and_then(|bps| bps.trim().parse().ok())
                    .unwrap_or(defaults.pricing.tax_rate_bps),
            },
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            database_max_connections: 10,
            pricing: PricingPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert!(config.database_url.is_none());
        assert_eq!(config.pricing, PricingPolicy::default());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_lookup_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("FREE_SHIPPING_THRESHOLD_CENTS", "5000"),
            ("FLAT_SHIPPING_CENTS", "499"),
            ("TAX_RATE_BPS", "825"),
        ]));

        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/shop"));
        assert_eq!(config.pricing.free_shipping_threshold, Money::from_cents(5000));
        assert_eq!(config.pricing.flat_shipping_cost, Money::from_cents(499));
        assert_eq!(config.pricing.tax_rate_bps, 825);
    }

    #[test]
    fn test_unparseable_values_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "not-a-port"),
            ("FLAT_SHIPPING_CENTS", "-5"),
            ("TAX_RATE_BPS", "ten percent"),
            ("DATABASE_URL", ""),
        ]));

        assert_eq!(config.port, 3000);
        assert_eq!(config.pricing, PricingPolicy::default());
        assert!(config.database_url.is_none());
    }
}
