use std::env;
use std::time::Duration;

use crate::error::AppError;
use crate::pricing::PricingConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub pricing: PricingConfig,
    pub route_timeout_ms: u64,
    pub driver_location_ttl_secs: u64,
    pub available_drivers_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let defaults = PricingConfig::default();
        let pricing = PricingConfig {
            base_fare: parse_or_default("BASE_FARE", defaults.base_fare)?,
            rate_per_km: parse_or_default("RATE_PER_KM", defaults.rate_per_km)?,
            rate_per_min: parse_or_default("RATE_PER_MIN", defaults.rate_per_min)?,
            gst_rate: parse_or_default("GST_RATE", defaults.gst_rate)?,
            ..defaults
        };

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            pricing,
            route_timeout_ms: parse_or_default("ROUTE_TIMEOUT_MS", 2_000)?,
            driver_location_ttl_secs: parse_or_default("DRIVER_LOCATION_TTL_SECS", 10)?,
            available_drivers_ttl_secs: parse_or_default("AVAILABLE_DRIVERS_TTL_SECS", 5)?,
        })
    }

    pub fn route_timeout(&self) -> Duration {
        Duration::from_millis(self.route_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            pricing: PricingConfig::default(),
            route_timeout_ms: 2_000,
            driver_location_ttl_secs: 10,
            available_drivers_ttl_secs: 5,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
