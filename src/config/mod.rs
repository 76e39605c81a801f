mod types;

pub use types::*;

use crate::{Error, Result};
use std::{env, path::Path};
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Upper bound for throttle windows and block durations (one year).
pub const MAX_THROTTLE_MINUTES: u64 = 525_600;

/// Load configuration from `$CONFIG_PATH`, falling back to `config.yaml`.
///
/// A missing `config.yaml` yields defaults; a missing file named through
/// `CONFIG_PATH` is an error.
pub async fn load() -> Result<Config> {
    match env::var("CONFIG_PATH") {
        Ok(path) => load_from(&path).await,
        Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => load_from(DEFAULT_CONFIG_PATH).await,
        Err(_) => {
            debug!("No {} found, using default configuration", DEFAULT_CONFIG_PATH);
            Ok(Config::default())
        }
    }
}

pub async fn load_from(config_path: &str) -> Result<Config> {
    debug!("Loading configuration from: {}", config_path);

    let config_str = tokio::fs::read_to_string(config_path)
        .await
        .map_err(|e| Error::config(format!("cannot read {}: {}", config_path, e)))?;
    let config: Config = serde_yaml::from_str(&config_str)?;
    config.validate()?;

    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.model.max_len == 0 {
            return Err(Error::config("model.max_len must be greater than zero"));
        }

        let thresholds = &self.gateway.thresholds;
        for (name, value) in [("block", thresholds.block), ("monitor", thresholds.monitor)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::config(format!(
                    "gateway.thresholds.{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if thresholds.monitor > thresholds.block {
            return Err(Error::config(
                "gateway.thresholds.monitor must not exceed gateway.thresholds.block",
            ));
        }

        let throttling = &self.gateway.throttling;
        for (name, value) in [
            ("time_window_minutes", throttling.time_window_minutes),
            ("block_duration_minutes", throttling.block_duration_minutes),
        ] {
            if value > MAX_THROTTLE_MINUTES {
                return Err(Error::config(format!(
                    "gateway.throttling.{} must be at most {}, got {}",
                    name, MAX_THROTTLE_MINUTES, value
                )));
            }
        }

        if self.gateway.circuit_breaker.failure_threshold == 0 {
            return Err(Error::config(
                "gateway.circuit_breaker.failure_threshold must be greater than zero",
            ));
        }

        Ok(())
    }
}
