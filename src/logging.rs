use anyhow::Result;

/// Validates that a log level string is valid
pub fn validate_log_level(level: &str) -> Result<()> {
    level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
                level
            )
        })?;
    Ok(())
}

/// Install the JSON subscriber. `RUST_LOG` wins over the configured level.
pub fn init(configured_level: &str) -> Result<String> {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| configured_level.to_string());

    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            validate_log_level(&log_level)?;
            tracing_subscriber::EnvFilter::new(&log_level)
        }
    };

    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    Ok(log_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_log_level() {
        for level in ["error", "warn", "info", "debug", "trace", "off"] {
            assert!(validate_log_level(level).is_ok(), "{level}");
        }
        assert!(validate_log_level("loud").is_err());
    }
}
