//! Tracing subscriber setup

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::{RuntimeError, RuntimeResult};

/// Log output settings. `RUST_LOG` overrides `filter` when set.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives, e.g. `"info,flextimer_time=debug"`
    pub filter: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        TelemetryConfig {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Install the global fmt subscriber. Fails if one is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> RuntimeResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| RuntimeError::Telemetry(format!("bad filter {:?}: {}", config.filter, e)))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| RuntimeError::Telemetry(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TelemetryConfig::default();
        assert_eq!(config.filter, "info");
        assert!(!config.json);

        let config: TelemetryConfig = serde_json::from_str(r#"{"json": true}"#).unwrap();
        assert_eq!(config.filter, "info");
        assert!(config.json);
    }

    #[test]
    fn test_second_install_fails() {
        let config = TelemetryConfig::default();
        let _ = init_tracing(&config);
        assert!(matches!(init_tracing(&config), Err(RuntimeError::Telemetry(_))));
    }
}
