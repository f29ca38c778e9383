//! Configuration loading
//!
//! Timer configurations are JSON objects with camelCase keys, e.g.
//! `{"mode": "countdown", "duration": "1h 30m", "interval": 500}`.

use std::fs;
use std::path::Path;

use flextimer_core::TimerConfig;
use tracing::debug;

use crate::RuntimeResult;

pub fn parse_config(text: &str) -> RuntimeResult<TimerConfig> {
    Ok(serde_json::from_str(text)?)
}

pub fn load_config(path: impl AsRef<Path>) -> RuntimeResult<TimerConfig> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let config = parse_config(&text)?;
    debug!(path = %path.display(), mode = %config.mode, "loaded timer config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RuntimeError;
    use flextimer_core::{DurationInput, TimerMode};
    use std::process;

    #[test]
    fn test_parse_config() {
        let config = parse_config(
            r#"{"mode": "stopwatch", "interval": 100, "loop": true, "showLabels": false}"#,
        )
        .unwrap();
        assert_eq!(config.mode, TimerMode::Stopwatch);
        assert_eq!(config.interval, 100.0);
        assert!(config.repeat);
        assert!(!config.display.show_labels);
        assert!(config.auto_start);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_config("{"), Err(RuntimeError::Json(_))));
        assert!(matches!(
            parse_config(r#"{"mode": "sideways"}"#),
            Err(RuntimeError::Json(_))
        ));
    }

    #[test]
    fn test_load_config_from_file() {
        let path = std::env::temp_dir().join(format!("flextimer-config-{}.json", process::id()));
        fs::write(&path, r#"{"duration": "1m 30s", "autoStart": false}"#).unwrap();

        let config = load_config(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.duration, Some(DurationInput::Text("1m 30s".into())));
        assert_eq!(config.duration.unwrap().to_millis().unwrap(), 90_000.0);
        assert!(!config.auto_start);
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/nonexistent/flextimer/config.json");
        assert!(matches!(result, Err(RuntimeError::Io(_))));
    }
}
