use crate::errors::ServiceError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const EXPORT_DIR_VAR: &str = "INSURANCE_EXPORT_DIR";
pub const LATENCY_VAR: &str = "INSURANCE_SIMULATED_LATENCY_MS";
pub const LOG_LEVEL_VAR: &str = "RUST_LOG";

/// Runtime settings for the form engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Where exported application documents are written.
    pub export_dir: PathBuf,
    /// Artificial delay applied to every catalog and store call.
    pub simulated_latency_ms: u64,
    /// Filter handed to the logger, e.g. `info` or `insurance_form_core=debug`.
    pub log_level: Option<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            export_dir: std::env::temp_dir().join("insurance-exports"),
            simulated_latency_ms: 0,
            log_level: None,
        }
    }
}

impl PortalConfig {
    /// Read settings from the environment, loading a `.env` file first when present.
    pub fn from_env() -> Result<Self, ServiceError> {
        dotenv::dotenv().ok();

        let mut config = Self::default();
        if let Ok(dir) = std::env::var(EXPORT_DIR_VAR) {
            if !dir.trim().is_empty() {
                config.export_dir = PathBuf::from(dir);
            }
        }
        if let Ok(latency) = std::env::var(LATENCY_VAR) {
            config.simulated_latency_ms = latency.trim().parse().map_err(|_| {
                ServiceError::Configuration(format!(
                    "{} must be a whole number of milliseconds, got '{}'",
                    LATENCY_VAR, latency
                ))
            })?;
        }
        if let Ok(level) = std::env::var(LOG_LEVEL_VAR) {
            config.log_level = Some(level);
        }
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ServiceError> {
        serde_json::from_str(json)
            .map_err(|e| ServiceError::Configuration(format!("invalid configuration: {}", e)))
    }

    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }
}

/// Start the logger once; later calls are no-ops.
pub fn init_logging(config: &PortalConfig) {
    let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };
    let filter = config.log_level.as_deref().unwrap_or(default_level);
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PortalConfig::from_json(r#"{"simulated_latency_ms": 250}"#).unwrap();
        assert_eq!(config.simulated_latency(), Duration::from_millis(250));
        assert_eq!(config.export_dir, PortalConfig::default().export_dir);
    }

    #[test]
    fn test_bad_json_is_a_configuration_error() {
        assert!(matches!(
            PortalConfig::from_json("{"),
            Err(ServiceError::Configuration(_))
        ));
        assert!(matches!(
            PortalConfig::from_json(r#"{"simulated_latency_ms": -1}"#),
            Err(ServiceError::Configuration(_))
        ));
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        let config = PortalConfig::default();
        init_logging(&config);
        init_logging(&config);
    }
}
