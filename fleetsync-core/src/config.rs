//! Process-wide startup configuration.

use std::time::Duration;

use serde::Serialize;

use crate::error::ConfigError;

pub const DEFAULT_NAMESPACE: &str = "scraper";
pub const DEFAULT_UPLOAD_INTERVAL_SECS: f64 = 300.0;
pub const DEFAULT_METRICS_PORT: u16 = 9090;
pub const DEFAULT_STATUS_PORT: u16 = 80;

/// Immutable configuration, fixed at startup and shared as `Arc<SyncConfig>`.
///
/// Construct with struct-update syntax over [`SyncConfig::default`] and pass
/// through [`SyncConfig::validated`] before use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncConfig {
    /// Datastore namespace holding the fleet entities.
    pub namespace: String,
    /// Cloud project that owns the Datastore.
    pub project_id: String,
    /// Target spreadsheet id.
    pub spreadsheet_id: String,
    /// Mean of the exponential sleep between cycles, in seconds.
    pub upload_interval_secs: f64,
    pub metrics_port: u16,
    pub status_port: u16,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            project_id: String::new(),
            spreadsheet_id: String::new(),
            upload_interval_secs: DEFAULT_UPLOAD_INTERVAL_SECS,
            metrics_port: DEFAULT_METRICS_PORT,
            status_port: DEFAULT_STATUS_PORT,
        }
    }
}

impl SyncConfig {
    /// Check every startup invariant, returning the config unchanged on success.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(ConfigError::MissingSpreadsheet);
        }
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::MissingProject);
        }
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        if !self.upload_interval_secs.is_finite() || self.upload_interval_secs <= 0.0 {
            return Err(ConfigError::InvalidInterval(self.upload_interval_secs));
        }
        if self.metrics_port == self.status_port {
            return Err(ConfigError::PortConflict(self.status_port));
        }
        Ok(self)
    }

    /// Mean sleep between cycles.
    pub fn mean_interval(&self) -> Duration {
        Duration::from_secs_f64(self.upload_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn valid() -> SyncConfig {
        SyncConfig {
            project_id: "mlab-sandbox".into(),
            spreadsheet_id: "1AbCdEf".into(),
            ..SyncConfig::default()
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = SyncConfig::default();
        assert_eq!(config.namespace, "scraper");
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.status_port, 80);
        assert_eq!(config.mean_interval(), Duration::from_secs(300));
    }

    #[test]
    fn valid_config_passes_through() {
        assert_eq!(valid().validated(), Ok(valid()));
    }

    #[rstest]
    #[case::no_spreadsheet(SyncConfig { spreadsheet_id: "  ".into(), ..valid() }, ConfigError::MissingSpreadsheet)]
    #[case::no_project(SyncConfig { project_id: String::new(), ..valid() }, ConfigError::MissingProject)]
    #[case::blank_namespace(SyncConfig { namespace: String::new(), ..valid() }, ConfigError::EmptyNamespace)]
    #[case::zero_interval(SyncConfig { upload_interval_secs: 0.0, ..valid() }, ConfigError::InvalidInterval(0.0))]
    #[case::negative_interval(SyncConfig { upload_interval_secs: -5.0, ..valid() }, ConfigError::InvalidInterval(-5.0))]
    #[case::same_ports(SyncConfig { metrics_port: 8080, status_port: 8080, ..valid() }, ConfigError::PortConflict(8080))]
    fn invalid_configs_are_rejected(#[case] config: SyncConfig, #[case] expected: ConfigError) {
        assert_eq!(config.validated(), Err(expected));
    }

    #[test]
    fn infinite_interval_is_rejected() {
        let config = SyncConfig {
            upload_interval_secs: f64::INFINITY,
            ..valid()
        };
        assert!(matches!(
            config.validated(),
            Err(ConfigError::InvalidInterval(_))
        ));
    }
}
