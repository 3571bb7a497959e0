//! Queue settings loaded from file and environment
//!
//! Mirrors the domain `QueueConfig` with serde-friendly fields so deployments
//! can tune a queue from a `relayq.toml` next to the binary or from
//! `RELAYQ_*` environment variables.

use std::path::Path;
use std::time::Duration;

use domain::{DomainError, QueueConfig, QueueName};
use serde::{Deserialize, Serialize};

const fn default_retries() -> u32 {
    2
}

const fn default_retry_delay_ms() -> u64 {
    60_000
}

fn default_retry_multipliers() -> Vec<u32> {
    vec![1, 3, 5, 10]
}

const fn default_work_item_timeout_ms() -> u64 {
    10 * 60 * 1000
}

const fn default_dead_letter_ttl_secs() -> u64 {
    24 * 60 * 60
}

const fn default_dead_letter_max_items() -> usize {
    100
}

const fn default_true() -> bool {
    true
}

/// Deployment-facing queue settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSettings {
    /// Queue name; omit to derive it from the payload type
    #[serde(default)]
    pub queue_name: Option<String>,

    /// Max abandons before dead-lettering
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Base retry delay in milliseconds; 0 disables delayed retry
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-attempt delay multipliers; the last value clamps later attempts
    #[serde(default = "default_retry_multipliers")]
    pub retry_multipliers: Vec<u32>,

    /// In-flight lease in milliseconds before automatic abandon
    #[serde(default = "default_work_item_timeout_ms")]
    pub work_item_timeout_ms: u64,

    /// TTL in seconds applied to dead-lettered payloads
    #[serde(default = "default_dead_letter_ttl_secs")]
    pub dead_letter_ttl_secs: u64,

    /// Dead list is trimmed beyond this bound
    #[serde(default = "default_dead_letter_max_items")]
    pub dead_letter_max_items: usize,

    /// Whether this instance participates in maintenance
    #[serde(default = "default_true")]
    pub run_maintenance_tasks: bool,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            queue_name: None,
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            retry_multipliers: default_retry_multipliers(),
            work_item_timeout_ms: default_work_item_timeout_ms(),
            dead_letter_ttl_secs: default_dead_letter_ttl_secs(),
            dead_letter_max_items: default_dead_letter_max_items(),
            run_maintenance_tasks: default_true(),
        }
    }
}

impl QueueSettings {
    /// Load settings from an optional `relayq` file plus `RELAYQ_*` env vars
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("relayq").required(false))
            .add_source(config::Environment::with_prefix("RELAYQ").try_parsing(true));
        builder.build()?.try_deserialize()
    }

    /// Load settings from an explicit file, still honoring `RELAYQ_*` env vars
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("RELAYQ").try_parsing(true));
        builder.build()?.try_deserialize()
    }

    /// The configured queue name, sanitized
    pub fn queue_name(&self) -> Result<Option<QueueName>, DomainError> {
        self.queue_name
            .as_deref()
            .map(QueueName::new)
            .transpose()
    }

    /// Convert into the domain configuration
    #[must_use]
    pub fn to_queue_config(&self) -> QueueConfig {
        QueueConfig::default()
            .with_retries(self.retries)
            .with_retry_delay(Duration::from_millis(self.retry_delay_ms))
            .with_retry_multipliers(self.retry_multipliers.clone())
            .with_work_item_timeout(Duration::from_millis(self.work_item_timeout_ms))
            .with_dead_letter_ttl(Duration::from_secs(self.dead_letter_ttl_secs))
            .with_dead_letter_max_items(self.dead_letter_max_items)
            .with_maintenance_tasks(self.run_maintenance_tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_the_domain_config() {
        let settings = QueueSettings::default();
        assert_eq!(settings.to_queue_config(), QueueConfig::default());
        assert!(settings.queue_name().unwrap().is_none());
    }

    #[test]
    fn toml_overrides_take_effect() {
        let settings: QueueSettings = toml::from_str(
            r#"
            queue_name = "tenant:orders"
            retries = 5
            retry_delay_ms = 250
            retry_multipliers = [1, 2]
            run_maintenance_tasks = false
            "#,
        )
        .unwrap();

        let config = settings.to_queue_config();
        assert_eq!(config.retries, 5);
        assert_eq!(config.retry_delay, Duration::from_millis(250));
        assert_eq!(config.retry_multipliers, vec![1, 2]);
        assert!(!config.run_maintenance_tasks);
        // Unset fields keep their defaults.
        assert_eq!(config.dead_letter_max_items, 100);

        let name = settings.queue_name().unwrap().unwrap();
        assert_eq!(name.as_str(), "tenant-orders");
    }

    #[test]
    fn load_from_reads_an_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relayq.toml");
        std::fs::write(&path, "retries = 7\nretry_delay_ms = 125\n").unwrap();

        let settings = QueueSettings::load_from(&path).unwrap();
        assert_eq!(settings.retries, 7);
        assert_eq!(settings.retry_delay_ms, 125);
        // Unset fields keep their defaults.
        assert_eq!(settings.dead_letter_max_items, 100);
    }

    #[test]
    fn load_from_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(QueueSettings::load_from(&path).is_err());
    }

    #[test]
    fn invalid_queue_name_is_rejected() {
        let settings = QueueSettings {
            queue_name: Some("   ".to_string()),
            ..QueueSettings::default()
        };
        assert!(settings.queue_name().is_err());
    }

    #[test]
    fn settings_roundtrip_through_serde() {
        let settings = QueueSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: QueueSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.retries, settings.retries);
        assert_eq!(parsed.retry_multipliers, settings.retry_multipliers);
    }
}
