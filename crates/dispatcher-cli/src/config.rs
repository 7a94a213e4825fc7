use std::path::{Path, PathBuf};
use std::time::Duration;

use dispatcher_core::ReclaimPolicy;
use dispatcher_core::app::DEFAULT_UTC_OFFSET;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub reclaim: ReclaimConfig,
    pub time: TimeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub snapshot_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReclaimConfig {
    pub interval_secs: u64,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Civil offset for stored timestamps.
    pub utc_offset: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "0.0.0.0:80".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            snapshot_path: PathBuf::from("task.json"),
        }
    }
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        let policy = ReclaimPolicy::default();
        ReclaimConfig {
            interval_secs: policy.interval.as_secs(),
            timeout_secs: policy.timeout.as_secs(),
        }
    }
}

impl Default for TimeConfig {
    fn default() -> Self {
        TimeConfig {
            utc_offset: DEFAULT_UTC_OFFSET.to_string(),
        }
    }
}

impl DispatcherConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: DispatcherConfig = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.reclaim.interval_secs == 0 {
            anyhow::bail!("reclaim.interval_secs must be greater than zero");
        }
        let max = ReclaimPolicy::MAX_PERIOD.as_secs();
        if self.reclaim.interval_secs > max {
            anyhow::bail!("reclaim.interval_secs must be at most {max}");
        }
        if self.reclaim.timeout_secs > max {
            anyhow::bail!("reclaim.timeout_secs must be at most {max}");
        }
        Ok(())
    }

    pub fn reclaim_policy(&self) -> ReclaimPolicy {
        ReclaimPolicy {
            interval: Duration::from_secs(self.reclaim.interval_secs),
            timeout: Duration::from_secs(self.reclaim.timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_match_reclaim_policy() {
        let config = DispatcherConfig::default();
        assert_eq!(config.reclaim_policy(), ReclaimPolicy::default());
        assert_eq!(config.storage.snapshot_path, PathBuf::from("task.json"));
        assert_eq!(config.time.utc_offset, "+08:00");
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "server:\n  bind: 127.0.0.1:8080\nreclaim:\n  timeout_secs: 600\n",
        )
        .unwrap();

        let config = DispatcherConfig::from_file(&path).unwrap();

        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.reclaim.timeout_secs, 600);
        assert_eq!(config.reclaim.interval_secs, 3600);
        assert_eq!(config.time, TimeConfig::default());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = DispatcherConfig::default();
        config.reclaim.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[rstest]
    #[case::interval_over_max(ReclaimPolicy::MAX_PERIOD.as_secs() + 1, 3600)]
    #[case::interval_u64_max(u64::MAX, 3600)]
    #[case::timeout_over_max(3600, ReclaimPolicy::MAX_PERIOD.as_secs() + 1)]
    #[case::timeout_u64_max(3600, u64::MAX)]
    fn oversized_reclaim_durations_are_rejected(
        #[case] interval_secs: u64,
        #[case] timeout_secs: u64,
    ) {
        let mut config = DispatcherConfig::default();
        config.reclaim.interval_secs = interval_secs;
        config.reclaim.timeout_secs = timeout_secs;
        assert!(config.validate().is_err());
    }

    #[test]
    fn durations_at_max_are_accepted() {
        let mut config = DispatcherConfig::default();
        config.reclaim.interval_secs = ReclaimPolicy::MAX_PERIOD.as_secs();
        config.reclaim.timeout_secs = ReclaimPolicy::MAX_PERIOD.as_secs();
        assert!(config.validate().is_ok());
        assert_eq!(config.reclaim_policy().clamped(), config.reclaim_policy());
    }
}
