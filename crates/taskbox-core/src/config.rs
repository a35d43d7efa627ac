//! Runtime configuration.
//!
//! # Environment variables
//!
//! - `TASKBOX_WORKERS`: background worker count (default: 100)
//! - `TASKBOX_COMPLETION_MIN_SECS` / `TASKBOX_COMPLETION_MAX_SECS`: completion delay (default: 5-10)
//! - `TASKBOX_FETCH_MIN_SECS` / `TASKBOX_FETCH_MAX_SECS`: default fetch delay (default: 1-4)
//! - `TASKBOX_PARTITION_TTL_SECS`: evict partitions idle this long, `0` disables (default: 86400)
//! - `TASKBOX_JANITOR_INTERVAL_SECS`: how often eviction runs (default: 60)

use std::time::Duration;

use thiserror::Error;

use crate::scheduler::{DelayRange, JobDelays};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}={value:?} is not a valid number")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub workers: usize,
    pub completion_delay: DelayRange,
    pub fetch_delay: DelayRange,
    /// `None` keeps partitions for the life of the process.
    pub partition_ttl: Option<Duration>,
    pub janitor_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: 100,
            completion_delay: DelayRange::completion_default(),
            fetch_delay: DelayRange::fetch_default(),
            partition_ttl: Some(Duration::from_secs(24 * 60 * 60)),
            janitor_interval: Duration::from_secs(60),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; unset or blank variables keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |var: &'static str| -> Result<Option<u64>, ConfigError> {
            let Some(value) = lookup(var) else {
                return Ok(None);
            };
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<u64>()
                .map(Some)
                .map_err(|_| ConfigError::Invalid { var, value })
        };
        let secs = |var, default: Duration| -> Result<Duration, ConfigError> {
            Ok(read(var)?.map(Duration::from_secs).unwrap_or(default))
        };

        let workers = read("TASKBOX_WORKERS")?
            .map(|n| n as usize)
            .unwrap_or(defaults.workers);
        let completion_delay = DelayRange::new(
            secs("TASKBOX_COMPLETION_MIN_SECS", defaults.completion_delay.min)?,
            secs("TASKBOX_COMPLETION_MAX_SECS", defaults.completion_delay.max)?,
        );
        let fetch_delay = DelayRange::new(
            secs("TASKBOX_FETCH_MIN_SECS", defaults.fetch_delay.min)?,
            secs("TASKBOX_FETCH_MAX_SECS", defaults.fetch_delay.max)?,
        );
        let partition_ttl = match read("TASKBOX_PARTITION_TTL_SECS")? {
            Some(0) => None,
            Some(n) => Some(Duration::from_secs(n)),
            None => defaults.partition_ttl,
        };
        let janitor_interval = secs("TASKBOX_JANITOR_INTERVAL_SECS", defaults.janitor_interval)?;

        Ok(Self {
            workers,
            completion_delay,
            fetch_delay,
            partition_ttl,
            janitor_interval,
        })
    }

    pub fn job_delays(&self) -> JobDelays {
        JobDelays {
            completion: self.completion_delay,
            fetch: self.fetch_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| vars.get(var).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(Config::from_lookup(lookup(&[])).unwrap(), Config::default());
    }

    #[test]
    fn variables_override_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("TASKBOX_WORKERS", "8"),
            ("TASKBOX_COMPLETION_MIN_SECS", "1"),
            ("TASKBOX_COMPLETION_MAX_SECS", " 2 "),
            ("TASKBOX_PARTITION_TTL_SECS", "0"),
            ("TASKBOX_JANITOR_INTERVAL_SECS", ""),
        ]))
        .unwrap();

        assert_eq!(config.workers, 8);
        assert_eq!(
            config.completion_delay,
            DelayRange::new(Duration::from_secs(1), Duration::from_secs(2))
        );
        assert_eq!(config.fetch_delay, DelayRange::fetch_default());
        assert_eq!(config.partition_ttl, None);
        assert_eq!(config.janitor_interval, Duration::from_secs(60));
    }

    #[rstest]
    #[case::negative("TASKBOX_WORKERS", "-1")]
    #[case::text("TASKBOX_FETCH_MAX_SECS", "soon")]
    #[case::fraction("TASKBOX_PARTITION_TTL_SECS", "1.5")]
    fn malformed_numbers_are_rejected(#[case] var: &'static str, #[case] value: &str) {
        let err = Config::from_lookup(lookup(&[(var, value)])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var,
                value: value.to_string(),
            }
        );
    }
}
