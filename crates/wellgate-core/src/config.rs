// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

use std::time::Duration;

/// Wellgate Core configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Delay between visibility poll attempts.
    pub poll_interval: Duration,
    /// Visibility poll attempt limit.
    pub poll_max_attempts: u32,
    /// Queued-job channel capacity.
    pub queue_capacity: usize,
    /// Credentials cache lifetime.
    pub credentials_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            poll_max_attempts: 30,
            queue_capacity: 64,
            credentials_ttl: Duration::from_secs(3600),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// All optional (with defaults):
    /// - `WELLGATE_POLL_INTERVAL_MS`: poll delay in milliseconds (default: 1000)
    /// - `WELLGATE_POLL_MAX_ATTEMPTS`: poll attempt limit (default: 30)
    /// - `WELLGATE_JOB_QUEUE_CAPACITY`: queue capacity (default: 64)
    /// - `WELLGATE_CREDENTIALS_TTL_SECS`: credentials lifetime (default: 3600)
    pub fn from_env() -> Result<Self, ConfigError> {
        let poll_interval_ms: u64 = parse_var("WELLGATE_POLL_INTERVAL_MS", 1000)?;
        let poll_max_attempts: u32 = parse_var("WELLGATE_POLL_MAX_ATTEMPTS", 30)?;
        let queue_capacity: usize = parse_var("WELLGATE_JOB_QUEUE_CAPACITY", 64)?;
        let credentials_ttl_secs: u64 = parse_var("WELLGATE_CREDENTIALS_TTL_SECS", 3600)?;

        if poll_max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "WELLGATE_POLL_MAX_ATTEMPTS",
                "must be at least 1",
            ));
        }
        if queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "WELLGATE_JOB_QUEUE_CAPACITY",
                "must be at least 1",
            ));
        }

        Ok(Self {
            poll_interval: Duration::from_millis(poll_interval_ms),
            poll_max_attempts,
            queue_capacity,
            credentials_ttl: Duration::from_secs(credentials_ttl_secs),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid(name, "must be a positive integer")),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
