//! Configuration types for the client.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Worker pool sizing.
    #[serde(default)]
    pub pool: PoolConfig,

    /// Transport settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// How long a task may keep running after being stopped before it is
    /// reported as stuck (default: 10 seconds).
    #[serde(default = "default_stop_grace")]
    pub stop_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            http: HttpConfig::default(),
            stop_grace: default_stop_grace(),
        }
    }
}

/// Worker pool sizing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of concurrently running requests (default: 3)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Idle time after which a worker retires (default: 1 second)
    #[serde(default = "default_keep_alive")]
    pub keep_alive: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            keep_alive: default_keep_alive(),
        }
    }
}

/// Transport settings shared by every engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// `User-Agent` header sent with every request (default: "NMBClient/1.0")
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout (default: 30 seconds)
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

fn default_workers() -> usize {
    3
}

fn default_keep_alive() -> Duration {
    Duration::from_secs(1)
}

fn default_stop_grace() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    "NMBClient/1.0".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.pool.workers, 3);
        assert_eq!(config.pool.keep_alive, Duration::from_secs(1));
        assert_eq!(config.http.user_agent, "NMBClient/1.0");
        assert_eq!(config.http.timeout, Duration::from_secs(30));
        assert_eq!(config.stop_grace, Duration::from_secs(10));
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: Config = serde_json::from_str(r#"{"pool": {"workers": 5}}"#).unwrap();
        assert_eq!(config.pool.workers, 5);
        assert_eq!(config.pool.keep_alive, Duration::from_secs(1));
        assert_eq!(config.stop_grace, Duration::from_secs(10));
        assert_eq!(config.http.user_agent, "NMBClient/1.0");
    }
}
