//! Configuration for the availability monitor and the credential sweeper.

use std::time::Duration;

use rollbook_storage::ConfigError;
use serde::{Deserialize, Serialize};

/// Default interval between availability probes (15 minutes).
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Default interval between credential sweeps (30 minutes).
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Default connect timeout for upstream requests (30 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default overall request timeout for upstream requests (30 seconds).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the upstream HTTP client and the availability monitor.
///
/// # Example
///
/// ```
/// use rollbook_upstream::MonitorConfig;
///
/// let config = MonitorConfig::builder()
///     .base_url("https://upstream.example".to_owned())
///     .build()?;
/// # Ok::<(), rollbook_storage::ConfigError>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorConfig {
    /// Upstream base URL probed for availability.
    pub(crate) base_url: String,

    /// Interval between probes.
    #[serde(with = "humantime_serde", default = "default_probe_interval")]
    pub(crate) probe_interval: Duration,

    /// Connection timeout for every upstream request.
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub(crate) connect_timeout: Duration,

    /// Overall timeout for every upstream request.
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub(crate) request_timeout: Duration,
}

fn default_probe_interval() -> Duration {
    DEFAULT_PROBE_INTERVAL
}

fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

#[bon::bon]
impl MonitorConfig {
    /// Creates a monitor configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `base_url` is empty or any duration is
    /// zero.
    #[builder]
    pub fn new(
        base_url: String,
        #[builder(default = DEFAULT_PROBE_INTERVAL)] probe_interval: Duration,
        #[builder(default = DEFAULT_CONNECT_TIMEOUT)] connect_timeout: Duration,
        #[builder(default = DEFAULT_REQUEST_TIMEOUT)] request_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        if base_url.trim().is_empty() {
            return Err(ConfigError::Empty { field: "base_url" });
        }
        for (field, value) in [
            ("probe_interval", probe_interval),
            ("connect_timeout", connect_timeout),
            ("request_timeout", request_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::BelowMinimum {
                    field,
                    min: "1ms".into(),
                    value: "0".into(),
                });
            }
        }
        Ok(Self { base_url, probe_interval, connect_timeout, request_timeout })
    }

    /// The configured probe interval.
    #[must_use]
    pub fn probe_interval(&self) -> Duration {
        self.probe_interval
    }
}

/// Configuration for the credential sweeper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    /// Interval between sweeps.
    #[serde(with = "humantime_serde", default = "default_sweep_interval")]
    pub(crate) sweep_interval: Duration,
}

fn default_sweep_interval() -> Duration {
    DEFAULT_SWEEP_INTERVAL
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self { sweep_interval: DEFAULT_SWEEP_INTERVAL }
    }
}

#[bon::bon]
impl SweepConfig {
    /// Creates a sweep configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the interval is zero.
    #[builder]
    pub fn new(
        #[builder(default = DEFAULT_SWEEP_INTERVAL)] sweep_interval: Duration,
    ) -> Result<Self, ConfigError> {
        if sweep_interval.is_zero() {
            return Err(ConfigError::BelowMinimum {
                field: "sweep_interval",
                min: "1ms".into(),
                value: "0".into(),
            });
        }
        Ok(Self { sweep_interval })
    }

    /// The configured sweep interval.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_base_url_is_rejected() {
        let err = MonitorConfig::builder().base_url("  ".to_owned()).build().unwrap_err();
        assert!(matches!(err, ConfigError::Empty { field: "base_url" }));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = MonitorConfig::builder()
            .base_url("https://upstream.example".to_owned())
            .probe_interval(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::BelowMinimum { field: "probe_interval", .. }));
    }

    #[test]
    fn durations_deserialize_from_humantime() {
        let config: MonitorConfig = serde_json::from_str(
            r#"{"base_url":"https://upstream.example","probe_interval":"15m"}"#,
        )
        .unwrap();
        assert_eq!(config.probe_interval(), Duration::from_secs(900));
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }
}
