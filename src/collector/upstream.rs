//! Upstream bridge collector.
//!
//! Probes the monitored server's `/healthz` and `/stats` endpoints on every
//! scrape and translates the outcome into a fixed set of gauge families.

use std::time::Duration;

use prometheus::proto::MetricFamily;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::family;

/// Default upstream base URL.
pub const DEFAULT_UPSTREAM_URL: &str = "http://127.0.0.1:8443";

/// Default timeout for each upstream call (10 seconds).
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Default metric namespace prefix.
pub const DEFAULT_NAMESPACE: &str = "my_server_py";

fn default_base_url() -> String {
    DEFAULT_UPSTREAM_URL.to_string()
}

fn default_timeout() -> Duration {
    DEFAULT_UPSTREAM_TIMEOUT
}

/// Errors that can occur while building a collector.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}

/// Why a stats fetch produced no usable payload.
///
/// Never leaves [`UpstreamCollector::collect`]; every variant degrades to
/// zero-valued gauges and is surfaced only in logs.
#[derive(Debug, Error)]
enum StatsError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected status: {0}")]
    Status(StatusCode),

    #[error("malformed payload: {0}")]
    Malformed(#[source] reqwest::Error),
}

/// Upstream connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the monitored server.
    pub base_url: String,

    /// Timeout for each upstream call (default: 10s).
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

/// Stats payload returned by the upstream `/stats` endpoint.
///
/// Unknown extra fields are ignored; a missing field makes the whole
/// payload malformed and the scrape falls back to zero values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerStats {
    pub cpu: CpuStats,
    pub memory: MemoryStats,
}

/// CPU load averages reported by the upstream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CpuStats {
    pub load_1m: f64,
    pub load_5m: f64,
    pub load_15m: f64,
}

/// Memory usage reported by the upstream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryStats {
    pub total_bytes: u64,
    pub used_bytes: u64,
}

/// Bridge collector translating upstream health and stats into gauges.
///
/// Every call to [`collect`](Self::collect) performs fresh upstream
/// requests. Nothing is cached between scrapes and the returned families
/// are owned by the caller, so concurrent scrapes share no mutable state.
pub struct UpstreamCollector {
    namespace: String,
    base_url: String,
    client: Client,
}

impl UpstreamCollector {
    /// Create a new collector. The namespace is fixed for the collector's
    /// lifetime and prefixes every family name.
    ///
    /// # Errors
    /// Returns `CollectorError::Config` if the HTTP client cannot be built.
    pub fn new(
        namespace: impl Into<String>,
        config: UpstreamConfig,
    ) -> Result<Self, CollectorError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CollectorError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            namespace: namespace.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Metric namespace this collector was built with.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn family_name(&self, suffix: &str) -> String {
        format!("{}_{}", self.namespace, suffix)
    }

    /// Run one collection pass.
    ///
    /// Issues the health probe, then the stats fetch if and only if the
    /// probe saw HTTP 200. Always returns the same four families in the
    /// same order: `health`, `cpu_load`, `memory_bytes_total`,
    /// `memory_bytes_used`. Values degrade to zero when the upstream is
    /// down or the stats payload is unusable; the scrape itself never
    /// fails.
    pub async fn collect(&self) -> Vec<MetricFamily> {
        let healthy = self.probe_health().await;

        let stats = if healthy {
            self.fetch_stats().await.unwrap_or_else(|error| {
                tracing::warn!(
                    url = %self.base_url,
                    error = %error,
                    "stats unavailable, reporting zeros"
                );
                ServerStats::default()
            })
        } else {
            // Health gates stats: the endpoint is not contacted at all.
            ServerStats::default()
        };

        let mut families = Vec::with_capacity(4);

        families.push(family::gauge(
            self.family_name("health"),
            "server health",
            if healthy { 1.0 } else { 0.0 },
        ));

        let mut cpu_load =
            family::new_gauge_family(self.family_name("cpu_load"), "CPU load average");
        family::push_sample(&mut cpu_load, &[("bucket", "1m")], stats.cpu.load_1m);
        family::push_sample(&mut cpu_load, &[("bucket", "5m")], stats.cpu.load_5m);
        family::push_sample(&mut cpu_load, &[("bucket", "15m")], stats.cpu.load_15m);
        families.push(cpu_load);

        families.push(family::gauge(
            self.family_name("memory_bytes_total"),
            "total memory in bytes",
            stats.memory.total_bytes as f64,
        ));
        families.push(family::gauge(
            self.family_name("memory_bytes_used"),
            "used memory in bytes",
            stats.memory.used_bytes as f64,
        ));

        families
    }

    async fn probe_health(&self) -> bool {
        let url = format!("{}/healthz", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => {
                let status = response.status();
                if status == StatusCode::OK {
                    tracing::debug!(url = %url, "health probe successful");
                    true
                } else {
                    tracing::warn!(url = %url, status = %status, "upstream unhealthy");
                    false
                }
            }
            Err(error) => {
                tracing::warn!(url = %url, error = %error, "health probe failed");
                false
            }
        }
    }

    async fn fetch_stats(&self) -> Result<ServerStats, StatsError> {
        let url = format!("{}/stats", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(StatsError::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(StatsError::Status(status));
        }

        response.json().await.map_err(StatsError::Malformed)
    }
}

impl std::fmt::Debug for UpstreamCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamCollector")
            .field("namespace", &self.namespace)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_config_defaults() {
        let config = UpstreamConfig::default();
        assert_eq!(config.base_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.timeout, DEFAULT_UPSTREAM_TIMEOUT);
    }

    #[test]
    fn test_family_names_use_namespace() {
        let collector = UpstreamCollector::new("foo", UpstreamConfig::default()).unwrap();
        assert_eq!(collector.family_name("health"), "foo_health");
        assert_eq!(collector.family_name("cpu_load"), "foo_cpu_load");
        assert_eq!(
            collector.family_name("memory_bytes_total"),
            "foo_memory_bytes_total"
        );
        assert_eq!(
            collector.family_name("memory_bytes_used"),
            "foo_memory_bytes_used"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = UpstreamConfig {
            base_url: "http://10.0.0.1:8443/".to_string(),
            ..UpstreamConfig::default()
        };
        let collector = UpstreamCollector::new("foo", config).unwrap();
        assert_eq!(collector.base_url, "http://10.0.0.1:8443");
    }

    #[test]
    fn test_stats_deserialize_ignores_unknown_fields() {
        let body = r#"{
            "cpu": {"load_1m": 0.1, "load_5m": 0.2, "load_15m": 0.3, "thread_count": 16},
            "memory": {"total_bytes": 1000, "used_bytes": 400}
        }"#;

        let stats: ServerStats = serde_json::from_str(body).unwrap();
        assert_eq!(stats.cpu.load_1m, 0.1);
        assert_eq!(stats.cpu.load_5m, 0.2);
        assert_eq!(stats.cpu.load_15m, 0.3);
        assert_eq!(stats.memory.total_bytes, 1000);
        assert_eq!(stats.memory.used_bytes, 400);
    }

    #[test]
    fn test_stats_deserialize_missing_field_is_an_error() {
        let body = r#"{"cpu": {"load_1m": 0.1, "load_5m": 0.2}, "memory": {}}"#;
        assert!(serde_json::from_str::<ServerStats>(body).is_err());
    }
}
