//! Spyglass - Upstream Metrics Bridge
//!
//! Polls a remote server's health and stats endpoints on every scrape and
//! re-exposes the results as a fixed set of Prometheus gauge families.
//! Collection happens synchronously within the scrape request: nothing is
//! cached, and a failing upstream degrades to zero-valued gauges rather
//! than a failed scrape.
//!
//! # Architecture
//!
//! - **Collector**: probes `/healthz`, then (only when healthy) `/stats`,
//!   and emits `health`, `cpu_load`, `memory_bytes_total`, and
//!   `memory_bytes_used` in that order
//! - **Server**: Axum endpoint encoding the family list in Prometheus
//!   text format for the scraper
//! - **Config**: YAML file with CLI/env overrides

pub mod collector;
pub mod config;
pub mod server;

pub use collector::{ServerStats, UpstreamCollector, UpstreamConfig};
pub use config::{AppConfig, ConfigError, ServerConfig};
