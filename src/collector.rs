//! Collector Layer
//!
//! A single pull-through collector that probes the upstream server on
//! every scrape and translates the outcome into an ordered list of gauge
//! metric families. There is no registry and no schedule: collection is
//! driven entirely by the scrape endpoint.

mod family;
mod upstream;

pub use upstream::{
    CollectorError, CpuStats, MemoryStats, ServerStats, UpstreamCollector, UpstreamConfig,
    DEFAULT_NAMESPACE, DEFAULT_UPSTREAM_TIMEOUT, DEFAULT_UPSTREAM_URL,
};
