//! Prometheus exporter for JSON endpoints.
//!
//! On every scrape of `/probe` the exporter fetches the `target` URL, selects
//! values from the JSON response with the `jsonpath.<metric>` expressions of
//! the query string, and returns them as gauges next to `probe_success` and
//! `probe_duration_seconds`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ /probe query │──>│   Resolver   │──>│ Fetch + JSON │──>│ per-probe    │
//! │  parameters  │   │   (params)   │   │  extraction  │   │  registry    │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! Each probe builds its own registry, so concurrent probes never share
//! metric state. The exporter's own counters live in [`ExporterMetrics`].
//!
//! # Usage
//!
//! ```bash
//! json-exporter --listen-address 0.0.0.0:9116
//! curl 'http://localhost:9116/probe?target=http://device/status&jsonpath.temperature=$.temp'
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod collector;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod jsonpath;
pub mod mapping;
pub mod metrics;
pub mod params;
pub mod probe;

pub use collector::ProbeCollector;
pub use config::ExporterConfig;
pub use error::ProbeError;
pub use http::{AppState, HttpServer, create_router};
pub use metrics::ExporterMetrics;
pub use params::ProbeRequest;
pub use probe::Prober;
