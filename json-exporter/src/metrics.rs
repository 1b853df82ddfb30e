//! The exporter's own metrics, served on the configured metrics path.

use std::time::Duration;

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;

use crate::error::ProbeError;

const RESULT_LABEL: &str = "result";
const SUCCESS: &str = "success";

/// Process-wide counters about probes served.
///
/// Lives for the whole process and is shared by all requests. Field metrics
/// from probes are never registered here.
#[derive(Debug)]
pub struct ExporterMetrics {
    registry: Registry,
    probes: Family<Vec<(String, String)>, Counter>,
    probe_duration: Histogram,
}

impl ExporterMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("json_exporter");
        let probes = Family::<Vec<(String, String)>, Counter>::default();
        let probe_duration = Histogram::new(exponential_buckets(0.005, 2.0, 12));

        registry.register("probes", "Probes served, by result", probes.clone());
        registry.register(
            "probe_duration_seconds",
            "Duration of probes whose parameters resolved",
            probe_duration.clone(),
        );

        // Every result series exists from startup, at zero.
        for result in known_results() {
            probes.get_or_create(&result_label(result));
        }

        Self {
            registry,
            probes,
            probe_duration,
        }
    }

    /// Record a probe that reached the pipeline, successful or not.
    pub fn observe(&self, outcome: Result<(), &ProbeError>, elapsed: Duration) {
        let result = match outcome {
            Ok(()) => SUCCESS,
            Err(error) => error.kind(),
        };

        self.count(result);
        self.probe_duration.observe(elapsed.as_secs_f64());
    }

    /// Record a request rejected before anything was fetched.
    pub fn reject(&self, error: &ProbeError) {
        self.count(error.kind());
    }

    fn count(&self, result: &str) {
        self.probes.get_or_create(&result_label(result)).inc();
    }

    /// Number of probes recorded with the given result label.
    ///
    /// Unknown labels read as zero and are not added to the family.
    pub fn probe_count(&self, result: &str) -> u64 {
        if !known_results().any(|known| known == result) {
            return 0;
        }
        self.probes.get_or_create(&result_label(result)).get()
    }

    /// Encode the registry in the OpenMetrics text format.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

fn known_results() -> impl Iterator<Item = &'static str> {
    std::iter::once(SUCCESS).chain(ProbeError::KINDS)
}

fn result_label(result: &str) -> Vec<(String, String)> {
    vec![(RESULT_LABEL.to_string(), result.to_string())]
}

impl Default for ExporterMetrics {
    fn default() -> Self {
        Self::new()
    }
}
