//! Per-probe metric registry.
//!
//! Every probe builds its own [`ProbeCollector`], so user supplied metric names
//! from concurrent probes never meet in a shared registry.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, AtomicU64};
use std::time::Duration;

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

use crate::error::RegistrationError;
use crate::mapping::is_valid_metric_name;

/// Label attached to every extracted field gauge.
pub const HOSTNAME_LABEL: &str = "hostname";

/// Content type of [`ProbeCollector::render`] output.
pub const OPENMETRICS_CONTENT_TYPE: &str =
    "application/openmetrics-text; version=1.0.0; charset=utf-8";

const PROBE_SUCCESS: &str = "probe_success";
const PROBE_DURATION: &str = "probe_duration_seconds";

type FieldGauge = Family<Vec<(String, String)>, Gauge<f64, AtomicU64>>;

/// A one-shot registry holding the result of a single probe.
#[derive(Debug)]
pub struct ProbeCollector {
    registry: Registry,
    names: HashSet<String>,
    hostname: String,
    success: Gauge<i64, AtomicI64>,
    duration: Gauge<f64, AtomicU64>,
}

impl ProbeCollector {
    /// Create an empty registry for a probe of `hostname`.
    ///
    /// `probe_success` and `probe_duration_seconds` are registered up front
    /// so field gauges cannot take their names.
    pub fn new(hostname: impl Into<String>) -> Self {
        let mut registry = Registry::default();
        let success = Gauge::<i64, AtomicI64>::default();
        let duration = Gauge::<f64, AtomicU64>::default();

        registry.register(
            PROBE_SUCCESS,
            "Displays whether or not the probe was a success",
            success.clone(),
        );
        registry.register(
            PROBE_DURATION,
            "Returns how long the probe took to complete in seconds",
            duration.clone(),
        );

        Self {
            registry,
            names: HashSet::from([PROBE_SUCCESS.to_string(), PROBE_DURATION.to_string()]),
            hostname: hostname.into(),
            success,
            duration,
        }
    }

    /// Register a gauge named `name` carrying `value`.
    ///
    /// Names are not deduplicated: registering the same name twice fails.
    pub fn add_field(&mut self, name: &str, value: f64) -> Result<(), RegistrationError> {
        if !is_valid_metric_name(name) {
            return Err(RegistrationError::InvalidName(name.to_string()));
        }
        if !self.names.insert(name.to_string()) {
            return Err(RegistrationError::Duplicate(name.to_string()));
        }

        let gauge = FieldGauge::default();
        gauge
            .get_or_create(&vec![(HOSTNAME_LABEL.to_string(), self.hostname.clone())])
            .set(value);
        self.registry.register(name, "Retrieved value", gauge);

        Ok(())
    }

    /// Number of field gauges registered so far.
    #[cfg(test)]
    fn field_count(&self) -> usize {
        self.names.len() - 2
    }

    /// Mark the probe successful, record its duration and encode the registry.
    pub fn render(self, duration: Duration) -> Result<String, std::fmt::Error> {
        self.success.set(1);
        self.duration.set(duration.as_secs_f64());

        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_probe_gauges() {
        let collector = ProbeCollector::new("example.com");
        let output = collector.render(Duration::from_millis(250)).unwrap();

        assert!(output.contains("# TYPE probe_success gauge"));
        assert!(output.contains("probe_success 1"));
        assert!(output.contains("# TYPE probe_duration_seconds gauge"));
        assert!(output.contains("probe_duration_seconds 0.25"));
        assert!(output.ends_with("# EOF\n"));
    }

    #[test]
    fn test_field_gauge_with_hostname_label() {
        let mut collector = ProbeCollector::new("127.0.0.1:8080");
        collector.add_field("temperature", 23.0).unwrap();
        assert_eq!(collector.field_count(), 1);

        let output = collector.render(Duration::ZERO).unwrap();
        assert!(output.contains("# HELP temperature Retrieved value."));
        assert!(output.contains("# TYPE temperature gauge"));
        assert!(output.contains("temperature{hostname=\"127.0.0.1:8080\"} 23"));
    }

    #[test]
    fn test_fields_are_rendered_in_registration_order() {
        let mut collector = ProbeCollector::new("host");
        collector.add_field("zeta", 1.0).unwrap();
        collector.add_field("alpha", 2.0).unwrap();

        let output = collector.render(Duration::ZERO).unwrap();
        let zeta = output.find("# TYPE zeta").unwrap();
        let alpha = output.find("# TYPE alpha").unwrap();
        let success = output.find("# TYPE probe_success").unwrap();

        assert!(success < zeta);
        assert!(zeta < alpha);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut collector = ProbeCollector::new("host");
        collector.add_field("value", 1.0).unwrap();

        assert_eq!(
            collector.add_field("value", 2.0),
            Err(RegistrationError::Duplicate("value".to_string()))
        );
    }

    #[test]
    fn test_fixed_names_reserved() {
        let mut collector = ProbeCollector::new("host");

        assert_eq!(
            collector.add_field("probe_success", 1.0),
            Err(RegistrationError::Duplicate("probe_success".to_string()))
        );
        assert_eq!(
            collector.add_field("probe_duration_seconds", 1.0),
            Err(RegistrationError::Duplicate(
                "probe_duration_seconds".to_string()
            ))
        );
    }

    #[test]
    fn test_invalid_name_rejected() {
        let mut collector = ProbeCollector::new("host");

        assert_eq!(
            collector.add_field("cpu-usage", 1.0),
            Err(RegistrationError::InvalidName("cpu-usage".to_string()))
        );
        assert_eq!(collector.field_count(), 0);
    }

    #[test]
    fn test_collectors_are_independent() {
        let mut first = ProbeCollector::new("a");
        let mut second = ProbeCollector::new("b");

        first.add_field("value", 1.0).unwrap();
        second.add_field("value", 2.0).unwrap();

        let first = first.render(Duration::ZERO).unwrap();
        let second = second.render(Duration::ZERO).unwrap();

        assert!(first.contains("value{hostname=\"a\"} 1"));
        assert!(!first.contains("hostname=\"b\""));
        assert!(second.contains("value{hostname=\"b\"} 2"));
    }
}
