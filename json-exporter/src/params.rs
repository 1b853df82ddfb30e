//! Resolution of `/probe` query parameters into a [`ProbeRequest`].

use tracing::debug;

use crate::error::ProbeError;

/// Name of the query parameter holding the URL to probe.
pub const TARGET_PARAM: &str = "target";

/// A metric to extract: the gauge name and the path selecting its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub path: String,
}

/// A validated probe request, built fresh for every scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub target: String,
    pub fields: Vec<FieldSpec>,
}

impl ProbeRequest {
    /// Build a request from raw query pairs, in the order they were received.
    ///
    /// The first `target` value wins. Every key starting with `field_prefix`
    /// becomes a field named after the rest of the key. Names and paths are
    /// not validated here.
    pub fn from_query(params: &[(String, String)], field_prefix: &str) -> Result<Self, ProbeError> {
        let mut target = None;
        let mut fields = Vec::new();

        for (key, value) in params {
            debug!(key = %key, value = %value, "Probe parameter");

            if key == TARGET_PARAM {
                if target.is_none() {
                    target = Some(value.as_str());
                }
            } else if let Some(name) = key.strip_prefix(field_prefix) {
                fields.push(FieldSpec {
                    name: name.to_string(),
                    path: value.clone(),
                });
            }
        }

        let target = match target {
            Some(target) if !target.is_empty() => target.to_string(),
            _ => return Err(ProbeError::MissingTarget),
        };

        if fields.is_empty() {
            return Err(ProbeError::NoFieldsSpecified);
        }

        Ok(Self { target, fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "jsonpath.";

    fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_target_and_fields() {
        let params = query(&[
            ("target", "http://localhost:8080/status"),
            ("jsonpath.temperature", "$.sensors.temp"),
            ("jsonpath.humidity", "$.sensors.hum"),
        ]);

        let request = ProbeRequest::from_query(&params, PREFIX).unwrap();

        assert_eq!(request.target, "http://localhost:8080/status");
        assert_eq!(
            request.fields,
            vec![
                FieldSpec {
                    name: "temperature".to_string(),
                    path: "$.sensors.temp".to_string()
                },
                FieldSpec {
                    name: "humidity".to_string(),
                    path: "$.sensors.hum".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_field_order_follows_query() {
        let params = query(&[
            ("jsonpath.b", "$.b"),
            ("target", "http://x"),
            ("jsonpath.a", "$.a"),
            ("jsonpath.c", "$.c"),
        ]);

        let request = ProbeRequest::from_query(&params, PREFIX).unwrap();
        let names: Vec<_> = request.fields.iter().map(|f| f.name.as_str()).collect();

        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn test_duplicate_fields_are_kept() {
        let params = query(&[
            ("target", "http://x"),
            ("jsonpath.value", "$.a"),
            ("jsonpath.value", "$.b"),
        ]);

        let request = ProbeRequest::from_query(&params, PREFIX).unwrap();
        assert_eq!(request.fields.len(), 2);
    }

    #[test]
    fn test_first_target_wins() {
        let params = query(&[
            ("target", "http://first"),
            ("target", "http://second"),
            ("jsonpath.value", "$.a"),
        ]);

        let request = ProbeRequest::from_query(&params, PREFIX).unwrap();
        assert_eq!(request.target, "http://first");
    }

    #[test]
    fn test_missing_target() {
        let params = query(&[("jsonpath.value", "$.a")]);

        assert!(matches!(
            ProbeRequest::from_query(&params, PREFIX),
            Err(ProbeError::MissingTarget)
        ));
    }

    #[test]
    fn test_empty_target() {
        let params = query(&[("target", ""), ("jsonpath.value", "$.a")]);

        assert!(matches!(
            ProbeRequest::from_query(&params, PREFIX),
            Err(ProbeError::MissingTarget)
        ));
    }

    #[test]
    fn test_missing_target_reported_first() {
        assert!(matches!(
            ProbeRequest::from_query(&[], PREFIX),
            Err(ProbeError::MissingTarget)
        ));
    }

    #[test]
    fn test_no_fields() {
        let params = query(&[("target", "http://x"), ("other", "1")]);

        assert!(matches!(
            ProbeRequest::from_query(&params, PREFIX),
            Err(ProbeError::NoFieldsSpecified)
        ));
    }

    #[test]
    fn test_custom_prefix() {
        let params = query(&[
            ("target", "http://x"),
            ("jsonpath.ignored", "$.a"),
            ("field.kept", "$.b"),
        ]);

        let request = ProbeRequest::from_query(&params, "field.").unwrap();
        assert_eq!(request.fields.len(), 1);
        assert_eq!(request.fields[0].name, "kept");
    }

    #[test]
    fn test_empty_name_is_passed_through() {
        let params = query(&[("target", "http://x"), ("jsonpath.", "$.a")]);

        let request = ProbeRequest::from_query(&params, PREFIX).unwrap();
        assert_eq!(request.fields[0].name, "");
    }
}
