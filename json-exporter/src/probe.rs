//! The probe pipeline: fetch, decode, extract, coerce and expose.

use std::time::Instant;

use serde_json::Value;
use tracing::{debug, warn};

use crate::collector::ProbeCollector;
use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};
use crate::fetch::Fetcher;
use crate::jsonpath;
use crate::mapping::coerce_value;
use crate::params::ProbeRequest;

/// Runs probes. Holds configuration only; every probe owns its own state.
#[derive(Debug, Clone)]
pub struct Prober {
    fetcher: Fetcher,
    strict_json: bool,
}

impl Prober {
    pub fn new(config: &ProbeConfig) -> std::result::Result<Self, reqwest::Error> {
        Ok(Self {
            fetcher: Fetcher::new(config)?,
            strict_json: config.strict_json,
        })
    }

    /// Probe `request.target` and return the exposition of its fields.
    ///
    /// The first failing field aborts the probe; no partial output is produced.
    pub async fn probe(&self, request: &ProbeRequest) -> Result<String> {
        let started = Instant::now();

        let document = self.fetcher.fetch(&request.target).await?;
        let json = self.decode(&document.body)?;

        let mut collector = ProbeCollector::new(document.hostname);
        for field in &request.fields {
            let extracted =
                jsonpath::lookup(&json, &field.path).map_err(|source| ProbeError::PathNotFound {
                    path: field.path.clone(),
                    source,
                })?;

            let value = coerce_value(&extracted).map_err(|source| ProbeError::NotNumeric {
                path: field.path.clone(),
                source,
            })?;

            debug!(
                metric = %field.name,
                path = %field.path,
                value,
                "Found value"
            );
            collector.add_field(&field.name, value)?;
        }

        Ok(collector.render(started.elapsed())?)
    }

    fn decode(&self, body: &[u8]) -> Result<Value> {
        match serde_json::from_slice(body) {
            Ok(json) => Ok(json),
            Err(e) if self.strict_json => Err(ProbeError::InvalidBody(e)),
            Err(e) => {
                warn!(error = %e, "Body is not valid JSON, treating document as null");
                Ok(Value::Null)
            }
        }
    }
}
