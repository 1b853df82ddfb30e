//! Error taxonomy of the probe pipeline.

use axum::http::StatusCode;
use thiserror::Error;

use crate::jsonpath::PathError;
use crate::mapping::CoerceError;

/// Result type alias using [`ProbeError`].
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Failure to add a metric to a per-probe registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("invalid metric name {0:?}")]
    InvalidName(String),

    #[error("duplicate metric name {0:?}")]
    Duplicate(String),
}

/// Terminal failure of a single probe.
///
/// The `Display` text of each variant is the body returned to the caller.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Target parameter is missing")]
    MissingTarget,

    #[error("No JsonPath to lookup")]
    NoFieldsSpecified,

    #[error("{}", error_chain(.0))]
    FetchFailed(#[source] reqwest::Error),

    #[error("{}", error_chain(.0))]
    BodyReadFailed(#[source] reqwest::Error),

    #[error("Response body is not valid JSON: {0}")]
    InvalidBody(#[source] serde_json::Error),

    #[error("Jsonpath not found")]
    PathNotFound {
        path: String,
        #[source]
        source: PathError,
    },

    #[error("Values could not be parsed to Float64")]
    NotNumeric {
        path: String,
        #[source]
        source: CoerceError,
    },

    #[error("Metric registration failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Failed to encode metrics")]
    Encode(#[from] std::fmt::Error),
}

impl ProbeError {
    /// HTTP status reported for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProbeError::MissingTarget
            | ProbeError::NoFieldsSpecified
            | ProbeError::Registration(_) => StatusCode::BAD_REQUEST,
            ProbeError::FetchFailed(_) => StatusCode::GATEWAY_TIMEOUT,
            ProbeError::InvalidBody(_) => StatusCode::BAD_GATEWAY,
            ProbeError::PathNotFound { .. } => StatusCode::NOT_FOUND,
            ProbeError::BodyReadFailed(_)
            | ProbeError::NotNumeric { .. }
            | ProbeError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Every value [`ProbeError::kind`] can return.
    pub const KINDS: [&str; 9] = [
        "missing_target",
        "no_fields",
        "fetch_failed",
        "body_read_failed",
        "invalid_body",
        "path_not_found",
        "not_numeric",
        "registration_failed",
        "encode_failed",
    ];

    /// Short identifier used as a label value in the exporter's own metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::MissingTarget => "missing_target",
            ProbeError::NoFieldsSpecified => "no_fields",
            ProbeError::FetchFailed(_) => "fetch_failed",
            ProbeError::BodyReadFailed(_) => "body_read_failed",
            ProbeError::InvalidBody(_) => "invalid_body",
            ProbeError::PathNotFound { .. } => "path_not_found",
            ProbeError::NotNumeric { .. } => "not_numeric",
            ProbeError::Registration(_) => "registration_failed",
            ProbeError::Encode(_) => "encode_failed",
        }
    }

    /// Whether the failure lies with the probed target rather than the caller.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ProbeError::FetchFailed(_) | ProbeError::BodyReadFailed(_) | ProbeError::InvalidBody(_)
        )
    }
}

/// Render an error followed by its sources, `outer: inner: root`.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
