//! Outbound HTTP fetch of probe targets.

use bytes::Bytes;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};

/// A downloaded target document.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// `host[:port]` of the final request URL, after redirects.
    pub hostname: String,
    /// Raw response body.
    pub body: Bytes,
}

/// HTTP client used for every probe.
///
/// The underlying connection pool is shared; nothing else about a probe is.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Build a fetcher from the probe configuration.
    pub fn new(config: &ProbeConfig) -> std::result::Result<Self, reqwest::Error> {
        if config.insecure_skip_verify {
            warn!("TLS certificate verification is disabled for probe targets");
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }

    /// Issue a single GET against `target` and read the whole body.
    ///
    /// The response status is not inspected: any response with a body is
    /// handed on for extraction.
    pub async fn fetch(&self, target: &str) -> Result<FetchedDocument> {
        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(ProbeError::FetchFailed)?;

        let hostname = hostname(target, response.url());
        debug!(
            url = %target,
            status = %response.status(),
            hostname = %hostname,
            "Target responded"
        );

        let body = response.bytes().await.map_err(ProbeError::BodyReadFailed)?;

        Ok(FetchedDocument { hostname, body })
    }
}

/// `host[:port]` of the final URL.
///
/// The port is kept when it is not the scheme's default, or when the
/// requested URL spelled it out and the final URL is on the same origin.
fn hostname(target: &str, url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    let spelled = has_explicit_port(target)
        && Url::parse(target).is_ok_and(|requested| requested.origin() == url.origin());

    let port = match url.port() {
        Some(port) => Some(port),
        None if spelled => url.port_or_known_default(),
        None => None,
    };

    match port {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Whether the authority of `target` ends in `:<digits>`.
fn has_explicit_port(target: &str) -> bool {
    let Some((_, rest)) = target.split_once("://") else {
        return false;
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();

    match host_port.rsplit_once(':') {
        Some((_, port)) => !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}
