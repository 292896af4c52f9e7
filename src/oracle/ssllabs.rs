use std::time::Duration;

use tracing::warn;

use super::{ScanQuery, ScanResult, ScanTransport};
use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.ssllabs.com/api/v2/";

/// Replies meaning "too many requests / overloaded, come back later".
const BUSY_STATUSES: [u16; 3] = [429, 503, 529];

/// Blocking client for the SSL Labs assessment API. One agent is reused
/// for every request of a run.
pub struct SslLabsClient {
    agent: ureq::Agent,
    analyze_url: String,
}

impl SslLabsClient {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let base = if api_url.ends_with('/') {
            api_url.to_string()
        } else {
            format!("{api_url}/")
        };
        let analyze_url = url::Url::parse(&base)
            .and_then(|u| u.join("analyze"))
            .map_err(|e| Error::Configuration(format!("invalid assessment API URL '{api_url}': {e}")))?
            .to_string();

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Ok(Self { agent, analyze_url })
    }

    pub fn analyze_url(&self) -> &str {
        &self.analyze_url
    }
}

impl ScanTransport for SslLabsClient {
    fn analyze(&self, host: &str, query: ScanQuery) -> Result<ScanResult> {
        let mut request = self.agent.get(&self.analyze_url);
        for (key, value) in query.params(host) {
            request = request.query(key, value);
        }

        let response = request
            .call()
            .map_err(|e| Error::Transport(format!("{}: {}", self.analyze_url, e)))?;

        let status = response.status().as_u16();
        if BUSY_STATUSES.contains(&status) {
            warn!(host, http_status = status, "assessment service busy");
            return Ok(ScanResult::busy(status));
        }

        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| Error::Transport(format!("failed to read reply body: {e}")))?;
        let raw: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| Error::Transport(format!("reply is not JSON (HTTP {status}): {e}")))?;
        ScanResult::from_json(raw)
    }
}
