use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanStatus {
    InProgress,
    Ready,
    Error,
}

impl ScanStatus {
    fn from_api(status: &str) -> Self {
        match status {
            "READY" => ScanStatus::Ready,
            "ERROR" => ScanStatus::Error,
            // DNS, IN_PROGRESS
            _ => ScanStatus::InProgress,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ScanStatus::Ready | ScanStatus::Error)
    }
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanStatus::InProgress => write!(f, "IN_PROGRESS"),
            ScanStatus::Ready => write!(f, "READY"),
            ScanStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Grade of one scanned server (a host can resolve to several).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointGrade {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub status: ScanStatus,
    pub status_message: Option<String>,
    pub test_time: Option<DateTime<Utc>>,
    pub endpoints: Vec<EndpointGrade>,
    /// The service replied busy; no assessment was started or reported.
    pub busy: bool,
    pub raw: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiReply {
    status: Option<String>,
    status_message: Option<String>,
    test_time: Option<i64>,
    #[serde(default)]
    endpoints: Vec<ApiEndpoint>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEndpoint {
    ip_address: Option<String>,
    grade: Option<String>,
    status_message: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    field: Option<String>,
    message: Option<String>,
}

impl ScanResult {
    /// Interpret an `analyze` reply body.
    pub fn from_json(raw: Value) -> Result<Self> {
        let reply: ApiReply = serde_json::from_value(raw.clone())
            .map_err(|e| Error::Transport(format!("malformed assessment reply: {e}")))?;

        let Some(status) = reply.status else {
            let messages: Vec<String> = reply
                .errors
                .iter()
                .map(|e| match (&e.field, &e.message) {
                    (Some(field), Some(message)) => format!("{field}: {message}"),
                    (None, Some(message)) => message.clone(),
                    (Some(field), None) => field.clone(),
                    (None, None) => "unknown error".to_string(),
                })
                .collect();
            return Err(Error::Transport(if messages.is_empty() {
                "assessment reply has no status".to_string()
            } else {
                messages.join("; ")
            }));
        };

        Ok(Self {
            status: ScanStatus::from_api(&status),
            status_message: reply.status_message,
            test_time: reply.test_time.and_then(DateTime::from_timestamp_millis),
            endpoints: reply
                .endpoints
                .into_iter()
                .map(|e| EndpointGrade {
                    ip_address: e.ip_address,
                    grade: e.grade,
                    status_message: e.status_message,
                })
                .collect(),
            busy: false,
            raw,
        })
    }

    /// Placeholder for an HTTP 429/503/529 reply: not terminal, so the
    /// poller waits and asks again.
    pub fn busy(http_status: u16) -> Self {
        Self {
            status: ScanStatus::InProgress,
            status_message: Some(format!("service busy (HTTP {http_status})")),
            test_time: None,
            endpoints: Vec::new(),
            busy: true,
            raw: json!({ "httpStatus": http_status }),
        }
    }

    pub fn grades(&self) -> Vec<Option<&str>> {
        self.endpoints.iter().map(|e| e.grade.as_deref()).collect()
    }
}

/// Query flavours of the `analyze` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanQuery {
    /// Accept a previously completed assessment.
    Cached,
    /// Start a brand-new assessment.
    StartNew,
    /// Check on an assessment started with `StartNew`.
    FollowUp,
}

impl ScanQuery {
    pub fn params(self, host: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![("host", host.to_string()), ("publish", "off".to_string())];
        match self {
            ScanQuery::Cached => {
                params.push(("startNew", "off".to_string()));
                params.push(("fromCache", "on".to_string()));
                params.push(("all", "done".to_string()));
            }
            ScanQuery::StartNew => {
                params.push(("startNew", "on".to_string()));
                params.push(("all", "done".to_string()));
                params.push(("ignoreMismatch", "on".to_string()));
            }
            ScanQuery::FollowUp => {
                params.push(("all", "done".to_string()));
                params.push(("ignoreMismatch", "on".to_string()));
            }
        }
        params
    }
}
