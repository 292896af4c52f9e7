use serde_json::{json, Value};

use crate::model::metadata::Endpoint;
use crate::oracle::{ScanResult, ScanStatus};
use crate::result::AssertionFailure;

/// Assertion helpers available to every check. Each `assert_*` records a
/// failure with expected-vs-actual context and returns whether it held;
/// none of them abort the check.
pub trait Assert {
    fn fail(&mut self, message: &str, context: Option<Value>);

    fn assert_equal(&mut self, actual: Value, expected: Value, message: &str) -> bool {
        if actual == expected {
            return true;
        }
        self.fail(message, Some(json!({ "expected": expected, "actual": actual })));
        false
    }

    fn assert_valid_https_url(&mut self, value: Option<&str>, message: &str) -> bool {
        let problem = match value {
            None => Some("missing".to_string()),
            Some(v) => match url::Url::parse(v) {
                Err(e) => Some(e.to_string()),
                Ok(u) if u.scheme() != "https" => Some(format!("scheme is {}", u.scheme())),
                Ok(u) if u.host_str().map_or(true, str::is_empty) => Some("no host".to_string()),
                Ok(_) => None,
            },
        };
        match problem {
            None => true,
            Some(reason) => {
                self.fail(message, Some(json!({ "value": value, "reason": reason })));
                false
            }
        }
    }

    fn assert_in(&mut self, value: &str, allowed: &[&str], message: &str) -> bool {
        if allowed.contains(&value) {
            return true;
        }
        self.fail(message, Some(json!({ "value": value, "allowed": allowed })));
        false
    }

    /// The scan must be `READY` and every scanned server graded in `accepted`.
    fn assert_tls_grade(
        &mut self,
        endpoint: &Endpoint,
        scan: &ScanResult,
        accepted: &[&str],
        message: &str,
    ) -> bool {
        let grades = scan.grades();
        let ok = scan.status == ScanStatus::Ready
            && !grades.is_empty()
            && grades
                .iter()
                .all(|g| g.is_some_and(|g| accepted.contains(&g)));
        if ok {
            return true;
        }
        self.fail(
            message,
            Some(json!({
                "location": endpoint.location,
                "service": endpoint.service_type,
                "status": scan.status,
                "status_message": scan.status_message,
                "endpoints": scan.endpoints,
                "accepted": accepted,
                "tested_at": scan.test_time.map(|t| t.to_rfc3339()),
            })),
        );
        false
    }
}

/// Per-check failure list.
#[derive(Debug, Default)]
pub struct Collector {
    failures: Vec<AssertionFailure>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_failures(self) -> Vec<AssertionFailure> {
        self.failures
    }
}

impl Assert for Collector {
    fn fail(&mut self, message: &str, context: Option<Value>) {
        self.failures.push(AssertionFailure::new(message, context));
    }
}
