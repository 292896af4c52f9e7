use std::collections::HashMap;

use serde_json::json;
use tracing::warn;

use super::{require_oracle, CheckContext};
use crate::assertions::Assert;
use crate::error::{Error, Result};
use crate::model::metadata::{Endpoint, ServiceType};
use crate::oracle::{ScanResult, TlsGradeOracle};

pub const ACCEPTED_GRADES: [&str; 3] = ["A+", "A", "A-"];

/// What polling a host ended with; a timeout keeps its failure reason.
type Assessment = std::result::Result<ScanResult, String>;

/// Grade every ACS endpoint, then every SLO endpoint. A bad endpoint only
/// fails itself; transport errors and cancellation abort the check.
pub fn tls_grade(ctx: &CheckContext<'_>, a: &mut dyn Assert) -> Result<()> {
    let oracle = require_oracle(ctx)?;
    let mut assessed: HashMap<String, Assessment> = HashMap::new();

    for service in [ServiceType::AssertionConsumerService, ServiceType::SingleLogoutService] {
        for endpoint in ctx.doc.endpoints(service) {
            check_endpoint(ctx, oracle, &endpoint, &mut assessed, a)?;
        }
    }
    Ok(())
}

fn check_endpoint(
    ctx: &CheckContext<'_>,
    oracle: &TlsGradeOracle,
    endpoint: &Endpoint,
    assessed: &mut HashMap<String, Assessment>,
    a: &mut dyn Assert,
) -> Result<()> {
    let message = format!(
        "{} must be reachable and have strong TLS configuration",
        endpoint.location
    );

    let Some(host) = endpoint.host() else {
        a.fail(
            &message,
            Some(json!({
                "location": endpoint.location,
                "service": endpoint.service_type,
                "reason": "location is not a URL with a host",
            })),
        );
        return Ok(());
    };

    let assessment = match assessed.get(&host) {
        Some(assessment) => assessment.clone(),
        None => {
            let assessment = match oracle.poll_until_terminal(&host, ctx.settings.scan_mode) {
                Ok(scan) => Ok(scan),
                Err(e @ Error::Timeout { .. }) => {
                    warn!(host = %host, error = %e, "giving up on host");
                    Err(e.to_string())
                }
                Err(e) => return Err(e),
            };
            assessed.insert(host, assessment.clone());
            assessment
        }
    };

    match assessment {
        Ok(scan) => {
            a.assert_tls_grade(endpoint, &scan, &ACCEPTED_GRADES, &message);
        }
        Err(reason) => a.fail(
            &message,
            Some(json!({
                "location": endpoint.location,
                "service": endpoint.service_type,
                "reason": reason,
            })),
        ),
    }
    Ok(())
}
