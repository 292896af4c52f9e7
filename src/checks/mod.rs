pub mod attributes;
pub mod descriptor;
pub mod organization;
pub mod tls;

use tracing::{info, warn};

use crate::assertions::{Assert, Collector};
use crate::error::{Error, Result};
use crate::model::metadata::MetadataDocument;
use crate::oracle::{ScanMode, TlsGradeOracle};
use crate::report::{ReportAggregator, TestPath};
use crate::result::CheckResult;

/// Report path prefix shared by every check of the battery.
pub const REPORT_PREFIX: &str = "sp.metadata_extra";

#[derive(Debug, Clone)]
pub struct CheckSettings {
    /// Language code the Organization block must be localized in.
    pub lang: String,
    pub skip_tls: bool,
    pub scan_mode: ScanMode,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            lang: "it".to_string(),
            skip_tls: false,
            scan_mode: ScanMode::Cached,
        }
    }
}

pub struct CheckContext<'a> {
    pub doc: &'a MetadataDocument,
    pub oracle: Option<&'a TlsGradeOracle>,
    pub settings: &'a CheckSettings,
}

pub type CheckFn = fn(&CheckContext<'_>, &mut dyn Assert) -> Result<()>;

pub struct Check {
    pub id: &'static str,
    pub description: &'static str,
    pub run: CheckFn,
    pub skip_when: Option<fn(&CheckSettings) -> bool>,
}

/// The battery, in execution order.
pub const BATTERY: [Check; 6] = [
    Check {
        id: "entity_id_validity",
        description: "EntityDescriptor entityID must be a valid HTTPS URL",
        run: descriptor::entity_id_validity,
        skip_when: None,
    },
    Check {
        id: "sso_descriptor_protocol",
        description: "SPSSODescriptor must declare SAML 2.0 protocol support",
        run: descriptor::sso_descriptor_protocol,
        skip_when: None,
    },
    Check {
        id: "sso_descriptor_signing",
        description: "SPSSODescriptor must require signed assertions",
        run: descriptor::sso_descriptor_signing,
        skip_when: None,
    },
    Check {
        id: "organization_localization",
        description: "Organization must be localized in the configured language",
        run: organization::organization_localization,
        skip_when: None,
    },
    Check {
        id: "tls_grade",
        description: "AssertionConsumerService and SingleLogoutService endpoints must have a strong TLS grade",
        run: tls::tls_grade,
        skip_when: Some(tls_skipped),
    },
    Check {
        id: "attribute_name_format",
        description: "RequestedAttribute NameFormat values must be allowed formats",
        run: attributes::attribute_name_format,
        skip_when: None,
    },
];

fn tls_skipped(settings: &CheckSettings) -> bool {
    settings.skip_tls
}

/// Run every check in order, recording each one's failures into `report`.
///
/// Structural errors and timeouts become failures of the running check;
/// any other error aborts the battery.
pub fn run_all(ctx: &CheckContext<'_>, report: &mut ReportAggregator) -> Result<Vec<CheckResult>> {
    let mut results = Vec::with_capacity(BATTERY.len());

    for check in &BATTERY {
        if check.skip_when.is_some_and(|skip| skip(ctx.settings)) {
            info!(check = check.id, "skipped by configuration");
            results.push(CheckResult::skipped(check.id, check.description));
            continue;
        }

        info!(check = check.id, "running check");
        let mut collector = Collector::new();
        match (check.run)(ctx, &mut collector) {
            Ok(()) => {}
            Err(e) if e.is_recoverable() => {
                warn!(check = check.id, error = %e, "check could not complete");
                collector.fail(&e.to_string(), None);
            }
            Err(e) => return Err(e),
        }

        let failures = collector.into_failures();
        let path = TestPath::parse(&format!("{REPORT_PREFIX}.{}", check.id))?;
        report.record(&path, check.description, failures.clone())?;
        info!(check = check.id, failures = failures.len(), "check finished");
        results.push(CheckResult::finished(check.id, check.description, failures));
    }

    Ok(results)
}

/// Fetch the oracle or report that the TLS check was run without one.
pub(crate) fn require_oracle<'a>(ctx: &CheckContext<'a>) -> Result<&'a TlsGradeOracle> {
    ctx.oracle
        .ok_or_else(|| Error::Configuration("TLS grade check enabled without an assessment client".into()))
}
