use serde_json::json;

use super::CheckContext;
use crate::assertions::Assert;
use crate::error::Result;

pub const SAML2_PROTOCOL: &str = "urn:oasis:names:tc:SAML:2.0:protocol";

pub fn entity_id_validity(ctx: &CheckContext<'_>, a: &mut dyn Assert) -> Result<()> {
    let entity_id = ctx.doc.entity_id()?;
    a.assert_valid_https_url(Some(entity_id), "the entityID attribute must be a valid HTTPS url");
    Ok(())
}

pub fn sso_descriptor_protocol(ctx: &CheckContext<'_>, a: &mut dyn Assert) -> Result<()> {
    let spsso = ctx.doc.sp_sso_descriptor()?;
    a.assert_equal(
        json!(spsso.protocol_support),
        json!(SAML2_PROTOCOL),
        &format!("the protocolSupportEnumeration attribute must be {SAML2_PROTOCOL}"),
    );
    Ok(())
}

pub fn sso_descriptor_signing(ctx: &CheckContext<'_>, a: &mut dyn Assert) -> Result<()> {
    let spsso = ctx.doc.sp_sso_descriptor()?;
    if !spsso.want_assertions_signed {
        a.fail(
            "the WantAssertionsSigned attribute must be true",
            Some(json!({ "expected": "true", "actual": spsso.want_assertions_signed_raw })),
        );
    }
    Ok(())
}
