use super::CheckContext;
use crate::assertions::Assert;
use crate::error::Result;

pub const ALLOWED_NAME_FORMATS: [&str; 3] = [
    "urn:oasis:names:tc:SAML:2.0:attrname-format:basic",
    "urn:oasis:names:tc:SAML:2.0:attrname-format:uri",
    "urn:oasis:names:tc:SAML:2.0:attrname-format:unspecified",
];

/// Attributes without a NameFormat are exempt.
pub fn attribute_name_format(ctx: &CheckContext<'_>, a: &mut dyn Assert) -> Result<()> {
    for service in ctx.doc.attribute_consuming_services() {
        for attr in &service.requested_attributes {
            if let Some(format) = attr.name_format.as_deref() {
                let message = match attr.name.as_deref() {
                    Some(name) => format!("NameFormat attribute of {name} must be valid"),
                    None => "NameFormat attribute must be valid".to_string(),
                };
                a.assert_in(format, &ALLOWED_NAME_FORMATS, &message);
            }
        }
    }
    Ok(())
}
