use serde_json::json;

use super::CheckContext;
use crate::assertions::Assert;
use crate::error::Result;

/// Exactly one Name, URL and DisplayName localized in the configured language.
pub fn organization_localization(ctx: &CheckContext<'_>, a: &mut dyn Assert) -> Result<()> {
    let lang = ctx.settings.lang.as_str();
    let counts = ctx.doc.organization_localizations(lang)?;
    for (field, count) in counts {
        a.assert_equal(
            json!(count),
            json!(1),
            &format!(
                "an {} localised {} must be present",
                lang.to_uppercase(),
                field.element_name()
            ),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{doc, run_check};
    use crate::checks::CheckSettings;
    use crate::error::Error;

    fn org(children: &str) -> String {
        format!(
            r#"<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata" entityID="https://sp.example.org">
                <md:Organization>{children}</md:Organization>
            </md:EntityDescriptor>"#
        )
    }

    #[test]
    fn fails_only_on_missing_display_name() {
        let d = doc(&org(
            r#"<md:OrganizationName xml:lang="it">Esempio</md:OrganizationName>
               <md:OrganizationURL xml:lang="it">https://www.example.org</md:OrganizationURL>
               <md:OrganizationDisplayName xml:lang="en">Example</md:OrganizationDisplayName>"#,
        ));
        let failures = run_check(organization_localization, &d, None, &CheckSettings::default()).unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].message, "an IT localised OrganizationDisplayName must be present");
        assert_eq!(failures[0].context, Some(json!({"expected": 1, "actual": 0})));
    }

    #[test]
    fn duplicates_fail_too() {
        let d = doc(&org(
            r#"<md:OrganizationName xml:lang="it">Uno</md:OrganizationName>
               <md:OrganizationName xml:lang="it">Due</md:OrganizationName>
               <md:OrganizationURL xml:lang="it">https://www.example.org</md:OrganizationURL>
               <md:OrganizationDisplayName xml:lang="it">Uno</md:OrganizationDisplayName>"#,
        ));
        let failures = run_check(organization_localization, &d, None, &CheckSettings::default()).unwrap();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message.contains("OrganizationName"));
    }

    #[test]
    fn language_is_configurable() {
        let d = doc(&org(
            r#"<md:OrganizationName xml:lang="en">Example</md:OrganizationName>
               <md:OrganizationURL xml:lang="en">https://www.example.org</md:OrganizationURL>
               <md:OrganizationDisplayName xml:lang="en">Example</md:OrganizationDisplayName>"#,
        ));
        let en = CheckSettings {
            lang: "en".into(),
            ..CheckSettings::default()
        };
        assert!(run_check(organization_localization, &d, None, &en).unwrap().is_empty());
        assert_eq!(
            run_check(organization_localization, &d, None, &CheckSettings::default())
                .unwrap()
                .len(),
            3
        );
    }

    #[test]
    fn missing_organization_is_structural() {
        let d = doc(r#"<EntityDescriptor entityID="https://sp.example.org"/>"#);
        let err = run_check(organization_localization, &d, None, &CheckSettings::default()).unwrap_err();
        assert!(matches!(err, Error::Structural(_)));
    }
}
