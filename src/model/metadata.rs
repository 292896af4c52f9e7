use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::parsers::namespace;

/// A parsed XML element. Attribute names keep their qualified form
/// (`xml:lang`), element names are local after normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Self and every descendant with the given name, in document order.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        collect_named(self, name, &mut found);
        found
    }
}

fn collect_named<'a>(el: &'a Element, name: &str, out: &mut Vec<&'a Element>) {
    if el.name == name {
        out.push(el);
    }
    for child in &el.children {
        collect_named(child, name, out);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ServiceType {
    AssertionConsumerService,
    SingleLogoutService,
}

impl ServiceType {
    pub fn element_name(self) -> &'static str {
        match self {
            ServiceType::AssertionConsumerService => "AssertionConsumerService",
            ServiceType::SingleLogoutService => "SingleLogoutService",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub service_type: ServiceType,
    pub location: String,
}

impl Endpoint {
    /// Host part of the location, the unit the TLS assessment works on.
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.location)
            .ok()?
            .host_str()
            .filter(|h| !h.is_empty())
            .map(str::to_owned)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpSsoDescriptor {
    pub protocol_support: Option<String>,
    pub want_assertions_signed: bool,
    /// Attribute value as written, for failure context.
    pub want_assertions_signed_raw: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum OrganizationField {
    Name,
    #[serde(rename = "URL")]
    Url,
    DisplayName,
}

impl OrganizationField {
    pub const ALL: [OrganizationField; 3] = [
        OrganizationField::Name,
        OrganizationField::Url,
        OrganizationField::DisplayName,
    ];

    pub fn element_name(self) -> &'static str {
        match self {
            OrganizationField::Name => "OrganizationName",
            OrganizationField::Url => "OrganizationURL",
            OrganizationField::DisplayName => "OrganizationDisplayName",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedAttribute {
    pub name: Option<String>,
    pub name_format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeConsumingService {
    pub index: Option<String>,
    pub requested_attributes: Vec<RequestedAttribute>,
}

/// Parsed, namespace-normalized SAML metadata.
///
/// The only way to build one normalizes the tree first, so every accessor
/// can use unprefixed element names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDocument {
    root: Element,
}

impl MetadataDocument {
    pub fn new(mut root: Element) -> Self {
        namespace::strip(&mut root);
        Self { root }
    }

    #[cfg(test)]
    pub fn root(&self) -> &Element {
        &self.root
    }

    fn entity_descriptors(&self) -> Vec<&Element> {
        self.root.descendants_named("EntityDescriptor")
    }

    fn sp_sso_descriptors(&self) -> Vec<&Element> {
        self.entity_descriptors()
            .into_iter()
            .flat_map(|ed| ed.children_named("SPSSODescriptor"))
            .collect()
    }

    pub fn entity_id(&self) -> Result<&str> {
        let descriptors = self.entity_descriptors();
        match descriptors[..] {
            [ed] => ed
                .attr("entityID")
                .ok_or_else(|| Error::Structural("EntityDescriptor has no entityID attribute".into())),
            [] => Err(Error::Structural("no EntityDescriptor element found".into())),
            _ => Err(Error::Structural(format!(
                "expected exactly one EntityDescriptor, found {}",
                descriptors.len()
            ))),
        }
    }

    pub fn sp_sso_descriptor(&self) -> Result<SpSsoDescriptor> {
        let spsso = self
            .sp_sso_descriptors()
            .into_iter()
            .next()
            .ok_or_else(|| Error::Structural("no SPSSODescriptor element found".into()))?;
        let raw = spsso.attr("WantAssertionsSigned").map(str::to_owned);
        Ok(SpSsoDescriptor {
            protocol_support: spsso.attr("protocolSupportEnumeration").map(str::to_owned),
            want_assertions_signed: raw
                .as_deref()
                .is_some_and(|v| v.eq_ignore_ascii_case("true")),
            want_assertions_signed_raw: raw,
        })
    }

    /// Number of `Organization{Name,URL,DisplayName}` elements localized in `lang`.
    pub fn organization_localizations(&self, lang: &str) -> Result<BTreeMap<OrganizationField, usize>> {
        let org = self
            .entity_descriptors()
            .into_iter()
            .flat_map(|ed| ed.children_named("Organization"))
            .next()
            .ok_or_else(|| Error::Structural("no Organization element found".into()))?;

        Ok(OrganizationField::ALL
            .iter()
            .map(|&field| {
                let count = org
                    .children_named(field.element_name())
                    .filter(|e| e.attr("xml:lang") == Some(lang))
                    .count();
                (field, count)
            })
            .collect())
    }

    pub fn endpoints(&self, service_type: ServiceType) -> Vec<Endpoint> {
        self.sp_sso_descriptors()
            .into_iter()
            .flat_map(|spsso| spsso.children_named(service_type.element_name()))
            .map(|e| Endpoint {
                service_type,
                location: e.attr("Location").unwrap_or_default().to_string(),
            })
            .collect()
    }

    pub fn attribute_consuming_services(&self) -> Vec<AttributeConsumingService> {
        self.sp_sso_descriptors()
            .into_iter()
            .flat_map(|spsso| spsso.children_named("AttributeConsumingService"))
            .map(|acs| AttributeConsumingService {
                index: acs.attr("index").map(str::to_owned),
                requested_attributes: acs
                    .children_named("RequestedAttribute")
                    .map(|ra| RequestedAttribute {
                        name: ra.attr("Name").map(str::to_owned),
                        name_format: ra.attr("NameFormat").map(str::to_owned),
                    })
                    .collect(),
            })
            .collect()
    }
}
