use crate::model::metadata::Element;

/// Strip namespace prefixes from element names and drop `xmlns`
/// declarations, recursively. Attribute names keep their prefix so that
/// `xml:lang` stays addressable. Applying it twice is a no-op.
pub fn strip(el: &mut Element) {
    el.name = local_name(&el.name).to_string();
    el.attributes.retain(|(k, _)| !is_namespace_declaration(k));
    for child in &mut el.children {
        strip(child);
    }
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn is_namespace_declaration(key: &str) -> bool {
    key == "xmlns" || key.starts_with("xmlns:")
}
