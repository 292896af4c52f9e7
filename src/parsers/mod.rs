pub mod metadata_xml;
pub mod namespace;
