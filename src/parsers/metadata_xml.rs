use std::borrow::Cow;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use quick_xml::encoding::detect_encoding;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::metadata::{Element, MetadataDocument};

/// Open, read fully and parse the metadata file at `path`.
///
/// The file handle is released before parsing starts, so it is closed on
/// every path including parse failures.
pub fn load_path(path: Option<&Path>) -> Result<MetadataDocument> {
    let path = path.ok_or_else(|| Error::Configuration("SP metadata location is not set".into()))?;
    let file = File::open(path)
        .map_err(|e| Error::Configuration(format!("cannot open {}: {}", path.display(), e)))?;
    debug!(path = %path.display(), "loading metadata");
    load(file).map_err(|e| match e {
        Error::Configuration(reason) => {
            Error::Configuration(format!("{}: {}", path.display(), reason))
        }
        other => other,
    })
}

/// Read the whole source, drop it, then parse.
pub fn load<R: Read>(source: R) -> Result<MetadataDocument> {
    let bytes = read_all(source)
        .map_err(|e| Error::Configuration(format!("cannot read metadata: {e}")))?;
    debug!(bytes = bytes.len(), "read metadata");
    parse_bytes(&bytes)
}

fn read_all<R: Read>(mut source: R) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    source.read_to_end(&mut bytes)?;
    Ok(bytes)
}

pub fn parse_bytes(bytes: &[u8]) -> Result<MetadataDocument> {
    let xml = decode(bytes)?;
    Ok(MetadataDocument::new(parse_str(&xml)?))
}

/// Decode by byte order mark, then by the XML declaration, else as UTF-8.
/// Bytes that are invalid in the chosen encoding are a parse error.
fn decode(bytes: &[u8]) -> Result<Cow<'_, str>> {
    let (encoding, bom_len) = match detect_encoding(bytes) {
        Some((encoding, bom_len)) if bom_len > 0 || encoding != UTF_8 => (encoding, bom_len),
        _ => (declared_encoding(bytes)?.unwrap_or(UTF_8), 0),
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
        .ok_or_else(|| Error::Parse(format!("metadata is not valid {}", encoding.name())))
}

/// Encoding named in a leading `<?xml ... encoding="..."?>`, if any.
fn declared_encoding(bytes: &[u8]) -> Result<Option<&'static Encoding>> {
    let mut reader = Reader::from_reader(bytes);
    let Ok(Event::Decl(decl)) = reader.read_event() else {
        return Ok(None);
    };
    let Some(Ok(label)) = decl.encoding() else {
        return Ok(None);
    };
    // A UTF-16 label on ASCII-compatible bytes means UTF-8.
    Encoding::for_label(&label)
        .map(|encoding| Some(encoding.output_encoding()))
        .ok_or_else(|| {
            Error::Parse(format!(
                "unsupported encoding '{}'",
                String::from_utf8_lossy(&label)
            ))
        })
}

/// Build the raw element tree, names as written in the document.
pub fn parse_str(xml: &str) -> Result<Element> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Err(e) => {
                return Err(Error::Parse(format!(
                    "XML error at position {}: {}",
                    reader.error_position(),
                    e
                )))
            }
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => stack.push(open_element(&e, reader.decoder())?),
            Ok(Event::Empty(e)) => {
                let el = open_element(&e, reader.decoder())?;
                attach(el, &mut stack, &mut root)?;
            }
            Ok(Event::End(e)) => {
                let el = stack.pop().ok_or_else(|| {
                    Error::Parse(format!(
                        "unexpected closing tag </{}>",
                        String::from_utf8_lossy(e.name().as_ref())
                    ))
                })?;
                attach(el, &mut stack, &mut root)?;
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| Error::Parse(format!("invalid text content: {e}")))?;
                push_text(&mut stack, text)?;
            }
            Ok(Event::CData(c)) => {
                push_text(&mut stack, String::from_utf8_lossy(&c))?;
            }
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::Parse(format!(
            "unexpected end of document: <{}> is not closed",
            open.name
        )));
    }
    root.ok_or_else(|| Error::Parse("document has no root element".into()))
}

fn open_element(e: &BytesStart<'_>, decoder: Decoder) -> Result<Element> {
    let mut el = Element::new(String::from_utf8_lossy(e.name().as_ref()));
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::Parse(format!("malformed attribute on <{}>: {}", el.name, err)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .decode_and_unescape_value(decoder)
            .map_err(|err| Error::Parse(format!("invalid value for attribute {key}: {err}")))?
            .into_owned();
        el.attributes.push((key, value));
    }
    Ok(el)
}

fn attach(el: Element, stack: &mut [Element], root: &mut Option<Element>) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(el);
    } else if root.is_some() {
        return Err(Error::Parse(format!("unexpected element <{}> after the root element", el.name)));
    } else {
        *root = Some(el);
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: Cow<'_, str>) -> Result<()> {
    let trimmed = text.trim();
    match stack.last_mut() {
        Some(current) => current.text.push_str(trimmed),
        None if !trimmed.is_empty() => {
            return Err(Error::Parse("text content outside the root element".into()))
        }
        None => {}
    }
    Ok(())
}
