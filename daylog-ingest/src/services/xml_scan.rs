//! Well-formedness scan for XML documents
//!
//! Walks the whole document once with a pull reader. Anything that is not
//! well-formed is rejected here, before any schema is attempted, and the
//! prolog and root element details are kept for diagnostics and
//! namespace gating.

use quick_xml::events::Event;
use quick_xml::Reader;

/// What a scan salvages from a well-formed document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    /// `<?xml version="…"?>`
    pub xml_version: Option<String>,
    /// `<?xml encoding="…"?>`
    pub encoding: Option<String>,
    /// Local name of the root element
    pub root: String,
    /// Root element attributes in document order
    pub root_attributes: Vec<(String, String)>,
}

impl DocumentInfo {
    pub fn root_attribute(&self, name: &str) -> Option<&str> {
        self.root_attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Scan a document, returning a message describing the first defect
pub fn scan_document(xml: &str) -> Result<DocumentInfo, String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut info = DocumentInfo::default();
    let mut root_seen = false;
    let mut depth: usize = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Decl(decl)) => {
                info.xml_version = decl
                    .version()
                    .ok()
                    .map(|v| String::from_utf8_lossy(&v).into_owned());
                info.encoding = decl
                    .encoding()
                    .and_then(|e| e.ok())
                    .map(|e| String::from_utf8_lossy(&e).into_owned());
            }
            Ok(Event::Start(element)) => {
                if depth == 0 {
                    if root_seen {
                        return Err("multiple root elements".to_string());
                    }
                    root_seen = true;
                    info.root = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
                    info.root_attributes = read_attributes(&element)?;
                }
                depth += 1;
            }
            Ok(Event::Empty(element)) => {
                if depth == 0 {
                    if root_seen {
                        return Err("multiple root elements".to_string());
                    }
                    root_seen = true;
                    info.root = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
                    info.root_attributes = read_attributes(&element)?;
                }
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "{} at byte {}",
                    e,
                    reader.buffer_position()
                ))
            }
        }
    }

    if depth != 0 {
        return Err("unexpected end of document (unclosed element)".to_string());
    }
    if !root_seen {
        return Err("document has no root element".to_string());
    }

    Ok(info)
}

fn read_attributes(
    element: &quick_xml::events::BytesStart<'_>,
) -> Result<Vec<(String, String)>, String> {
    let mut attributes = Vec::new();
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| format!("bad attribute: {}", e))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| format!("bad attribute value: {}", e))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(attributes)
}
