use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesDecl, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use tracing::debug;

use crate::document::{MetadataDocument, Node};
use crate::error::{FillError, Result};
use crate::model::ElementName;

/// Reads a metadata XML file into a [`MetadataDocument`].
pub fn parse_metadata_file(path: &Path) -> Result<MetadataDocument> {
    let file = File::open(path)?;
    parse_metadata_xml(BufReader::new(file))
}

/// Reads metadata XML into an event tree with namespace-resolved names.
///
/// Whitespace, comments and the declaration are kept so the written
/// document differs from the template only in the filled leaves.
pub fn parse_metadata_xml<R: BufRead>(reader: R) -> Result<MetadataDocument> {
    let mut reader = NsReader::from_reader(reader);
    let mut buf = Vec::new();
    let mut nodes = Vec::new();

    loop {
        let (ns, event) = reader.read_resolved_event_into(&mut buf)?;
        let name = match &event {
            Event::Start(e) | Event::Empty(e) => Some(element_name(ns, e.local_name().as_ref())?),
            Event::End(e) => Some(element_name(ns, e.local_name().as_ref())?),
            Event::Decl(d) => {
                check_encoding(d)?;
                None
            }
            Event::Eof => break,
            _ => None,
        };
        nodes.push(Node {
            event: event.into_owned(),
            name,
        });
        buf.clear();
    }

    debug!("Parsed metadata document: {} events", nodes.len());
    Ok(MetadataDocument::from_nodes(nodes))
}

/// Events are kept as read, so the template must already be UTF-8.
fn check_encoding(decl: &BytesDecl<'_>) -> Result<()> {
    let Some(encoding) = decl.encoding() else {
        return Ok(());
    };
    let encoding = encoding.map_err(quick_xml::Error::from)?;
    if encoding.eq_ignore_ascii_case(b"UTF-8") || encoding.eq_ignore_ascii_case(b"UTF8") {
        return Ok(());
    }
    Err(FillError::UnsupportedEncoding {
        encoding: String::from_utf8_lossy(&encoding).into_owned(),
    })
}

fn element_name(ns: ResolveResult<'_>, local: &[u8]) -> Result<ElementName> {
    let local = String::from_utf8_lossy(local).into_owned();
    let namespace = match ns {
        ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8_lossy(uri).into_owned()),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(prefix) => {
            return Err(FillError::TemplateStructure {
                field: format!(
                    "a namespace binding for prefix '{}' (element {})",
                    String::from_utf8_lossy(&prefix),
                    local
                ),
            })
        }
    };
    Ok(ElementName { namespace, local })
}
