use std::borrow::Cow;

use quick_xml::events::{BytesText, Event};
use tracing::debug;

use crate::error::{FillError, Result};
use crate::model::{ElementName, LeafPath, Scope, GCO_NAMESPACE, GMD_NAMESPACE};

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) event: Event<'static>,
    /// Set for start, empty and end events.
    pub(crate) name: Option<ElementName>,
}

/// Location of a leaf element within the event list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leaf {
    start: usize,
    /// Index of the matching end event; equal to `start` for `<x/>`.
    end: usize,
}

/// An ISO 19139 document held as an ordered list of XML events.
#[derive(Debug, Clone)]
pub struct MetadataDocument {
    nodes: Vec<Node>,
}

impl MetadataDocument {
    pub(crate) fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub(crate) fn events(&self) -> impl Iterator<Item = &Event<'static>> {
        self.nodes.iter().map(|n| &n.event)
    }

    /// Names of start and empty elements in document order.
    pub fn element_names(&self) -> impl Iterator<Item = &ElementName> {
        self.nodes.iter().filter_map(|n| match n.event {
            Event::Start(_) | Event::Empty(_) => n.name.as_ref(),
            _ => None,
        })
    }

    /// Finds the `gco` value element of `path`.
    ///
    /// The first `gmd` property element satisfying the scope is taken, and
    /// the value must be one of its direct children. A later property element
    /// is never tried.
    pub fn locate(&self, path: &LeafPath) -> Result<Leaf> {
        let missing = || FillError::TemplateStructure {
            field: path.to_string(),
        };

        let property = self.find_property(path).ok_or_else(missing)?;
        let leaf = self.find_child(property, path.value).ok_or_else(missing)?;
        debug!("Located {} at event {}", path, leaf.start);
        Ok(leaf)
    }

    fn find_property(&self, path: &LeafPath) -> Option<Leaf> {
        let mut depth = 0usize;
        for (i, node) in self.nodes.iter().enumerate() {
            let is_property = |depth: usize| {
                let matches_name = node
                    .name
                    .as_ref()
                    .is_some_and(|n| n.is(GMD_NAMESPACE, path.property));
                let matches_scope = match path.scope {
                    Scope::RootChild => depth == 1,
                    Scope::Descendant => true,
                };
                matches_name && matches_scope
            };
            match node.event {
                Event::Start(_) => {
                    if is_property(depth) {
                        return Some(Leaf {
                            start: i,
                            end: self.matching_end(i),
                        });
                    }
                    depth += 1;
                }
                Event::Empty(_) => {
                    if is_property(depth) {
                        return Some(Leaf { start: i, end: i });
                    }
                }
                Event::End(_) => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        None
    }

    fn find_child(&self, parent: Leaf, local: &str) -> Option<Leaf> {
        let mut depth = 0usize;
        let mut i = parent.start + 1;
        while i < parent.end {
            let node = &self.nodes[i];
            let is_child = depth == 0
                && node
                    .name
                    .as_ref()
                    .is_some_and(|n| n.is(GCO_NAMESPACE, local));
            match node.event {
                Event::Start(_) if is_child => {
                    return Some(Leaf {
                        start: i,
                        end: self.matching_end(i),
                    })
                }
                Event::Empty(_) if is_child => return Some(Leaf { start: i, end: i }),
                Event::Start(_) => depth += 1,
                Event::End(_) => depth = depth.saturating_sub(1),
                _ => {}
            }
            i += 1;
        }
        None
    }

    fn matching_end(&self, start: usize) -> usize {
        let mut depth = 0usize;
        for (i, node) in self.nodes.iter().enumerate().skip(start) {
            match node.event {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth -= 1;
                    if depth == 0 {
                        return i;
                    }
                }
                _ => {}
            }
        }
        // the parser only yields balanced documents
        self.nodes.len() - 1
    }

    /// Text directly inside the leaf, `None` when empty or whitespace only.
    pub fn text(&self, leaf: Leaf) -> Result<Option<String>> {
        let mut text = String::new();
        let mut depth = 0usize;
        for node in &self.nodes[leaf.start + 1..leaf.end.max(leaf.start + 1)] {
            match &node.event {
                Event::Text(t) if depth == 0 => {
                    let unescaped: Cow<'_, str> = t.unescape().map_err(quick_xml::Error::from)?;
                    text.push_str(&unescaped);
                }
                Event::CData(c) if depth == 0 => text.push_str(&String::from_utf8_lossy(c)),
                Event::Start(_) => depth += 1,
                Event::End(_) => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        let trimmed = text.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_owned()))
    }

    /// Replaces the leaf's content with `text`, expanding `<x/>` into
    /// `<x>text</x>`.
    pub fn set_text(&mut self, leaf: Leaf, text: &str) {
        let text_node = Node {
            event: Event::Text(BytesText::new(text).into_owned()),
            name: None,
        };

        if leaf.start == leaf.end {
            let node = &self.nodes[leaf.start];
            if let Event::Empty(start) = &node.event {
                let start = start.clone();
                let end = start.to_end().into_owned();
                let name = node.name.clone();
                let expanded = [
                    Node {
                        event: Event::Start(start),
                        name: name.clone(),
                    },
                    text_node,
                    Node {
                        event: Event::End(end),
                        name,
                    },
                ];
                self.nodes.splice(leaf.start..=leaf.start, expanded);
            }
        } else {
            self.nodes.splice(leaf.start + 1..leaf.end, [text_node]);
        }
    }

    /// Locates `path` and replaces its text.
    pub fn assign(&mut self, path: &LeafPath, text: &str) -> Result<()> {
        let leaf = self.locate(path)?;
        self.set_text(leaf, text);
        Ok(())
    }

    /// Current text of `path`.
    pub fn read(&self, path: &LeafPath) -> Result<Option<String>> {
        let leaf = self.locate(path)?;
        self.text(leaf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DATE_STAMP, FILE_IDENTIFIER, NORTH_BOUND, TITLE, WEST_BOUND};
    use crate::parser::parse_metadata_xml;

    const TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gmd:MD_Metadata xmlns:gmd="http://www.isotc211.org/2005/gmd" xmlns:gco="http://www.isotc211.org/2005/gco">
  <gmd:fileIdentifier>
    <gco:CharacterString/>
  </gmd:fileIdentifier>
  <gmd:dateStamp>
    <gco:DateTime>2000-01-01T00:00:00</gco:DateTime>
  </gmd:dateStamp>
  <gmd:identificationInfo>
    <gmd:MD_DataIdentification>
      <gmd:citation>
        <gmd:CI_Citation>
          <gmd:title>
            <gco:CharacterString>Template &amp; title</gco:CharacterString>
          </gmd:title>
        </gmd:CI_Citation>
      </gmd:citation>
      <gmd:extent>
        <gmd:EX_Extent>
          <gmd:geographicElement>
            <gmd:EX_GeographicBoundingBox>
              <gmd:westBoundLongitude><gco:Decimal>0</gco:Decimal></gmd:westBoundLongitude>
              <gmd:eastBoundLongitude><gco:Decimal>0</gco:Decimal></gmd:eastBoundLongitude>
              <gmd:southBoundLatitude><gco:Decimal>0</gco:Decimal></gmd:southBoundLatitude>
              <gmd:northBoundLatitude><gco:Decimal>0</gco:Decimal></gmd:northBoundLatitude>
            </gmd:EX_GeographicBoundingBox>
          </gmd:geographicElement>
        </gmd:EX_Extent>
      </gmd:extent>
    </gmd:MD_DataIdentification>
  </gmd:identificationInfo>
</gmd:MD_Metadata>"#;

    fn template() -> MetadataDocument {
        parse_metadata_xml(TEMPLATE.as_bytes()).unwrap()
    }

    #[test]
    fn test_read_existing_and_empty_text() {
        let doc = template();
        assert_eq!(doc.read(&FILE_IDENTIFIER).unwrap(), None);
        assert_eq!(
            doc.read(&DATE_STAMP).unwrap().as_deref(),
            Some("2000-01-01T00:00:00")
        );
        assert_eq!(
            doc.read(&TITLE).unwrap().as_deref(),
            Some("Template & title")
        );
    }

    #[test]
    fn test_assign_expands_empty_element() {
        let mut doc = template();
        doc.assign(&FILE_IDENTIFIER, "abc-123").unwrap();
        assert_eq!(
            doc.read(&FILE_IDENTIFIER).unwrap().as_deref(),
            Some("abc-123")
        );
        // the rest of the document still resolves after the splice
        assert_eq!(
            doc.read(&DATE_STAMP).unwrap().as_deref(),
            Some("2000-01-01T00:00:00")
        );
    }

    #[test]
    fn test_assign_overwrites_and_escapes() {
        let mut doc = template();
        doc.assign(&TITLE, "Rivers <2024> & lakes").unwrap();
        assert_eq!(
            doc.read(&TITLE).unwrap().as_deref(),
            Some("Rivers <2024> & lakes")
        );
    }

    #[test]
    fn test_assign_bounds() {
        let mut doc = template();
        doc.assign(&WEST_BOUND, "150.25").unwrap();
        doc.assign(&NORTH_BOUND, "-30.5").unwrap();
        assert_eq!(doc.read(&WEST_BOUND).unwrap().as_deref(), Some("150.25"));
        assert_eq!(doc.read(&NORTH_BOUND).unwrap().as_deref(), Some("-30.5"));
    }

    #[test]
    fn test_root_scope_ignores_nested_property() {
        let xml = r#"<gmd:MD_Metadata xmlns:gmd="http://www.isotc211.org/2005/gmd" xmlns:gco="http://www.isotc211.org/2005/gco">
  <gmd:contact><gmd:dateStamp><gco:DateTime>1999-01-01T00:00:00</gco:DateTime></gmd:dateStamp></gmd:contact>
  <gmd:dateStamp><gco:DateTime>2000-01-01T00:00:00</gco:DateTime></gmd:dateStamp>
</gmd:MD_Metadata>"#;
        let doc = parse_metadata_xml(xml.as_bytes()).unwrap();
        assert_eq!(
            doc.read(&DATE_STAMP).unwrap().as_deref(),
            Some("2000-01-01T00:00:00")
        );
    }

    #[test]
    fn test_first_title_in_document_order_wins() {
        let xml = r#"<gmd:MD_Metadata xmlns:gmd="http://www.isotc211.org/2005/gmd" xmlns:gco="http://www.isotc211.org/2005/gco">
  <gmd:a><gmd:title><gco:CharacterString>first</gco:CharacterString></gmd:title></gmd:a>
  <gmd:title><gco:CharacterString>second</gco:CharacterString></gmd:title>
</gmd:MD_Metadata>"#;
        let mut doc = parse_metadata_xml(xml.as_bytes()).unwrap();
        doc.assign(&TITLE, "new").unwrap();

        let texts: Vec<_> = doc
            .events()
            .filter_map(|e| match e {
                Event::Text(t) => Some(t.unescape().unwrap().trim().to_owned()),
                _ => None,
            })
            .filter(|t| !t.is_empty())
            .collect();
        assert_eq!(texts, ["new", "second"]);
    }

    #[test]
    fn test_missing_leaf_names_the_path() {
        let xml = r#"<gmd:MD_Metadata xmlns:gmd="http://www.isotc211.org/2005/gmd" xmlns:gco="http://www.isotc211.org/2005/gco">
  <gmd:westBoundLongitude/>
</gmd:MD_Metadata>"#;
        let doc = parse_metadata_xml(xml.as_bytes()).unwrap();
        match doc.locate(&WEST_BOUND).unwrap_err() {
            FillError::TemplateStructure { field } => {
                assert_eq!(field, "gmd:westBoundLongitude/gco:Decimal")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            doc.locate(&FILE_IDENTIFIER),
            Err(FillError::TemplateStructure { .. })
        ));
    }

    #[test]
    fn test_value_in_wrong_namespace_not_matched() {
        let xml = r#"<gmd:MD_Metadata xmlns:gmd="http://www.isotc211.org/2005/gmd" xmlns:x="urn:other">
  <gmd:fileIdentifier><x:CharacterString>nope</x:CharacterString></gmd:fileIdentifier>
</gmd:MD_Metadata>"#;
        let doc = parse_metadata_xml(xml.as_bytes()).unwrap();
        assert!(doc.locate(&FILE_IDENTIFIER).is_err());
    }
}
