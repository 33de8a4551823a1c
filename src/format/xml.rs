//! Owned XML element tree over `quick-xml` events.
//!
//! Text and markup the pipeline never touches is kept as the original events, so
//! serializing an unmodified tree reproduces the input markup.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Result, TsuyakuError};

#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    Text(BytesText<'static>),
    /// Declarations, comments, CDATA, processing instructions
    Other(Event<'static>),
}

#[derive(Debug, Clone)]
pub struct XmlElement {
    pub start: BytesStart<'static>,
    pub children: Vec<XmlNode>,
    /// Written as `<name/>` while it has no children
    pub self_closing: bool,
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        Self {
            start: BytesStart::new(name.to_string()),
            children: Vec::new(),
            self_closing: true,
        }
    }

    pub fn name(&self) -> &[u8] {
        self.start.name().into_inner()
    }

    pub fn is(&self, name: &str) -> bool {
        self.name() == name.as_bytes()
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.start.push_attribute((key, value));
        self
    }

    pub fn push_element(&mut self, element: XmlElement) {
        self.self_closing = false;
        self.children.push(XmlNode::Element(element));
    }

    pub fn push_text(&mut self, text: &str) {
        self.self_closing = false;
        self.children.push(XmlNode::Text(BytesText::new(text).into_owned()));
    }

    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    /// Child elements paired with their index in `children`
    pub fn child_elements(&self) -> impl Iterator<Item = (usize, &XmlElement)> {
        self.children.iter().enumerate().filter_map(|(idx, node)| match node {
            XmlNode::Element(element) => Some((idx, element)),
            _ => None,
        })
    }

    pub fn first_child(&self, name: &str) -> Option<&XmlElement> {
        self.child_elements()
            .map(|(_, element)| element)
            .find(|element| element.is(name))
    }

    /// Concatenated, unescaped text of the direct text children
    pub fn text(&self) -> Result<String> {
        let mut text = String::new();
        for node in &self.children {
            if let XmlNode::Text(content) = node {
                let unescaped: Cow<'_, str> = content
                    .unescape()
                    .map_err(|e| TsuyakuError::Document(format!("Invalid XML text: {}", e)))?;
                text.push_str(&unescaped);
            }
        }
        Ok(text)
    }
}

#[derive(Debug, Clone)]
pub struct XmlDocument {
    pub nodes: Vec<XmlNode>,
}

impl XmlDocument {
    pub fn parse(input: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(input);
        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut nodes = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                TsuyakuError::Document(format!(
                    "Malformed XML at byte {}: {}",
                    reader.buffer_position(),
                    e
                ))
            })?;

            let node = match event {
                Event::Eof => break,
                Event::Start(start) => {
                    stack.push(XmlElement {
                        start: start.into_owned(),
                        children: Vec::new(),
                        self_closing: false,
                    });
                    buf.clear();
                    continue;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        TsuyakuError::Document("Unbalanced closing tag".to_string())
                    })?;
                    XmlNode::Element(element)
                }
                Event::Empty(start) => XmlNode::Element(XmlElement {
                    start: start.into_owned(),
                    children: Vec::new(),
                    self_closing: true,
                }),
                Event::Text(text) => XmlNode::Text(text.into_owned()),
                other => XmlNode::Other(other.into_owned()),
            };

            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => nodes.push(node),
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(TsuyakuError::Document(format!(
                "Unclosed element <{}>",
                String::from_utf8_lossy(open.name())
            )));
        }

        Ok(Self { nodes })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.nodes {
            write_node(&mut writer, node)?;
        }
        Ok(writer.into_inner())
    }

    /// First top-level element
    pub fn root(&self) -> Option<(usize, &XmlElement)> {
        self.nodes.iter().enumerate().find_map(|(idx, node)| match node {
            XmlNode::Element(element) => Some((idx, element)),
            _ => None,
        })
    }

    /// Element addressed by child indexes starting from the top level
    pub fn element_at(&self, path: &[usize]) -> Option<&XmlElement> {
        let (first, rest) = path.split_first()?;
        let mut current = match self.nodes.get(*first)? {
            XmlNode::Element(element) => element,
            _ => return None,
        };
        for idx in rest {
            current = match current.children.get(*idx)? {
                XmlNode::Element(element) => element,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut XmlElement> {
        let (first, rest) = path.split_first()?;
        let mut current = match self.nodes.get_mut(*first)? {
            XmlNode::Element(element) => element,
            _ => return None,
        };
        for idx in rest {
            current = match current.children.get_mut(*idx)? {
                XmlNode::Element(element) => element,
                _ => return None,
            };
        }
        Some(current)
    }
}

fn write_error<E: std::fmt::Display>(e: E) -> TsuyakuError {
    TsuyakuError::Document(format!("Failed to write XML: {}", e))
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<()> {
    match node {
        XmlNode::Element(element) => {
            if element.self_closing && element.children.is_empty() {
                writer.write_event(Event::Empty(element.start.borrow())).map_err(write_error)?;
            } else {
                writer.write_event(Event::Start(element.start.borrow())).map_err(write_error)?;
                for child in &element.children {
                    write_node(writer, child)?;
                }
                writer.write_event(Event::End(element.start.to_end())).map_err(write_error)?;
            }
        }
        XmlNode::Text(text) => {
            writer.write_event(Event::Text(text.clone())).map_err(write_error)?;
        }
        XmlNode::Other(event) => {
            writer.write_event(event.clone()).map_err(write_error)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="urn:w"><w:body><w:p><w:r><w:t xml:space="preserve">Fish &amp; chips</w:t></w:r></w:p><w:p/><!-- note --></w:body></w:document>"#;

    #[test]
    fn test_unmodified_tree_serializes_to_input() {
        let doc = XmlDocument::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(String::from_utf8(doc.to_bytes().unwrap()).unwrap(), SAMPLE);
    }

    #[test]
    fn test_navigation_and_text() {
        let doc = XmlDocument::parse(SAMPLE.as_bytes()).unwrap();
        let (root_idx, root) = doc.root().unwrap();
        assert!(root.is("w:document"));

        let text = doc.element_at(&[root_idx, 0, 0, 0, 0]).unwrap();
        assert!(text.is("w:t"));
        assert_eq!(text.text().unwrap(), "Fish & chips");
        assert!(doc.element_at(&[root_idx, 9]).is_none());
    }

    #[test]
    fn test_built_elements_escape_text() {
        let mut doc = XmlDocument::parse(b"<a/>").unwrap();
        let root = doc.element_at_mut(&[0]).unwrap();
        let mut child = XmlElement::new("b").with_attribute("k", "v");
        child.push_text("1 < 2");
        root.push_element(child);

        assert_eq!(
            String::from_utf8(doc.to_bytes().unwrap()).unwrap(),
            r#"<a><b k="v">1 &lt; 2</b></a>"#
        );
    }

    #[test]
    fn test_malformed_xml_is_rejected() {
        assert!(XmlDocument::parse(b"<a><b></a>").is_err());
        assert!(XmlDocument::parse(b"<a><b>").is_err());
    }
}
