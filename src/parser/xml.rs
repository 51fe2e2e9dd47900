//! Owned, mutable XML element tree.
//!
//! WordprocessingML parts are small enough to hold fully in memory. The
//! tree keeps every element, attribute, text node, CDATA section and
//! comment so that a part can be edited and written back without losing
//! anything the engines did not touch. Cloning an element is a deep copy.

use std::borrow::Cow;
use std::fmt::Write;

use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// A node inside an element.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// A child element
    Element(XmlElement),
    /// Character data (unescaped)
    Text(String),
    /// A CDATA section (raw)
    CData(String),
    /// A comment (raw)
    Comment(String),
}

/// An XML element with its qualified name, attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Qualified name, e.g. `w:p`
    pub name: String,
    /// Attributes in source order, values unescaped
    pub attributes: Vec<(String, String)>,
    /// Child nodes in source order
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute and return self.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Add a text child and return self.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// Add a child element and return self.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Local part of the name (`p` for `w:p`).
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Check the local name.
    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    /// Get an attribute by qualified name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get an attribute by local name, ignoring its prefix.
    pub fn attr_local(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| local_part(k) == local)
            .map(|(_, v)| v.as_str())
    }

    /// Set (or overwrite) an attribute.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Iterate over child elements.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Iterate mutably over child elements.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Child elements with the given local name.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.is(local))
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(local))
    }

    /// First child element with the given local name, mutably.
    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.is(local))
    }

    /// Concatenated text of all descendant text and CDATA nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Element(e) => e.collect_text(out),
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                XmlNode::Comment(_) => {}
            }
        }
    }

    /// Visit this element and all descendant elements, depth first.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut XmlElement)) {
        f(self);
        for child in self.elements_mut() {
            child.walk_mut(f);
        }
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            // Writing into a String cannot fail.
            let _ = write!(out, " {}=\"{}\"", key, escape(value.as_str()));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for node in &self.children {
            match node {
                XmlNode::Element(e) => e.write_to(out),
                XmlNode::Text(t) => out.push_str(&partial_escape(t.as_str())),
                XmlNode::CData(t) => {
                    out.push_str("<![CDATA[");
                    out.push_str(t);
                    out.push_str("]]>");
                }
                XmlNode::Comment(t) => {
                    out.push_str("<!--");
                    out.push_str(t);
                    out.push_str("-->");
                }
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

/// A parsed XML part.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// Whether the source carried an XML declaration
    pub has_declaration: bool,
    /// The root element
    pub root: XmlElement,
}

impl XmlDocument {
    /// Wrap a root element.
    pub fn new(root: XmlElement) -> Self {
        Self {
            has_declaration: true,
            root,
        }
    }

    /// Parse a UTF-8 XML part.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data).map_err(|e| Error::Xml(e.to_string()))?;
        Self::parse_str(text)
    }

    /// Parse XML from a string.
    pub fn parse_str(text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(false);

        let mut has_declaration = false;
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event()? {
                Event::Decl(_) => has_declaration = true,
                Event::Start(e) => stack.push(element_from_start(&e)?),
                Event::Empty(e) => {
                    let element = element_from_start(&e)?;
                    attach(&mut stack, &mut root, XmlNode::Element(element))?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::Xml("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, XmlNode::Element(element))?;
                }
                Event::Text(e) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = e.unescape()?;
                        parent.children.push(XmlNode::Text(text.into_owned()));
                    }
                }
                Event::CData(e) => {
                    if let Some(parent) = stack.last_mut() {
                        let raw = e.into_inner();
                        parent
                            .children
                            .push(XmlNode::CData(String::from_utf8_lossy(&raw).into_owned()));
                    }
                }
                Event::Comment(e) => {
                    if let Some(parent) = stack.last_mut() {
                        let raw = e.into_inner();
                        parent
                            .children
                            .push(XmlNode::Comment(String::from_utf8_lossy(&raw).into_owned()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(Error::Xml(format!("unclosed element <{}>", stack[0].name)));
        }
        let root = root.ok_or_else(|| Error::Xml("document has no root element".to_string()))?;

        Ok(Self {
            has_declaration,
            root,
        })
    }

    /// Serialize to a string.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        if self.has_declaration {
            out.push_str(XML_DECLARATION);
            out.push_str("\r\n");
        }
        self.root.write_to(&mut out);
        out
    }

    /// Serialize to UTF-8 bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_xml_string().into_bytes()
    }
}

fn local_part(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value: Cow<'_, str> = attr.unescape_value()?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    node: XmlNode,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    match node {
        XmlNode::Element(element) if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        XmlNode::Element(element) => Err(Error::Xml(format!(
            "second root element <{}>",
            element.name
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_navigate() {
        let doc = XmlDocument::parse_str(
            r#"<?xml version="1.0"?><w:p xmlns:w="urn:w"><w:r><w:t>Hi &amp; bye</w:t></w:r></w:p>"#,
        )
        .unwrap();

        assert!(doc.has_declaration);
        assert!(doc.root.is("p"));
        let run = doc.root.child("r").unwrap();
        assert_eq!(run.child("t").unwrap().text_content(), "Hi & bye");
        assert_eq!(doc.root.attr("xmlns:w"), Some("urn:w"));
    }

    #[test]
    fn test_round_trip_preserves_content() {
        let source = r#"<a x="1 &lt; 2"><!--note--><b/>text<c><![CDATA[raw <x>]]></c></a>"#;
        let doc = XmlDocument::parse_str(source).unwrap();
        let written = doc.to_xml_string();
        assert_eq!(written, r#"<a x="1 &lt; 2"><!--note--><b/>text<c><![CDATA[raw <x>]]></c></a>"#);
        assert_eq!(XmlDocument::parse_str(&written).unwrap(), doc);
    }

    #[test]
    fn test_escapes_text_on_write() {
        let root = XmlElement::new("t").with_text("a < b & c");
        let doc = XmlDocument {
            has_declaration: false,
            root,
        };
        assert_eq!(doc.to_xml_string(), "<t>a &lt; b &amp; c</t>");
    }

    #[test]
    fn test_clone_is_independent() {
        let original = XmlElement::new("tr").with_child(XmlElement::new("t").with_text("x"));
        let mut copy = original.clone();
        copy.walk_mut(&mut |e| {
            if e.is("t") {
                e.children = vec![XmlNode::Text("y".into())];
            }
        });
        assert_eq!(original.text_content(), "x");
        assert_eq!(copy.text_content(), "y");
    }

    #[test]
    fn test_malformed_xml_is_rejected() {
        assert!(XmlDocument::parse_str("<a><b></a>").is_err());
        assert!(XmlDocument::parse_str("<a>").is_err());
        assert!(XmlDocument::parse_str("").is_err());
    }

    #[test]
    fn test_attr_local_ignores_prefix() {
        let el = XmlElement::new("w:jc").with_attr("w:val", "center");
        assert_eq!(el.attr_local("val"), Some("center"));
        assert_eq!(el.attr("val"), None);
    }
}
