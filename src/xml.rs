//! Owned, mutable XML tree.
//!
//! `roxmltree` gives a read-only view, which is all the PDF side ever needed.
//! Merging rewrites parts of `word/document.xml` in place, so parts are copied
//! into [`XmlElement`]s that keep their qualified names (prefixes as written in
//! the source) and namespace declarations, and can be serialized back.

use crate::error::Error;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

#[derive(Clone, Debug, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Comment(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct XmlElement {
    /// Qualified name as written, e.g. `w:p`.
    pub name: String,
    /// Resolved namespace URI of the element.
    pub namespace: Option<String>,
    /// Qualified attribute names, including `xmlns` declarations introduced here.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: &str, namespace: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.map(String::from),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn local_name(&self) -> &str {
        self.name
            .rsplit_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.local_name() == local
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.push(child);
        self
    }

    pub fn child_elements(&self) -> impl DoubleEndedIterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn child(&self, namespace: &str, local: &str) -> Option<&XmlElement> {
        self.child_elements().find(|e| e.is(namespace, local))
    }

    pub fn child_mut(&mut self, namespace: &str, local: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find_map(|n| match n {
            XmlNode::Element(e) if e.is(namespace, local) => Some(e),
            _ => None,
        })
    }

    /// All element descendants in document order, excluding `self`.
    pub fn descendants(&self) -> impl Iterator<Item = &XmlElement> {
        let mut stack: Vec<&XmlElement> = self.child_elements().rev().collect();
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.child_elements().rev());
            Some(next)
        })
    }

    /// Concatenated character data of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    pub fn write(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            escape_into(value, true, out);
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(e) => e.write(out),
                XmlNode::Text(t) => escape_into(t, false, out),
                XmlNode::Comment(c) => {
                    out.push_str("<!--");
                    out.push_str(c);
                    out.push_str("-->");
                }
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    /// Serialize as a standalone part, with the XML declaration Word writes.
    pub fn to_document_string(&self) -> String {
        let mut out = String::with_capacity(4096);
        out.push_str(XML_DECLARATION);
        out.push('\n');
        self.write(&mut out);
        out
    }
}

fn collect_text(element: &XmlElement, out: &mut String) {
    for child in &element.children {
        match child {
            XmlNode::Element(e) => collect_text(e, out),
            XmlNode::Text(t) => out.push_str(t),
            XmlNode::Comment(_) => {}
        }
    }
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    escape_into(s, true, &mut out);
    out
}

/// Characters allowed in XML 1.0 documents.
pub fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..)
}

fn escape_into(s: &str, attribute: bool, out: &mut String) {
    for ch in s.chars() {
        match ch {
            c if !is_xml_char(c) => {}
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\n' if attribute => out.push_str("&#10;"),
            '\r' if attribute => out.push_str("&#13;"),
            '\t' if attribute => out.push_str("&#9;"),
            c => out.push(c),
        }
    }
}

/// Parse a complete XML part into an owned tree rooted at its root element.
pub fn parse(text: &str) -> Result<XmlElement, Error> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let doc = roxmltree::Document::parse(text)?;
    Ok(convert(doc.root_element()))
}

fn convert(node: roxmltree::Node) -> XmlElement {
    let mut attributes = Vec::new();
    let parent = node.parent_element();
    for ns in node.namespaces() {
        if ns.name() == Some("xml") {
            continue;
        }
        let inherited = parent.is_some_and(|p| {
            p.namespaces()
                .any(|pn| pn.name() == ns.name() && pn.uri() == ns.uri())
        });
        if inherited {
            continue;
        }
        let key = match ns.name() {
            Some(prefix) => format!("xmlns:{}", prefix),
            None => "xmlns".to_string(),
        };
        attributes.push((key, ns.uri().to_string()));
    }
    for attr in node.attributes() {
        attributes.push((
            qualified(node, attr.namespace(), attr.name()),
            attr.value().to_string(),
        ));
    }

    let tag = node.tag_name();
    let mut element = XmlElement {
        name: qualified(node, tag.namespace(), tag.name()),
        namespace: tag.namespace().map(String::from),
        attributes,
        children: Vec::new(),
    };
    for child in node.children() {
        if child.is_element() {
            element.children.push(XmlNode::Element(convert(child)));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                element.children.push(XmlNode::Text(text.to_string()));
            }
        } else if child.is_comment() {
            if let Some(text) = child.text() {
                element.children.push(XmlNode::Comment(text.to_string()));
            }
        }
    }
    element
}

fn qualified(node: roxmltree::Node, namespace: Option<&str>, local: &str) -> String {
    match namespace.and_then(|uri| node.lookup_prefix(uri)) {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local),
        _ => local.to_string(),
    }
}
