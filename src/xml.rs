//! Minimal namespace-aware XML tree used by the document scanners.
//!
//! Documents are read once with [`quick_xml::NsReader`] into an owned tree of
//! [`Element`]s and text nodes. Scanners walk that tree with
//! [`Element::elements`], which filters out everything but child elements.
//!
//! Entity references the reader cannot expand (DocBook documents often use
//! DTD-defined entities) are kept as their raw text.

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use std::borrow::Cow;

use crate::core::SweepError;
use crate::utils::normalize_whitespace;

/// A node of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with its resolved namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub ns: Option<String>,
    /// Local name, without prefix
    pub name: String,
    /// Attributes keyed by qualified name (`xml:lang` keeps its prefix)
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    /// True if the element has namespace `ns` and local name `name`.
    pub fn is(&self, ns: Option<&str>, name: &str) -> bool {
        self.ns.as_deref() == ns && self.name == name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    /// The `xml:lang` attribute.
    pub fn lang(&self) -> Option<&str> {
        self.attr("xml:lang")
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// First child element with local name `name`, any namespace.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// Concatenated text of all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Descendant text with whitespace runs collapsed and ends trimmed.
    pub fn normalized_text(&self) -> String {
        normalize_whitespace(&self.text())
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for node in &element.children {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(child) => collect_text(child, out),
        }
    }
}

/// Parses `text` into its root element.
///
/// # Errors
///
/// [`SweepError::ParseFailure`] for malformed XML or a document without a
/// root element.
pub fn parse_document(text: &str, source_name: &str) -> Result<Element, SweepError> {
    let mut reader = NsReader::from_str(text);
    reader.config_mut().expand_empty_elements = true;

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        let event =
            reader.read_resolved_event().map_err(|e| SweepError::parse(source_name, e.to_string()))?;

        match event {
            (ns, Event::Start(start)) => {
                stack.push(start_element(ns, &start));
            }
            (_, Event::End(_)) => {
                let Some(element) = stack.pop() else {
                    return Err(SweepError::parse(source_name, "unbalanced end tag"));
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(element)),
                    None => {
                        root = Some(element);
                    }
                }
            }
            (_, Event::Text(text)) => {
                if let Some(parent) = stack.last_mut() {
                    let value = match text.unescape() {
                        Ok(value) => value.into_owned(),
                        Err(_) => String::from_utf8_lossy(&text).into_owned(),
                    };
                    parent.children.push(Node::Text(value));
                }
            }
            (_, Event::CData(data)) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(String::from_utf8_lossy(&data).into_owned()));
                }
            }
            (_, Event::Eof) => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(SweepError::parse(source_name, "unexpected end of document"));
    }
    root.ok_or_else(|| SweepError::parse(source_name, "no root element"))
}

fn start_element(ns: ResolveResult<'_>, start: &BytesStart<'_>) -> Element {
    let ns = match ns {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        _ => None,
    };
    let attrs = start
        .attributes()
        .filter_map(Result::ok)
        .filter(|attr| {
            let key = attr.key.as_ref();
            key != b"xmlns" && !key.starts_with(b"xmlns:")
        })
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map(Cow::into_owned)
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            (key, value)
        })
        .collect();

    Element {
        ns,
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attrs,
        children: Vec::new(),
    }
}
