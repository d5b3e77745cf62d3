use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A loosely parsed XML document. Parsing never fails: malformed input yields
/// whatever structure could be recovered before the first hard error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlDocument {
    pub nodes: Vec<XmlNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlDocument {
    pub fn parse(input: &str) -> Self {
        let mut reader = Reader::from_str(input);
        let config = reader.config_mut();
        config.trim_text(true);
        config.check_end_names = false;

        let mut nodes: Vec<XmlNode> = Vec::new();
        let mut open: Vec<XmlElement> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => open.push(element_from(&start)),
                Ok(Event::Empty(start)) => {
                    attach(&mut open, &mut nodes, XmlNode::Element(element_from(&start)));
                }
                Ok(Event::End(end)) => {
                    let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                    // Close everything opened since the matching tag; stray end tags are dropped.
                    if let Some(pos) = open.iter().rposition(|el| el.name == name) {
                        while open.len() > pos {
                            if let Some(el) = open.pop() {
                                attach(&mut open, &mut nodes, XmlNode::Element(el));
                            }
                        }
                    }
                }
                Ok(Event::Text(text)) => {
                    let value = text
                        .unescape()
                        .map(Cow::into_owned)
                        .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned());
                    if !value.is_empty() {
                        attach(&mut open, &mut nodes, XmlNode::Text(value));
                    }
                }
                Ok(Event::CData(data)) => {
                    let value = String::from_utf8_lossy(&data).into_owned();
                    attach(&mut open, &mut nodes, XmlNode::Text(value));
                }
                Ok(Event::Eof) | Err(_) => break,
                Ok(_) => {}
            }
        }

        // Unclosed elements end where the input ends.
        while let Some(el) = open.pop() {
            attach(&mut open, &mut nodes, XmlNode::Element(el));
        }

        Self { nodes }
    }

    /// First top-level element.
    pub fn root(&self) -> Option<&XmlElement> {
        self.nodes.iter().find_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    /// Depth-first search for the first element named `name`.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        find_in(&self.nodes, name)
    }
}

impl XmlElement {
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        find_in(&self.children, name)
    }

    /// All descendant text joined by single spaces.
    pub fn text(&self) -> String {
        let mut parts = Vec::new();
        collect_text(&self.children, &mut parts);
        parts.join(" ")
    }
}

fn element_from(start: &BytesStart<'_>) -> XmlElement {
    let attributes = start
        .attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map(Cow::into_owned)
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            (key, value)
        })
        .collect();
    XmlElement {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        attributes,
        children: Vec::new(),
    }
}

fn attach(open: &mut [XmlElement], nodes: &mut Vec<XmlNode>, node: XmlNode) {
    match open.last_mut() {
        Some(parent) => parent.children.push(node),
        None => nodes.push(node),
    }
}

fn find_in<'a>(nodes: &'a [XmlNode], name: &str) -> Option<&'a XmlElement> {
    for node in nodes {
        if let XmlNode::Element(el) = node {
            if el.name == name {
                return Some(el);
            }
            if let Some(found) = find_in(&el.children, name) {
                return Some(found);
            }
        }
    }
    None
}

fn collect_text<'a>(nodes: &'a [XmlNode], parts: &mut Vec<&'a str>) {
    for node in nodes {
        match node {
            XmlNode::Text(text) => parts.push(text),
            XmlNode::Element(el) => collect_text(&el.children, parts),
        }
    }
}
