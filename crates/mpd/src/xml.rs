//! A small owned XML element tree on top of `quick-xml`.
//!
//! Manifests are parsed in full before any node is built, so the parser can make two passes
//! over the children of a container and keep opaque payloads (e.g. DRM descriptors) as text.

use std::{io::Cursor, str::FromStr};

use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Reader, Writer,
};

use crate::{
    error::{MpdError, MpdResult},
    types::{parse_duration, parse_unsigned},
};

pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Qualified name as written, e.g. `xlink:href`.
    pub name: String,
    pub value: String,
    /// Namespace bound to the attribute prefix, unprefixed attributes have none.
    pub namespace: Option<String>,
}

impl XmlAttribute {
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Qualified name as written, e.g. `cenc:pssh`.
    pub name: String,
    pub namespace: Option<String>,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Unprefixed attribute lookup.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn attribute_ns(&self, local: &str, namespace: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.local_name() == local && attr.namespace.as_deref() == Some(namespace))
            .map(|attr| attr.value.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    pub fn elements_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.local_name() == local)
    }

    /// Concatenated text content of this element and its descendants.
    pub fn text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, dst: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(t) => dst.push_str(t),
                XmlNode::Element(e) => e.collect_text(dst),
            }
        }
    }

    pub fn set_attr(&mut self, name: &str, value: impl ToString) -> &mut Self {
        let value = value.to_string();
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => self.attributes.push(XmlAttribute {
                name: name.to_string(),
                value,
                namespace: None,
            }),
        }
        self
    }

    pub fn set_attr_opt<T: ToString>(&mut self, name: &str, value: Option<T>) -> &mut Self {
        if let Some(value) = value {
            self.set_attr(name, value);
        }
        self
    }

    pub fn push_child(&mut self, child: XmlElement) -> &mut Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn push_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// Compact serialization of this element and its subtree.
    pub fn to_xml_string(&self) -> MpdResult<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        self.write(&mut writer)?;
        into_string(writer)
    }

    /// Indented serialization with an XML declaration.
    pub fn to_document_string(&self) -> MpdResult<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.write(&mut writer)?;
        into_string(writer)
    }

    pub fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> MpdResult<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for attr in &self.attributes {
            start.push_attribute((attr.name.as_str(), attr.value.as_str()));
        }

        if self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for child in &self.children {
            match child {
                XmlNode::Element(element) => element.write(writer)?,
                XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }

    // Typed attribute getters. A missing attribute is `Ok(None)`, a malformed one is an error.

    pub fn attr_string(&self, name: &str) -> Option<String> {
        self.attribute(name).map(str::to_string)
    }

    pub fn attr_with<T>(
        &self,
        name: &str,
        parse: impl FnOnce(&str) -> MpdResult<T>,
    ) -> MpdResult<Option<T>> {
        let Some(value) = self.attribute(name) else {
            return Ok(None);
        };
        parse(value).map(Some).map_err(|source| {
            log::warn!("Invalid {}@{name}: {value:?}", self.local_name());
            MpdError::InvalidAttribute {
                element: self.local_name().to_string(),
                attribute: name.to_string(),
                source: Box::new(source),
            }
        })
    }

    pub fn attr_parsed<T>(&self, name: &str) -> MpdResult<Option<T>>
    where
        T: FromStr<Err = MpdError>,
    {
        self.attr_with(name, T::from_str)
    }

    pub fn attr_u32(&self, name: &str) -> MpdResult<Option<u32>> {
        self.attr_with(name, |s| {
            parse_unsigned(s.trim()).ok_or_else(|| MpdError::invalid_format("unsignedInt", s))
        })
    }

    pub fn attr_u64(&self, name: &str) -> MpdResult<Option<u64>> {
        self.attr_with(name, |s| {
            parse_unsigned(s.trim()).ok_or_else(|| MpdError::invalid_format("unsignedLong", s))
        })
    }

    pub fn attr_i64(&self, name: &str) -> MpdResult<Option<i64>> {
        self.attr_with(name, |s| {
            s.trim()
                .parse()
                .map_err(|_| MpdError::invalid_format("long", s))
        })
    }

    pub fn attr_f64(&self, name: &str) -> MpdResult<Option<f64>> {
        self.attr_with(name, |s| {
            s.trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .ok_or_else(|| MpdError::invalid_format("double", s))
        })
    }

    pub fn attr_bool(&self, name: &str) -> MpdResult<Option<bool>> {
        self.attr_with(name, |s| match s.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(MpdError::invalid_format("boolean", s)),
        })
    }

    /// Duration in milliseconds.
    pub fn attr_duration(&self, name: &str) -> MpdResult<Option<u64>> {
        self.attr_with(name, parse_duration)
    }

    /// Whitespace separated list of strings.
    pub fn attr_string_vec(&self, name: &str) -> Option<Vec<String>> {
        self.attribute(name)
            .map(|s| s.split_whitespace().map(str::to_string).collect())
    }

    /// Whitespace separated list of unsigned integers.
    pub fn attr_u32_vec(&self, name: &str) -> MpdResult<Option<Vec<u32>>> {
        self.attr_with(name, |s| {
            s.split_whitespace()
                .map(|item| {
                    parse_unsigned(item).ok_or_else(|| MpdError::invalid_format("UIntVector", s))
                })
                .collect()
        })
    }

    pub fn xlink_href(&self) -> Option<String> {
        self.attribute_ns("href", XLINK_NAMESPACE)
            .map(str::to_string)
    }

    pub fn xlink_actuate(&self) -> Option<&str> {
        self.attribute_ns("actuate", XLINK_NAMESPACE)
    }
}

fn local_name(qualified: &str) -> &str {
    qualified
        .split_once(':')
        .map(|(_, local)| local)
        .unwrap_or(qualified)
}

fn into_string(writer: Writer<Cursor<Vec<u8>>>) -> MpdResult<String> {
    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| MpdError::Utf8(e.utf8_error()))
}

/// Parse a complete document with exactly one root element.
pub fn parse_document(xml: &[u8]) -> MpdResult<XmlElement> {
    let mut roots = parse_elements(xml)?;
    if roots.len() != 1 {
        return Err(MpdError::UnbalancedXml);
    }
    Ok(roots.remove(0))
}

/// Parse a fragment that may hold any number of sibling top-level elements.
pub fn parse_fragment(xml: &[u8]) -> MpdResult<Vec<XmlElement>> {
    parse_elements(xml)
}

type NamespaceScope = Vec<(String, String)>;

fn parse_elements(xml: &[u8]) -> MpdResult<Vec<XmlElement>> {
    let mut reader = Reader::from_reader(xml);
    let mut roots = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut scopes: Vec<NamespaceScope> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let (element, scope) = build_element(&e, &scopes)?;
                scopes.push(scope);
                stack.push(element);
            }
            Event::Empty(e) => {
                let (element, _) = build_element(&e, &scopes)?;
                attach(element, &mut stack, &mut roots);
            }
            Event::End(_) => {
                let element = stack.pop().ok_or(MpdError::UnbalancedXml)?;
                scopes.pop();
                attach(element, &mut stack, &mut roots);
            }
            Event::Text(t) => {
                let text = t.unescape()?;
                if text.trim().is_empty() {
                    continue;
                }
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Text(text.into_owned())),
                    None => return Err(MpdError::UnbalancedXml),
                }
            }
            Event::CData(c) => {
                let data = c.into_inner();
                let text = std::str::from_utf8(&data)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Text(text.to_string())),
                    None => return Err(MpdError::UnbalancedXml),
                }
            }
            Event::Decl(d) => check_encoding(&d)?,
            Event::Eof => break,
            // comments, processing instructions and doctypes carry nothing we model
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(MpdError::UnbalancedXml);
    }
    Ok(roots)
}

/// Only UTF-8 input is decoded, anything else declared in the prolog is rejected.
fn check_encoding(decl: &BytesDecl<'_>) -> MpdResult<()> {
    let Some(encoding) = decl.encoding() else {
        return Ok(());
    };
    let encoding = encoding?;
    let encoding = std::str::from_utf8(&encoding)?;
    if encoding.eq_ignore_ascii_case("utf-8") || encoding.eq_ignore_ascii_case("utf8") {
        Ok(())
    } else {
        Err(MpdError::UnsupportedEncoding(encoding.to_string()))
    }
}

fn attach(element: XmlElement, stack: &mut [XmlElement], roots: &mut Vec<XmlElement>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => roots.push(element),
    }
}

fn build_element(
    start: &BytesStart<'_>,
    scopes: &[NamespaceScope],
) -> MpdResult<(XmlElement, NamespaceScope)> {
    let name = std::str::from_utf8(start.name().as_ref())?.to_string();

    let mut raw_attributes = Vec::new();
    let mut scope = NamespaceScope::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr.unescape_value()?.into_owned();
        if key == "xmlns" {
            scope.push((String::new(), value.clone()));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            scope.push((prefix.to_string(), value.clone()));
        }
        raw_attributes.push((key, value));
    }

    let lookup = |prefix: &str| -> Option<String> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE.to_string());
        }
        scope
            .iter()
            .chain(scopes.iter().rev().flatten())
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.clone())
    };

    let namespace = match name.split_once(':') {
        Some((prefix, _)) => lookup(prefix),
        None => lookup(""),
    };
    let attributes = raw_attributes
        .into_iter()
        .map(|(name, value)| {
            let namespace = match name.split_once(':') {
                Some(("xmlns", _)) => None,
                Some((prefix, _)) => lookup(prefix),
                None => None,
            };
            XmlAttribute {
                name,
                value,
                namespace,
            }
        })
        .collect();

    Ok((
        XmlElement {
            name,
            namespace,
            attributes,
            children: Vec::new(),
        },
        scope,
    ))
}
