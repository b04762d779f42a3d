//! XML document primitives.
//!
//! Responses are parsed into an owned [`Element`] tree with every element's
//! namespace resolved, then queried with `a/b/c` paths inside a single
//! namespace. Request bodies are produced through [`XmlWriter`].

use std::io::Cursor;

use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use quick_xml::Writer;
use thiserror::Error;

/// Errors raised while reading or writing XML.
#[derive(Error, Debug)]
pub enum XmlError {
    /// Malformed markup.
    #[error("XML syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),

    /// Malformed attribute.
    #[error("XML attribute error: {0}")]
    Attribute(#[from] AttrError),

    /// Document has no root or unbalanced tags.
    #[error("XML structure error: {0}")]
    Structure(String),

    /// Written document is not UTF-8.
    #[error("XML encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// An owned, namespace-resolved XML element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    namespace: Option<String>,
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    /// Parse a document and return its root element.
    ///
    /// # Errors
    /// Returns [`XmlError`] if the document is malformed or empty.
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let mut reader = NsReader::from_str(xml);
        reader.trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_resolved_event()? {
                (namespace, Event::Start(start)) => {
                    stack.push(Self::from_start(&namespace, &start)?);
                }
                (namespace, Event::Empty(start)) => {
                    let element = Self::from_start(&namespace, &start)?;
                    Self::attach(&mut stack, &mut root, element)?;
                }
                (_, Event::End(_)) => {
                    let element = stack.pop().ok_or_else(|| {
                        XmlError::Structure("closing tag without matching start".to_string())
                    })?;
                    Self::attach(&mut stack, &mut root, element)?;
                }
                (_, Event::Text(text)) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text.unescape()?);
                    }
                }
                (_, Event::CData(data)) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                (_, Event::Eof) => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(XmlError::Structure(format!(
                "unclosed element <{}>",
                stack[stack.len() - 1].name
            )));
        }

        root.ok_or_else(|| XmlError::Structure("document has no root element".to_string()))
    }

    fn from_start(namespace: &ResolveResult<'_>, start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let namespace = match namespace {
            ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.0).into_owned()),
            _ => None,
        };

        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute?;
            if attribute.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            namespace,
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    fn attach(
        stack: &mut [Element],
        root: &mut Option<Element>,
        element: Element,
    ) -> Result<(), XmlError> {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(element);
        } else if root.is_none() {
            *root = Some(element);
        } else {
            return Err(XmlError::Structure(
                "document has more than one root element".to_string(),
            ));
        }
        Ok(())
    }

    /// Local name of the element.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace URI the element is bound to, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Text content directly inside the element.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Attribute value by local name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether this element has the given local name in the given namespace.
    ///
    /// An empty `namespace` matches unqualified elements.
    #[must_use]
    pub fn is(&self, name: &str, namespace: &str) -> bool {
        self.name == name && self.namespace.as_deref().unwrap_or("") == namespace
    }

    /// First element matching a `/`-separated path of child names.
    #[must_use]
    pub fn find(&self, path: &str, namespace: &str) -> Option<&Element> {
        path.split('/').try_fold(self, |current, segment| {
            current
                .children
                .iter()
                .find(|child| child.is(segment, namespace))
        })
    }

    /// Text of the first element matching `path`.
    #[must_use]
    pub fn findtext(&self, path: &str, namespace: &str) -> Option<&str> {
        self.find(path, namespace).map(Element::text)
    }

    /// Every element matching `path`; the last segment may repeat.
    #[must_use]
    pub fn findall(&self, path: &str, namespace: &str) -> Vec<&Element> {
        let (parent, leaf) = match path.rsplit_once('/') {
            Some((parent, leaf)) => (self.find(parent, namespace), leaf),
            None => (Some(self), path),
        };

        parent
            .map(|parent| {
                parent
                    .children
                    .iter()
                    .filter(|child| child.is(leaf, namespace))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Streaming writer for request documents.
pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            writer: Writer::new(Cursor::new(Vec::new())),
        }
    }

    /// Open an element with the given attributes.
    ///
    /// # Errors
    /// Returns [`XmlError`] if the event cannot be written.
    pub fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), XmlError> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.writer.write_event(Event::Start(element))?;
        Ok(())
    }

    /// Close an element opened with [`XmlWriter::start`].
    ///
    /// # Errors
    /// Returns [`XmlError`] if the event cannot be written.
    pub fn end(&mut self, name: &str) -> Result<(), XmlError> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Write a self-closing element.
    ///
    /// # Errors
    /// Returns [`XmlError`] if the event cannot be written.
    pub fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), XmlError> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.writer.write_event(Event::Empty(element))?;
        Ok(())
    }

    /// Write `<name>text</name>`, escaping the text.
    ///
    /// # Errors
    /// Returns [`XmlError`] if the events cannot be written.
    pub fn text_element(&mut self, name: &str, text: &str) -> Result<(), XmlError> {
        self.start(name, &[])?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    /// Consume the writer and return the document.
    ///
    /// # Errors
    /// Returns [`XmlError::Encoding`] if the output is not UTF-8.
    pub fn finish(self) -> Result<String, XmlError> {
        Ok(String::from_utf8(self.writer.into_inner().into_inner())?)
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}
