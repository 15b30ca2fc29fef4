//! Generic ordered XML tree and destination-path addressing.
//!
//! The mapping engine builds output documents through [`MxPath`], a small
//! parsed path expression addressing elements, attributes, and indexed
//! repeats. The tree guarantees element order, attributes, and text content
//! exactly as constructed; serialization goes through `quick-xml`.

use std::fmt;
use std::str::FromStr;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Deserialize;

use crate::error::{Error, Result};

/// One element of the output tree.
///
/// Children keep insertion order; there is no identity beyond structural
/// position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        XmlElement {
            name: name.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Set or overwrite an attribute, preserving first-set order.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(attr) = self.attributes.iter_mut().find(|(n, _)| *n == name) {
            attr.1 = value;
        } else {
            self.attributes.push((name, value));
        }
    }

    /// Locate the `index`-th direct child with the given name, creating it
    /// and any missing earlier occurrences as empty siblings.
    pub fn ensure_child(&mut self, name: &str, index: usize) -> &mut XmlElement {
        let mut seen = 0;
        let mut found = None;
        for (i, child) in self.children.iter().enumerate() {
            if child.name == name {
                if seen == index {
                    found = Some(i);
                    break;
                }
                seen += 1;
            }
        }
        let i = match found {
            Some(i) => i,
            None => {
                for _ in seen..=index {
                    self.children.push(XmlElement::new(name));
                }
                self.children.len() - 1
            }
        };
        &mut self.children[i]
    }

    /// Find the first direct child with the given name, if any.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Serialize to a UTF-8 string with an XML declaration.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        self.write_element(&mut writer)?;
        let body =
            String::from_utf8(writer.into_inner()).map_err(|e| Error::Xml(e.to_string()))?;
        Ok(format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>{body}"
        ))
    }

    /// Write the document to any destination implementing `Write`.
    pub fn write_to<W: std::io::Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        let mut xml_writer = Writer::new(writer);
        self.write_element(&mut xml_writer)
    }

    fn write_element<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (name, value) in &self.attributes {
            start.push_attribute((name.as_str(), value.as_str()));
        }

        if self.children.is_empty() && self.text.is_none() {
            writer
                .write_event(Event::Empty(start))
                .map_err(|e| Error::Xml(e.to_string()))?;
            return Ok(());
        }

        writer
            .write_event(Event::Start(start))
            .map_err(|e| Error::Xml(e.to_string()))?;
        if let Some(ref text) = self.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| Error::Xml(e.to_string()))?;
        }
        for child in &self.children {
            child.write_element(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(|e| Error::Xml(e.to_string()))?;
        Ok(())
    }
}

/// A parsed destination path.
///
/// Syntax: dot-separated segments, e.g. `GrpHdr.MsgId`,
/// `CdtTrfTxInf.IntrBkSttlmAmt@Ccy`, `Dbtr.PstlAdr.AdrLine[1]`. Paths are
/// parsed once when the mapping configuration is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct MxPath {
    pub segments: Vec<PathSegment>,
}

/// One segment of a destination path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Plain child element.
    Element(String),
    /// The `index`-th occurrence of a repeatable child element.
    Indexed { name: String, index: usize },
    /// Attribute set on the current (or named child) element; always
    /// terminal.
    Attribute {
        element: Option<String>,
        name: String,
    },
}

impl MxPath {
    /// Walk the path from `root`, creating elements as needed, and set
    /// `value` as text content or attribute value at the terminal segment.
    pub fn apply(&self, root: &mut XmlElement, value: &str) {
        let mut current = root;
        let last = self.segments.len() - 1;
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Attribute { element, name } => {
                    if let Some(element) = element {
                        current = current.ensure_child(element, 0);
                    }
                    current.set_attribute(name.as_str(), value);
                    return;
                }
                PathSegment::Element(name) => {
                    current = current.ensure_child(name, 0);
                }
                PathSegment::Indexed { name, index } => {
                    current = current.ensure_child(name, *index);
                }
            }
            if i == last {
                current.text = Some(value.to_string());
            }
        }
    }
}

impl FromStr for MxPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidPath("empty path".to_string()));
        }
        let parts: Vec<&str> = s.split('.').collect();
        let mut segments = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                return Err(Error::InvalidPath(format!("empty segment in '{s}'")));
            }
            if let Some((element, attribute)) = part.split_once('@') {
                if attribute.is_empty() {
                    return Err(Error::InvalidPath(format!(
                        "empty attribute name in '{s}'"
                    )));
                }
                if i != parts.len() - 1 {
                    return Err(Error::InvalidPath(format!(
                        "attribute segment must be terminal in '{s}'"
                    )));
                }
                segments.push(PathSegment::Attribute {
                    element: (!element.is_empty()).then(|| element.to_string()),
                    name: attribute.to_string(),
                });
            } else if let Some(open) = part.find('[') {
                if !part.ends_with(']') {
                    return Err(Error::InvalidPath(format!(
                        "malformed index in segment '{part}'"
                    )));
                }
                let name = &part[..open];
                if name.is_empty() {
                    return Err(Error::InvalidPath(format!(
                        "missing element name in segment '{part}'"
                    )));
                }
                let index = part[open + 1..part.len() - 1]
                    .parse::<usize>()
                    .map_err(|_| {
                        Error::InvalidPath(format!("malformed index in segment '{part}'"))
                    })?;
                segments.push(PathSegment::Indexed {
                    name: name.to_string(),
                    index,
                });
            } else {
                segments.push(PathSegment::Element(part.to_string()));
            }
        }
        Ok(MxPath { segments })
    }
}

impl TryFrom<String> for MxPath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for MxPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                PathSegment::Element(name) => f.write_str(name)?,
                PathSegment::Indexed { name, index } => write!(f, "{name}[{index}]")?,
                PathSegment::Attribute { element, name } => {
                    if let Some(element) = element {
                        f.write_str(element)?;
                    }
                    write!(f, "@{name}")?;
                }
            }
        }
        Ok(())
    }
}
