//! XML content types for tree nodes.
//!
//! This module provides `XmlNode`, the sum type every document node is made
//! of, together with the element and attribute types it carries.

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// An element with a tag name, ordered attributes and children.
    Element(XmlElement),
    /// Character data, stored unescaped.
    Text(String),
    /// Comment body, without the `<!--`/`-->` delimiters.
    Comment(String),
    /// CDATA section body.
    CData(String),
    /// DOCTYPE body, everything between `<!DOCTYPE` and `>`.
    Doctype(String),
    /// Processing instruction, including the XML declaration.
    ProcessingInstruction(XmlProcessingInstruction),
}

impl XmlNode {
    /// Creates a text node.
    pub fn text(text: impl Into<String>) -> Self {
        XmlNode::Text(text.into())
    }

    /// Creates a comment node.
    pub fn comment(comment: impl Into<String>) -> Self {
        XmlNode::Comment(comment.into())
    }

    /// Returns true if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self, XmlNode::Element(_))
    }

    /// Returns true if this is an element with the given tag name.
    pub fn is_element_named(&self, name: &str) -> bool {
        matches!(self, XmlNode::Element(e) if e.name() == name)
    }

    /// Returns a reference to the element, if this is an element node.
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns a mutable reference to the element, if this is an element node.
    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the text, if this is a text node.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlNode::Text(t) => Some(t),
            _ => None,
        }
    }
}

impl From<XmlElement> for XmlNode {
    fn from(element: XmlElement) -> Self {
        XmlNode::Element(element)
    }
}

/// An element attribute.
///
/// A missing value marks a flag attribute, printed as the bare name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: Option<String>,
}

impl XmlAttribute {
    /// Creates an attribute with a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        XmlAttribute {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Creates a valueless attribute.
    pub fn flag(name: impl Into<String>) -> Self {
        XmlAttribute {
            name: name.into(),
            value: None,
        }
    }
}

/// An XML element.
///
/// Attributes keep their insertion order. Name uniqueness is maintained by
/// `set_attr`; pushing through `attributes_mut` leaves it to the caller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    name: String,
    attributes: Vec<XmlAttribute>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// Creates an element with no attributes and no children.
    pub fn new(name: impl Into<String>) -> Self {
        XmlElement {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of `set_attr`.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Adds a valueless attribute.
    pub fn with_flag(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = None,
            None => self.attributes.push(XmlAttribute::flag(name)),
        }
        self
    }

    /// Appends a child node.
    pub fn with_child(mut self, child: impl Into<XmlNode>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Returns the tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the element.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns the attributes in document order.
    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    /// Returns a mutable reference to the attribute list.
    pub fn attributes_mut(&mut self) -> &mut Vec<XmlAttribute> {
        &mut self.attributes
    }

    /// Looks up an attribute by name.
    pub fn attr(&self, name: &str) -> Option<&XmlAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Returns the value of an attribute, if present and valued.
    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attr(name).and_then(|a| a.value.as_deref())
    }

    /// Returns true if the element carries the attribute.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Sets an attribute value, replacing it in place if it already exists.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = Some(value),
            None => self.attributes.push(XmlAttribute {
                name,
                value: Some(value),
            }),
        }
    }

    /// Removes an attribute, returning it if it was present.
    pub fn remove_attr(&mut self, name: &str) -> Option<XmlAttribute> {
        let pos = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(pos))
    }

    /// Returns the child nodes.
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Returns a mutable reference to the child list.
    pub fn children_mut(&mut self) -> &mut Vec<XmlNode> {
        &mut self.children
    }

    /// Appends a child node.
    pub fn push_child(&mut self, child: impl Into<XmlNode>) {
        self.children.push(child.into());
    }

    /// An element is empty when it has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// A processing instruction such as `<?xml version="1.0"?>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlProcessingInstruction {
    /// Target name (`xml` for the declaration).
    pub name: String,
    /// Everything after the target, leading whitespace removed.
    pub body: String,
}

impl XmlProcessingInstruction {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        XmlProcessingInstruction {
            name: name.into(),
            body: body.into(),
        }
    }
}
