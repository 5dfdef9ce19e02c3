//! Node structures for the SVG document tree.
//!
//! A document is an owned tree: `XmlDocument` holds the top-level nodes and
//! every element owns its children. Cloning a document yields an independent
//! working copy.

mod xml_content;

pub use xml_content::{XmlAttribute, XmlElement, XmlNode, XmlProcessingInstruction};

/// A parsed document: the synthetic root holding the top-level nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlDocument {
    children: Vec<XmlNode>,
}

impl XmlDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a document from its top-level nodes.
    pub fn from_children(children: Vec<XmlNode>) -> Self {
        XmlDocument { children }
    }

    /// Returns the top-level nodes.
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Returns a mutable reference to the top-level node list.
    pub fn children_mut(&mut self) -> &mut Vec<XmlNode> {
        &mut self.children
    }

    /// Appends a top-level node.
    pub fn push_child(&mut self, child: impl Into<XmlNode>) {
        self.children.push(child.into());
    }

    /// Returns the first top-level element with the given name.
    pub fn first_element(&self, name: &str) -> Option<&XmlElement> {
        self.children
            .iter()
            .filter_map(XmlNode::as_element)
            .find(|e| e.name() == name)
    }

    /// Returns true if the document holds at least one top-level element.
    pub fn has_root_element(&self) -> bool {
        self.children.iter().any(XmlNode::is_element)
    }
}

impl From<XmlElement> for XmlDocument {
    fn from(root: XmlElement) -> Self {
        XmlDocument {
            children: vec![XmlNode::Element(root)],
        }
    }
}
