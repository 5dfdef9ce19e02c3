//! XML parser that builds document trees.
//!
//! This parser uses quick-xml's streaming API. Attribute order, comments,
//! CDATA sections, the DOCTYPE and processing instructions are all kept so
//! a document survives a parse/print cycle.

use std::fs;
use std::path::Path;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::constants::is_text_element;
use crate::error::{Error, Result};
use crate::node::{XmlAttribute, XmlDocument, XmlElement, XmlNode, XmlProcessingInstruction};

/// XML parser that builds document trees.
#[derive(Debug, Default)]
pub struct XmlParser {
    /// Keep whitespace-only text everywhere, not only inside text elements.
    keep_whitespace: bool,
}

impl XmlParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps whitespace-only text nodes outside text elements too.
    pub fn keep_whitespace(mut self, keep: bool) -> Self {
        self.keep_whitespace = keep;
        self
    }

    /// Parses XML from a string.
    pub fn parse_str(&self, xml: &str) -> Result<XmlDocument> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        reader.config_mut().check_end_names = true;

        // Open elements; the document's top-level nodes live in `top`.
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut top: Vec<XmlNode> = Vec::new();
        let mut text: Option<String> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| Error::Parse(format!("{} at position {}", e, reader.error_position())))?;
            match event {
                Event::Start(ref e) => {
                    self.flush_text(&mut text, &mut stack, &mut top);
                    stack.push(parse_element(e)?);
                }
                Event::End(_) => {
                    self.flush_text(&mut text, &mut stack, &mut top);
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::Parse("unexpected closing tag".to_string()))?;
                    append(&mut stack, &mut top, XmlNode::Element(element));
                }
                Event::Empty(ref e) => {
                    self.flush_text(&mut text, &mut stack, &mut top);
                    let element = parse_element(e)?;
                    append(&mut stack, &mut top, XmlNode::Element(element));
                }
                Event::Text(e) => {
                    let decoded = e.decode().map_err(|e| Error::Parse(e.to_string()))?;
                    text.get_or_insert_with(String::new).push_str(&decoded);
                }
                Event::GeneralRef(e) => {
                    let resolved = match e.resolve_char_ref() {
                        Ok(Some(c)) => c.to_string(),
                        Ok(None) => {
                            let name = e.decode().map_err(|e| Error::Parse(e.to_string()))?;
                            resolve_predefined_entity(&name)
                                .ok_or_else(|| {
                                    Error::Parse(format!("unknown entity reference &{};", name))
                                })?
                                .to_string()
                        }
                        Err(err) => return Err(Error::Parse(err.to_string())),
                    };
                    text.get_or_insert_with(String::new).push_str(&resolved);
                }
                Event::CData(e) => {
                    self.flush_text(&mut text, &mut stack, &mut top);
                    let body = std::str::from_utf8(e.as_ref())
                        .map_err(|e| Error::Parse(e.to_string()))?
                        .to_string();
                    append(&mut stack, &mut top, XmlNode::CData(body));
                }
                Event::Comment(e) => {
                    self.flush_text(&mut text, &mut stack, &mut top);
                    let body = std::str::from_utf8(e.as_ref())
                        .map_err(|e| Error::Parse(e.to_string()))?;
                    append(&mut stack, &mut top, XmlNode::Comment(body.trim().to_string()));
                }
                Event::Decl(e) => {
                    self.flush_text(&mut text, &mut stack, &mut top);
                    let raw = std::str::from_utf8(e.as_ref())
                        .map_err(|e| Error::Parse(e.to_string()))?;
                    let body = raw.strip_prefix("xml").unwrap_or(raw).trim_start();
                    append(
                        &mut stack,
                        &mut top,
                        XmlNode::ProcessingInstruction(XmlProcessingInstruction::new("xml", body)),
                    );
                }
                Event::PI(e) => {
                    self.flush_text(&mut text, &mut stack, &mut top);
                    let name = std::str::from_utf8(e.target())
                        .map_err(|e| Error::Parse(e.to_string()))?;
                    let body = std::str::from_utf8(e.content())
                        .map_err(|e| Error::Parse(e.to_string()))?;
                    append(
                        &mut stack,
                        &mut top,
                        XmlNode::ProcessingInstruction(XmlProcessingInstruction::new(
                            name,
                            body.trim_start(),
                        )),
                    );
                }
                Event::DocType(e) => {
                    self.flush_text(&mut text, &mut stack, &mut top);
                    let body = e.decode().map_err(|e| Error::Parse(e.to_string()))?;
                    let body = if body.starts_with(char::is_whitespace) {
                        body.into_owned()
                    } else {
                        format!(" {}", body)
                    };
                    append(&mut stack, &mut top, XmlNode::Doctype(body));
                }
                Event::Eof => break,
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::Parse(format!("unclosed element <{}>", open.name())));
        }

        let document = XmlDocument::from_children(top);
        if !document.has_root_element() {
            return Err(Error::Parse("document has no root element".to_string()));
        }
        Ok(document)
    }

    /// Parses XML from a file.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<XmlDocument> {
        let xml = fs::read_to_string(path)?;
        self.parse_str(&xml)
    }

    /// Attaches accumulated character data to the current parent.
    ///
    /// Whitespace-only runs are dropped unless the parent is a text element.
    fn flush_text(
        &self,
        text: &mut Option<String>,
        stack: &mut Vec<XmlElement>,
        top: &mut Vec<XmlNode>,
    ) {
        let Some(content) = text.take() else {
            return;
        };
        if content.is_empty() {
            return;
        }
        let keep = self.keep_whitespace
            || !content.trim().is_empty()
            || stack.last().is_some_and(|parent| is_text_element(parent.name()));
        if keep {
            append(stack, top, XmlNode::Text(content));
        }
    }
}

fn append(stack: &mut [XmlElement], top: &mut Vec<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.push_child(node),
        None => top.push(node),
    }
}

/// Parses an element's name and attributes.
fn parse_element(e: &BytesStart) -> Result<XmlElement> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|e| Error::Parse(e.to_string()))?
        .to_string();

    let mut element = XmlElement::new(name);
    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| Error::Parse(format!("Attribute error: {}", e)))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();
        element.attributes_mut().push(XmlAttribute {
            name: key,
            value: Some(value),
        });
    }

    Ok(element)
}

/// Parses XML from a string using the default parser.
pub fn parse_str(xml: &str) -> Result<XmlDocument> {
    XmlParser::new().parse_str(xml)
}

/// Parses XML from a file using the default parser.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<XmlDocument> {
    XmlParser::new().parse_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::print_to_string;

    fn root(document: &XmlDocument) -> &XmlElement {
        document
            .children()
            .iter()
            .find_map(XmlNode::as_element)
            .unwrap()
    }

    #[test]
    fn test_parse_simple_xml() {
        let document = parse_str(r#"<svg><rect/></svg>"#).unwrap();
        let svg = root(&document);
        assert_eq!(svg.name(), "svg");
        assert_eq!(svg.children().len(), 1);
        assert!(svg.children()[0].is_element_named("rect"));
    }

    #[test]
    fn test_attribute_order_preserved() {
        let document = parse_str(r#"<svg z="1" a="2" m="3"/>"#).unwrap();
        let names: Vec<&str> = root(&document)
            .attributes()
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_entities_are_resolved() {
        let document = parse_str(r#"<svg id="a&amp;b"><desc>1 &lt; 2 &#65;</desc></svg>"#).unwrap();
        let svg = root(&document);
        assert_eq!(svg.attr_value("id"), Some("a&b"));
        let desc = svg.children()[0].as_element().unwrap();
        assert_eq!(desc.children()[0].as_text(), Some("1 < 2 A"));
    }

    #[test]
    fn test_whitespace_text_dropped_outside_text_elements() {
        let document = parse_str("<svg>\n  <g>\n    <rect/>\n  </g>\n</svg>").unwrap();
        let svg = root(&document);
        assert_eq!(svg.children().len(), 1);
        let g = svg.children()[0].as_element().unwrap();
        assert_eq!(g.children().len(), 1);
    }

    #[test]
    fn test_whitespace_text_kept_inside_text_elements() {
        let document = parse_str("<svg><text><tspan>a</tspan> <tspan>b</tspan></text></svg>")
            .unwrap();
        let text = root(&document).children()[0].as_element().unwrap();
        assert_eq!(text.children().len(), 3);
        assert_eq!(text.children()[1].as_text(), Some(" "));
    }

    #[test]
    fn test_prolog_is_preserved() {
        let xml = concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "svg11.dtd">"#,
            "<!-- made by hand -->",
            "<svg/>"
        );
        let document = parse_str(xml).unwrap();
        let children = document.children();
        assert_eq!(children.len(), 4);
        match &children[0] {
            XmlNode::ProcessingInstruction(pi) => {
                assert_eq!(pi.name, "xml");
                assert_eq!(pi.body, r#"version="1.0" encoding="UTF-8""#);
            }
            other => panic!("Expected processing instruction, got {:?}", other),
        }
        assert!(matches!(&children[1], XmlNode::Doctype(body) if body.starts_with(" svg PUBLIC")));
        assert_eq!(children[2], XmlNode::comment("made by hand"));
        assert_eq!(
            print_to_string(&document),
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                r#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "svg11.dtd">"#,
                "<!--made by hand-->",
                "<svg/>"
            )
        );
    }

    #[test]
    fn test_cdata_kept_verbatim() {
        let document = parse_str("<svg><style><![CDATA[a > b]]></style></svg>").unwrap();
        let style = root(&document).children()[0].as_element().unwrap();
        assert_eq!(style.children()[0], XmlNode::CData("a > b".to_string()));
    }

    #[test]
    fn test_mismatched_tags_are_rejected() {
        assert!(matches!(parse_str("<svg><g></svg>"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_unclosed_root_is_rejected() {
        assert!(matches!(parse_str("<svg><g/>"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_missing_root_is_rejected() {
        assert!(matches!(parse_str(""), Err(Error::Parse(_))));
        assert!(matches!(parse_str("just text"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_unknown_entity_is_rejected() {
        assert!(matches!(
            parse_str("<svg><desc>&nbsp;</desc></svg>"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_keep_whitespace_retains_indentation_text() {
        let xml = "<svg>\n  <rect/>\n</svg>";
        let document = XmlParser::new().keep_whitespace(true).parse_str(xml).unwrap();
        let svg = root(&document);
        assert_eq!(svg.children().len(), 3);
        assert_eq!(svg.children()[0].as_text(), Some("\n  "));
        assert_eq!(print_to_string(&document), xml);
    }
}
