//! XML printer that turns document trees back into text.
//!
//! Every piece of markup comes from a `PrinterConfig` delimiter pair, so the
//! same walk produces compact output, pretty-printed output or a custom
//! dialect. Elements in `TEXT_ELEMENTS` switch the printer into a text
//! context where no indentation or line breaks are inserted.

use bitflags::bitflags;

use crate::constants::{
    self, is_text_element, ATTR_END, ATTR_START, CDATA_END, CDATA_START, COMMENT_END,
    COMMENT_START, DEFAULT_INDENT, DOCTYPE_END, DOCTYPE_START, EOL, PROC_INST_END,
    PROC_INST_START, TAG_CLOSE_END, TAG_CLOSE_START, TAG_OPEN_END, TAG_OPEN_START, TAG_SHORT_END,
    TAG_SHORT_START, TEXT_END, TEXT_START,
};
use crate::node::{XmlAttribute, XmlDocument, XmlElement, XmlNode};

bitflags! {
    /// Characters replaced by entity references when printing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Escapes: u8 {
        const AMP = 1;
        const APOS = 1 << 1;
        const QUOT = 1 << 2;
        const LT = 1 << 3;
        const GT = 1 << 4;
        /// Rule-set for text content.
        const TEXT = Self::AMP.bits()
            | Self::APOS.bits()
            | Self::QUOT.bits()
            | Self::LT.bits()
            | Self::GT.bits();
        /// Rule-set for attribute values.
        const ATTR = Self::AMP.bits() | Self::QUOT.bits() | Self::LT.bits() | Self::GT.bits();
    }
}

impl Escapes {
    /// Appends `text` to `out`, replacing the characters in this set.
    pub fn push_escaped(self, out: &mut String, text: &str) {
        for c in text.chars() {
            let entity = match c {
                '&' if self.contains(Escapes::AMP) => "&amp;",
                '\'' if self.contains(Escapes::APOS) => "&apos;",
                '"' if self.contains(Escapes::QUOT) => "&quot;",
                '<' if self.contains(Escapes::LT) => "&lt;",
                '>' if self.contains(Escapes::GT) => "&gt;",
                _ => {
                    out.push(c);
                    continue;
                }
            };
            out.push_str(entity);
        }
    }

    /// Returns `text` with the characters in this set escaped.
    pub fn escape(self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        self.push_escaped(&mut out, text);
        out
    }
}

/// A start/end markup pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    pub start: String,
    pub end: String,
}

impl Delimiters {
    pub fn new(start: &str, end: &str) -> Self {
        Delimiters {
            start: start.to_string(),
            end: end.to_string(),
        }
    }
}

/// Options for XML printing.
#[derive(Debug, Clone, PartialEq)]
pub struct PrinterConfig {
    pub doctype: Delimiters,
    pub proc_inst: Delimiters,
    pub tag_open: Delimiters,
    pub tag_close: Delimiters,
    pub tag_short: Delimiters,
    pub attr: Delimiters,
    pub comment: Delimiters,
    pub cdata: Delimiters,
    pub text: Delimiters,
    /// Literal string repeated once per nesting level.
    pub indent: String,
    /// Whether to pretty-print with indentation and line breaks.
    pub pretty: bool,
    pub text_escapes: Escapes,
    pub attr_escapes: Escapes,
    /// Print childless elements as `<name/>` instead of `<name></name>`.
    pub use_short_tags: bool,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        PrinterConfig {
            doctype: Delimiters::new(DOCTYPE_START, DOCTYPE_END),
            proc_inst: Delimiters::new(PROC_INST_START, PROC_INST_END),
            tag_open: Delimiters::new(TAG_OPEN_START, TAG_OPEN_END),
            tag_close: Delimiters::new(TAG_CLOSE_START, TAG_CLOSE_END),
            tag_short: Delimiters::new(TAG_SHORT_START, TAG_SHORT_END),
            attr: Delimiters::new(ATTR_START, ATTR_END),
            comment: Delimiters::new(COMMENT_START, COMMENT_END),
            cdata: Delimiters::new(CDATA_START, CDATA_END),
            text: Delimiters::new(TEXT_START, TEXT_END),
            indent: DEFAULT_INDENT.to_string(),
            pretty: false,
            text_escapes: Escapes::TEXT,
            attr_escapes: Escapes::ATTR,
            use_short_tags: true,
        }
    }
}

impl PrinterConfig {
    /// Default configuration with pretty printing switched on or off.
    pub fn pretty(pretty: bool) -> Self {
        PrinterConfig {
            pretty,
            ..Self::default()
        }
    }

    /// Sets the indent unit to `width` spaces.
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent = " ".repeat(width);
        self
    }

    /// Sets the indent unit to a literal string.
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    pub fn with_short_tags(mut self, use_short_tags: bool) -> Self {
        self.use_short_tags = use_short_tags;
        self
    }

    /// Appends a line break to every closing delimiter. Applied once, when
    /// a printer is built.
    fn augment_for_pretty(&mut self) {
        for delimiters in [
            &mut self.doctype,
            &mut self.proc_inst,
            &mut self.comment,
            &mut self.cdata,
            &mut self.tag_short,
            &mut self.tag_open,
            &mut self.tag_close,
            &mut self.text,
        ] {
            delimiters.end.push_str(EOL);
        }
    }
}

/// `width`/`height` attribute values found on the first sized `svg` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDimensions {
    pub width: String,
    pub height: String,
}

/// Output of one printing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Printed {
    pub data: String,
    pub dimensions: Option<RawDimensions>,
}

/// XML printer that outputs document trees.
pub struct XmlPrinter {
    config: PrinterConfig,
    out: String,
    indent_level: usize,
    /// Set while inside a whitespace-preserving element.
    in_text_context: bool,
    dimensions: Option<RawDimensions>,
}

impl XmlPrinter {
    /// Creates a new XML printer with the given options.
    pub fn new(mut config: PrinterConfig) -> Self {
        if config.pretty {
            config.augment_for_pretty();
        }
        XmlPrinter {
            config,
            out: String::new(),
            indent_level: 0,
            in_text_context: false,
            dimensions: None,
        }
    }

    /// Prints a document. The printer can be reused for further documents.
    pub fn print(&mut self, document: &XmlDocument) -> Printed {
        self.out.clear();
        self.indent_level = 0;
        self.in_text_context = false;
        self.dimensions = None;

        self.print_children(document.children());

        Printed {
            data: std::mem::take(&mut self.out),
            dimensions: self.dimensions.take(),
        }
    }

    fn print_children(&mut self, children: &[XmlNode]) {
        self.indent_level += 1;
        for child in children {
            self.print_node(child);
        }
        self.indent_level -= 1;
    }

    fn print_node(&mut self, node: &XmlNode) {
        match node {
            XmlNode::Element(element) => self.print_element(element),
            XmlNode::Text(text) => self.print_text(text),
            XmlNode::Doctype(body) => {
                self.out.push_str(&self.config.doctype.start);
                self.out.push_str(body);
                self.out.push_str(&self.config.doctype.end);
            }
            XmlNode::ProcessingInstruction(pi) => {
                self.out.push_str(&self.config.proc_inst.start);
                self.out.push_str(&pi.name);
                self.out.push(' ');
                self.out.push_str(&pi.body);
                self.out.push_str(&self.config.proc_inst.end);
            }
            XmlNode::Comment(body) => {
                self.out.push_str(&self.config.comment.start);
                self.out.push_str(body);
                self.out.push_str(&self.config.comment.end);
            }
            XmlNode::CData(body) => {
                self.push_indent();
                self.out.push_str(&self.config.cdata.start);
                self.out.push_str(body);
                self.out.push_str(&self.config.cdata.end);
            }
        }
    }

    fn print_element(&mut self, element: &XmlElement) {
        let name = element.name();
        if self.dimensions.is_none()
            && name == "svg"
            && element.has_attr("width")
            && element.has_attr("height")
        {
            self.dimensions = Some(RawDimensions {
                width: element.attr_value("width").unwrap_or_default().to_string(),
                height: element.attr_value("height").unwrap_or_default().to_string(),
            });
        }

        let tags = self.tag_delimiters();

        if element.is_empty() {
            self.push_indent();
            self.out.push_str(&tags.short_start);
            self.out.push_str(name);
            self.print_attributes(element.attributes());
            if self.config.use_short_tags {
                self.out.push_str(&tags.short_end);
            } else {
                self.out.push_str(&tags.open_end);
                self.out.push_str(&tags.close_start);
                self.out.push_str(name);
                self.out.push_str(&tags.close_end);
            }
            return;
        }

        self.push_indent();
        let entered_text_context = !self.in_text_context && is_text_element(name);

        self.out.push_str(&tags.open_start);
        self.out.push_str(name);
        self.print_attributes(element.attributes());
        self.out.push_str(&tags.open_end);

        if entered_text_context {
            if self.config.pretty {
                self.push_indent();
                self.out.push_str(&self.config.indent);
            }
            self.in_text_context = true;
        }

        self.print_children(element.children());

        if entered_text_context {
            self.in_text_context = false;
            if self.config.pretty {
                self.out.push_str(EOL);
            }
        }

        self.push_indent();
        self.out.push_str(&tags.close_start);
        self.out.push_str(name);
        self.out.push_str(&tags.close_end);
    }

    fn print_attributes(&mut self, attributes: &[XmlAttribute]) {
        for attr in attributes {
            self.out.push(' ');
            self.out.push_str(&attr.name);
            if let Some(value) = &attr.value {
                self.out.push_str(&self.config.attr.start);
                self.config.attr_escapes.push_escaped(&mut self.out, value);
                self.out.push_str(&self.config.attr.end);
            }
        }
    }

    fn print_text(&mut self, text: &str) {
        self.push_indent();
        self.out.push_str(&self.config.text.start);
        self.config.text_escapes.push_escaped(&mut self.out, text);
        if !self.in_text_context {
            self.out.push_str(&self.config.text.end);
        }
    }

    /// Tag delimiters for the current context. Inside a text context the
    /// plain markup is used so no line breaks leak into the content.
    fn tag_delimiters(&self) -> TagDelimiters {
        if self.in_text_context {
            TagDelimiters {
                open_start: TAG_OPEN_START.to_string(),
                open_end: TAG_OPEN_END.to_string(),
                close_start: TAG_CLOSE_START.to_string(),
                close_end: TAG_CLOSE_END.to_string(),
                short_start: TAG_SHORT_START.to_string(),
                short_end: TAG_SHORT_END.to_string(),
            }
        } else {
            TagDelimiters {
                open_start: self.config.tag_open.start.clone(),
                open_end: self.config.tag_open.end.clone(),
                close_start: self.config.tag_close.start.clone(),
                close_end: self.config.tag_close.end.clone(),
                short_start: self.config.tag_short.start.clone(),
                short_end: self.config.tag_short.end.clone(),
            }
        }
    }

    fn push_indent(&mut self) {
        if self.config.pretty && !self.in_text_context {
            for _ in 1..self.indent_level {
                self.out.push_str(&self.config.indent);
            }
        }
    }
}

struct TagDelimiters {
    open_start: String,
    open_end: String,
    close_start: String,
    close_end: String,
    short_start: String,
    short_end: String,
}

/// Prints a document with the given configuration.
pub fn print_document(document: &XmlDocument, config: PrinterConfig) -> Printed {
    XmlPrinter::new(config).print(document)
}

/// Prints a document to a string using the default configuration.
pub fn print_to_string(document: &XmlDocument) -> String {
    print_document(document, PrinterConfig::default()).data
}

/// Prints a document to a string with pretty printing and the pass indent.
pub fn print_to_string_pretty(document: &XmlDocument) -> String {
    let config = PrinterConfig::pretty(true).with_indent(constants::PASS_INDENT);
    print_document(document, config).data
}
