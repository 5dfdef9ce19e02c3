//! Constants used throughout svgpass.
//!
//! Delimiter defaults match the conventional SVG/XML markup and are the
//! starting point for every `PrinterConfig`.

/// Line break appended to closing delimiters in pretty mode.
pub const EOL: &str = "\n";

pub const DOCTYPE_START: &str = "<!DOCTYPE";
pub const DOCTYPE_END: &str = ">";
pub const PROC_INST_START: &str = "<?";
pub const PROC_INST_END: &str = "?>";
pub const TAG_OPEN_START: &str = "<";
pub const TAG_OPEN_END: &str = ">";
pub const TAG_CLOSE_START: &str = "</";
pub const TAG_CLOSE_END: &str = ">";
pub const TAG_SHORT_START: &str = "<";
pub const TAG_SHORT_END: &str = "/>";
pub const ATTR_START: &str = "=\"";
pub const ATTR_END: &str = "\"";
pub const COMMENT_START: &str = "<!--";
pub const COMMENT_END: &str = "-->";
pub const CDATA_START: &str = "<![CDATA[";
pub const CDATA_END: &str = "]]>";
pub const TEXT_START: &str = "";
pub const TEXT_END: &str = "";

/// Default indent unit: four spaces.
pub const DEFAULT_INDENT: &str = "    ";

/// Indent unit used when serializing optimization passes.
pub const PASS_INDENT: &str = "  ";

/// Default float precision handed to precision-aware plugins.
pub const DEFAULT_FLOAT_PRECISION: u32 = 3;

/// Elements whose descendants are printed without indentation or inserted
/// line breaks.
pub const TEXT_ELEMENTS: &[&str] = &[
    "altGlyph",
    "altGlyphDef",
    "altGlyphItem",
    "glyph",
    "glyphRef",
    "textPath",
    "text",
    "title",
    "tref",
    "tspan",
];

/// Number of requests that may queue in front of the worker.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Name given to the worker thread.
pub const WORKER_THREAD_NAME: &str = "svgpass-worker";

/// Returns true if `name` is one of the whitespace-preserving elements.
pub fn is_text_element(name: &str) -> bool {
    TEXT_ELEMENTS.contains(&name)
}
