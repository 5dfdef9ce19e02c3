//! XML parsing and output.
//!
//! The parser turns text into an `XmlDocument`; the printer turns a document
//! back into text under a configurable `PrinterConfig`.

mod parser;
mod printer;

pub use parser::{parse_file, parse_str, XmlParser};
pub use printer::{
    print_document, print_to_string, print_to_string_pretty, Delimiters, Escapes, Printed,
    PrinterConfig, RawDimensions, XmlPrinter,
};
