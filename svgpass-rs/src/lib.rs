//! svgpass - SVG serialization and multipass optimization
//!
//! This library turns SVG document trees back into text and drives a
//! transform-then-print cycle until the output stops changing, inside a
//! worker that the host reaches only through messages.
//!
//! # Overview
//!
//! - [`xml`] parses text into an [`XmlDocument`] and prints it back, with
//!   configurable delimiters, entity escaping, indentation and short tags.
//! - [`dimensions`] reads the width and height of the root `svg` element.
//! - [`pipeline`] holds the ordered optimization plugins.
//! - [`multipass`] applies the pipeline repeatedly until two consecutive
//!   outputs have the same length.
//! - [`worker`] answers `load`, `process` and `nextPass` requests on a
//!   dedicated thread.
//!
//! # Example
//!
//! ```
//! use svgpass::{OptimizationSettings, Pipeline, Request, spawn_worker, WorkerConfig};
//!
//! let worker = spawn_worker(Pipeline::new(), WorkerConfig::default())?;
//! worker.call(Request::load(1, r#"<svg viewBox="0 0 10 10"><rect/></svg>"#))?;
//! let first = worker.call(Request::process(2, OptimizationSettings::default()))?;
//! assert!(first.error.is_none());
//! worker.shutdown()?;
//! # Ok::<(), svgpass::Error>(())
//! ```

pub mod constants;
pub mod dimensions;
pub mod error;
pub mod multipass;
pub mod node;
pub mod pipeline;
pub mod worker;
pub mod xml;

pub use dimensions::{extract_dimensions, Dimensions};
pub use error::{Error, Result};
pub use multipass::{Multipass, OptimizationSettings, PassResult};
pub use node::{XmlAttribute, XmlDocument, XmlElement, XmlNode, XmlProcessingInstruction};
pub use pipeline::{Pipeline, Plugin, PluginKind, PluginParams};
pub use worker::{
    decode_request, encode_response, spawn_worker, Action, Dispatcher, Request, Response,
    WorkerConfig, WorkerHandle, WorkerState,
};
pub use xml::{
    parse_file, parse_str, print_document, print_to_string, print_to_string_pretty, Escapes,
    Printed, PrinterConfig, XmlParser, XmlPrinter,
};
