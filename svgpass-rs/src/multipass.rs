//! Repeated transform-then-print passes until the output stops shrinking.
//!
//! A `Multipass` owns a working copy of the document. Each `advance` applies
//! the pipeline once and prints the result. The sequence ends when the last
//! two outputs have the same length, counted in UTF-16 code units; content
//! is not compared, so two different outputs of equal length also end it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{DEFAULT_FLOAT_PRECISION, PASS_INDENT};
use crate::dimensions::{extract_dimensions, Dimensions};
use crate::error::Result;
use crate::node::XmlDocument;
use crate::pipeline::{Pipeline, PluginParams};
use crate::xml::{PrinterConfig, XmlPrinter};

/// Settings for one optimization session, as sent by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimizationSettings {
    /// Plugin activation by name. Plugins not listed keep their state.
    pub plugins: BTreeMap<String, bool>,
    pub float_precision: u32,
    pub pretty: bool,
}

impl Default for OptimizationSettings {
    fn default() -> Self {
        OptimizationSettings {
            plugins: BTreeMap::new(),
            float_precision: DEFAULT_FLOAT_PRECISION,
            pretty: false,
        }
    }
}

/// Output of a single pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassResult {
    /// Serialized document.
    pub data: String,
    pub dimensions: Dimensions,
}

#[derive(Debug)]
enum State {
    Active {
        document: XmlDocument,
        /// Output length of the pass before the last one.
        previous_len: Option<usize>,
        /// Output length of the last pass.
        last_len: Option<usize>,
    },
    Completed,
}

/// One optimization session over a private copy of a document.
#[derive(Debug)]
pub struct Multipass {
    state: State,
    params: PluginParams,
    printer_config: PrinterConfig,
    passes: usize,
}

impl Multipass {
    /// Starts a session over a copy of `document`.
    pub fn new(document: &XmlDocument, settings: &OptimizationSettings) -> Self {
        Multipass {
            state: State::Active {
                document: document.clone(),
                previous_len: None,
                last_len: None,
            },
            params: PluginParams {
                float_precision: settings.float_precision,
            },
            printer_config: PrinterConfig::pretty(settings.pretty).with_indent(PASS_INDENT),
            passes: 0,
        }
    }

    /// Runs one pass. Returns `Ok(None)` once the output has converged;
    /// the session is then completed and must not be advanced again.
    pub fn advance(&mut self, pipeline: &Pipeline) -> Result<Option<PassResult>> {
        let State::Active {
            document,
            previous_len,
            last_len,
        } = &mut self.state
        else {
            return Ok(None);
        };

        if last_len.is_some() && last_len == previous_len {
            debug!(passes = self.passes, "output converged");
            self.state = State::Completed;
            return Ok(None);
        }

        pipeline.apply(document, &self.params)?;

        let printed = XmlPrinter::new(self.printer_config.clone()).print(document);
        let dimensions = match &printed.dimensions {
            Some(raw) => Dimensions::from(raw),
            None => extract_dimensions(document).unwrap_or_default(),
        };

        // Measured in UTF-16 code units, as hosts count string length.
        let len = printed.data.encode_utf16().count();
        *previous_len = *last_len;
        *last_len = Some(len);
        self.passes += 1;
        debug!(pass = self.passes, len, previous = ?previous_len, "pass complete");

        Ok(Some(PassResult {
            data: printed.data,
            dimensions,
        }))
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, State::Completed)
    }

    /// Number of results produced so far.
    pub fn passes(&self) -> usize {
        self.passes
    }
}
