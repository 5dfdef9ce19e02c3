//! Request dispatch.
//!
//! The dispatcher owns the worker state and the pipeline. Each request is
//! routed to one action handler; whatever the handler returns, including a
//! panic, is turned into a response carrying the request's id.

use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use tracing::{debug, info, warn};

use super::messages::{Action, Request, Response};
use crate::dimensions::{extract_dimensions, Dimensions};
use crate::error::{Error, Result};
use crate::multipass::{Multipass, OptimizationSettings, PassResult};
use crate::node::XmlDocument;
use crate::pipeline::Pipeline;
use crate::xml::XmlParser;

/// Per-worker state handed to every action handler.
#[derive(Debug, Default)]
pub struct WorkerState {
    /// Last successfully loaded document.
    pub document: Option<XmlDocument>,
    /// Session started by the last `process` request.
    pub session: Option<Multipass>,
}

/// Parses `data` and stores it as the current document.
///
/// A failed parse leaves the previously loaded document in place.
pub fn load(state: &mut WorkerState, data: &str) -> Result<Dimensions> {
    let document = XmlParser::new().parse_str(data)?;
    let dimensions = extract_dimensions(&document).unwrap_or_default();
    info!(
        bytes = data.len(),
        width = ?dimensions.width,
        height = ?dimensions.height,
        "document loaded"
    );
    state.document = Some(document);
    Ok(dimensions)
}

/// Starts a new session over the loaded document and runs its first pass.
///
/// Any previous session is discarded first, so a failure here leaves no
/// session behind.
pub fn process(
    state: &mut WorkerState,
    pipeline: &mut Pipeline,
    settings: &OptimizationSettings,
) -> Result<Option<PassResult>> {
    state.session = None;
    let document = state
        .document
        .as_ref()
        .ok_or_else(|| Error::SessionState("no document loaded".to_string()))?;

    pipeline.configure(&settings.plugins)?;
    info!(
        plugins = ?pipeline.active_names(),
        float_precision = settings.float_precision,
        pretty = settings.pretty,
        "starting optimization"
    );

    let mut session = Multipass::new(document, settings);
    let result = session.advance(pipeline)?;
    state.session = Some(session);
    Ok(result)
}

/// Runs the next pass of the current session.
///
/// Returns `Ok(None)` when the session converges. A session whose pass
/// failed is dropped.
pub fn next_pass(state: &mut WorkerState, pipeline: &Pipeline) -> Result<Option<PassResult>> {
    let session = match state.session.as_mut() {
        Some(session) if !session.is_completed() => session,
        Some(_) => {
            return Err(Error::SessionState(
                "optimization session already completed".to_string(),
            ))
        }
        None => return Err(Error::SessionState("no active session".to_string())),
    };

    match session.advance(pipeline) {
        Ok(result) => Ok(result),
        Err(e) => {
            state.session = None;
            Err(e)
        }
    }
}

/// Routes requests to action handlers and shapes their responses.
#[derive(Debug)]
pub struct Dispatcher {
    pipeline: Pipeline,
    state: WorkerState,
}

impl Dispatcher {
    /// Creates a dispatcher with nothing loaded.
    pub fn new(pipeline: Pipeline) -> Self {
        Dispatcher {
            pipeline,
            state: WorkerState::default(),
        }
    }

    pub fn state(&self) -> &WorkerState {
        &self.state
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Handles one request. Never fails: errors and panics become error
    /// responses, and the dispatcher stays usable afterwards.
    pub fn handle(&mut self, request: Request) -> Response {
        let id = request.id.clone();
        debug!(id = %id, action = %request.action, "handling request");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(request)))
            .unwrap_or_else(|payload| {
                // The session may be half-way through a pass.
                self.state.session = None;
                Err(Error::WorkerPanic(panic_message(payload.as_ref())))
            });

        match outcome {
            Ok(result) => Response::success(id, result),
            Err(e) => {
                warn!(id = %id, error = %e, "request failed");
                Response::failure(id, &e)
            }
        }
    }

    fn dispatch(&mut self, request: Request) -> Result<Value> {
        let action: Action = request.action.parse()?;
        match action {
            Action::Load => {
                let data = request.data.ok_or(Error::MissingField {
                    action: "load",
                    field: "data",
                })?;
                let dimensions = load(&mut self.state, &data)?;
                Ok(serde_json::to_value(dimensions)?)
            }
            Action::Process => {
                let settings = request.settings.ok_or(Error::MissingField {
                    action: "process",
                    field: "settings",
                })?;
                let result = process(&mut self.state, &mut self.pipeline, &settings)?;
                pass_value(result)
            }
            Action::NextPass => {
                let result = next_pass(&mut self.state, &self.pipeline)?;
                pass_value(result)
            }
        }
    }
}

fn pass_value(result: Option<PassResult>) -> Result<Value> {
    match result {
        Some(result) => Ok(serde_json::to_value(result)?),
        None => Ok(Value::Null),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
