//! Request and response messages exchanged with the worker.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::multipass::OptimizationSettings;

/// Actions the worker understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Load,
    Process,
    NextPass,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Load => "load",
            Action::Process => "process",
            Action::NextPass => "nextPass",
        }
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "load" => Ok(Action::Load),
            "process" => Ok(Action::Process),
            "nextPass" => Ok(Action::NextPass),
            other => Err(Error::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request from the host. `id` is opaque and echoed in the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: Value,
    /// Kept as a string so unknown actions can still be answered.
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<OptimizationSettings>,
}

impl Request {
    pub fn load(id: impl Into<Value>, data: impl Into<String>) -> Self {
        Request {
            id: id.into(),
            action: Action::Load.as_str().to_string(),
            data: Some(data.into()),
            settings: None,
        }
    }

    pub fn process(id: impl Into<Value>, settings: OptimizationSettings) -> Self {
        Request {
            id: id.into(),
            action: Action::Process.as_str().to_string(),
            data: None,
            settings: Some(settings),
        }
    }

    pub fn next_pass(id: impl Into<Value>) -> Self {
        Request {
            id: id.into(),
            action: Action::NextPass.as_str().to_string(),
            data: None,
            settings: None,
        }
    }
}

/// The worker's answer to one request. Exactly one of `result` and `error`
/// is set; an exhausted session answers with a `null` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Response {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: &Error) -> Self {
        Response {
            id,
            result: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Decodes one JSON-encoded request.
pub fn decode_request(json: &str) -> Result<Request> {
    Ok(serde_json::from_str(json)?)
}

/// Encodes a response as a single line of JSON.
pub fn encode_response(response: &Response) -> Result<String> {
    Ok(serde_json::to_string(response)?)
}
