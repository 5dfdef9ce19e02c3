//! End-to-end tests of the worker protocol: JSON requests in, JSON
//! responses out, through a real worker thread.

use serde_json::{json, Value};
use svgpass::{
    decode_request, encode_response, spawn_worker, Error, OptimizationSettings, Pipeline, Plugin,
    PluginKind, PluginParams, Request, Response, WorkerConfig, WorkerHandle, XmlNode,
};

/// Strips `id` attributes.
struct RemoveIds;

impl Plugin for RemoveIds {
    fn name(&self) -> &str {
        "cleanupIDs"
    }

    fn kind(&self) -> PluginKind {
        PluginKind::PerItem
    }

    fn visit(&self, node: &mut XmlNode, _params: &PluginParams) -> svgpass::Result<bool> {
        if let Some(element) = node.as_element_mut() {
            element.remove_attr("id");
        }
        Ok(true)
    }
}

/// Rejects documents containing a `script` element.
struct ForbidScripts;

impl Plugin for ForbidScripts {
    fn name(&self) -> &str {
        "forbidScripts"
    }

    fn kind(&self) -> PluginKind {
        PluginKind::PerItem
    }

    fn visit(&self, node: &mut XmlNode, _params: &PluginParams) -> svgpass::Result<bool> {
        if node.is_element_named("script") {
            return Err(Error::transform("forbidScripts", "script elements are not allowed"));
        }
        Ok(true)
    }
}

fn worker() -> WorkerHandle {
    let pipeline = Pipeline::new()
        .with_plugin(RemoveIds)
        .with_plugin(ForbidScripts);
    spawn_worker(pipeline, WorkerConfig::default()).unwrap()
}

/// Sends one JSON line and returns the JSON reply.
fn exchange(worker: &WorkerHandle, line: &str) -> Value {
    let response = match decode_request(line) {
        Ok(request) => worker.call(request).unwrap(),
        Err(e) => Response::failure(Value::Null, &e),
    };
    serde_json::from_str(&encode_response(&response).unwrap()).unwrap()
}

#[test]
fn test_load_process_next_pass_cycle() {
    let worker = worker();

    let loaded = exchange(
        &worker,
        r#"{"id": 1, "action": "load", "data": "<svg viewBox=\"0 0 100 50\"><rect id=\"r\" width=\"10\" height=\"10\"/></svg>"}"#,
    );
    assert_eq!(loaded, json!({"id": 1, "result": {"width": 100.0, "height": 50.0}}));

    let first = exchange(
        &worker,
        r#"{"id": 2, "action": "process", "settings": {"plugins": {}, "floatPrecision": 3, "pretty": false}}"#,
    );
    assert_eq!(
        first,
        json!({
            "id": 2,
            "result": {
                "data": "<svg viewBox=\"0 0 100 50\"><rect width=\"10\" height=\"10\"/></svg>",
                "dimensions": {"width": 100.0, "height": 50.0}
            }
        })
    );

    let second = exchange(&worker, r#"{"id": 3, "action": "nextPass"}"#);
    assert_eq!(second["result"], first["result"]);

    let done = exchange(&worker, r#"{"id": 4, "action": "nextPass"}"#);
    assert_eq!(done, json!({"id": 4, "result": null}));

    let exhausted = exchange(&worker, r#"{"id": 5, "action": "nextPass"}"#);
    assert!(exhausted["error"].is_string());
    assert!(exhausted.get("result").is_none());

    worker.shutdown().unwrap();
}

#[test]
fn test_pretty_output_over_the_wire() {
    let worker = worker();
    worker
        .call(Request::load(
            "doc",
            "<svg width=\"20\" height=\"10\"><g><text>Hi <tspan>there</tspan></text></g></svg>",
        ))
        .unwrap();

    let settings = OptimizationSettings {
        pretty: true,
        ..OptimizationSettings::default()
    };
    let response = worker.call(Request::process("run", settings)).unwrap();
    let result = response.result.unwrap();
    assert_eq!(
        result["data"],
        json!(concat!(
            "<svg width=\"20\" height=\"10\">\n",
            "  <g>\n",
            "    <text>\n",
            "      Hi <tspan>there</tspan>\n",
            "    </text>\n",
            "  </g>\n",
            "</svg>\n"
        ))
    );
    assert_eq!(result["dimensions"], json!({"width": 20.0, "height": 10.0}));
    worker.shutdown().unwrap();
}

#[test]
fn test_unknown_action_leaves_worker_usable() {
    let worker = worker();

    let response = exchange(&worker, r#"{"id": "x", "action": "optimize"}"#);
    assert_eq!(response, json!({"id": "x", "error": "unknown action: optimize"}));

    let response = exchange(
        &worker,
        r#"{"id": "y", "action": "load", "data": "<svg width=\"1\" height=\"2\"/>"}"#,
    );
    assert_eq!(response, json!({"id": "y", "result": {"width": 1.0, "height": 2.0}}));
    worker.shutdown().unwrap();
}

#[test]
fn test_malformed_json_gets_null_id_error() {
    let worker = worker();
    let response = exchange(&worker, "{\"id\": 1, \"action\":");
    assert_eq!(response["id"], Value::Null);
    assert!(response["error"].as_str().unwrap().starts_with("JSON error"));
    worker.shutdown().unwrap();
}

#[test]
fn test_parse_error_and_retry() {
    let worker = worker();

    let response = worker.call(Request::load(1, "<svg><path></svg>")).unwrap();
    assert!(response.error.unwrap().starts_with("XML parse error"));

    let response = worker
        .call(Request::process(2, OptimizationSettings::default()))
        .unwrap();
    assert_eq!(response.error.as_deref(), Some("no document loaded"));

    let response = worker.call(Request::load(3, "<svg><path/></svg>")).unwrap();
    assert_eq!(response.result, Some(json!({})));
    worker.shutdown().unwrap();
}

#[test]
fn test_transform_error_propagates_unmodified() {
    let worker = worker();
    worker
        .call(Request::load(1, "<svg><script>alert(1)</script></svg>"))
        .unwrap();
    let response = worker
        .call(Request::process(2, OptimizationSettings::default()))
        .unwrap();
    assert_eq!(
        response.error.as_deref(),
        Some("plugin forbidScripts failed: script elements are not allowed")
    );

    let response = worker.call(Request::next_pass(3)).unwrap();
    assert_eq!(response.error.as_deref(), Some("no active session"));
    worker.shutdown().unwrap();
}

#[test]
fn test_disabling_a_plugin_through_settings() {
    let worker = worker();
    worker
        .call(Request::load(1, r#"<svg id="root"><script/></svg>"#))
        .unwrap();

    let settings: OptimizationSettings = serde_json::from_value(json!({
        "plugins": {"cleanupIDs": false, "forbidScripts": false}
    }))
    .unwrap();
    let response = worker.call(Request::process(2, settings)).unwrap();
    assert_eq!(
        response.result.unwrap()["data"],
        json!(r#"<svg id="root"><script/></svg>"#)
    );
    worker.shutdown().unwrap();
}
