//! ChocoPy interpreter as a WASM module for browser environments.
//!
//! Programs arrive as the front-end's JSON AST; results go back as JSON
//! strings.
//!
//! # Usage (JavaScript)
//!
//! ```js
//! import init, { run_trace, run_batch } from 'choco-wasm';
//!
//! await init();
//!
//! const trace = JSON.parse(run_trace(JSON.stringify(ast), "{}"));
//! // { snapshots: [...], completed: true, finalOutput: ["42"] }
//!
//! const events = JSON.parse(run_batch(JSON.stringify(ast), '["Ada"]', "{}"));
//! // [{ kind: "output", text: "42" }, { kind: "status", text: "finished" }]
//! ```

use choco_eval::{EventLog, Limits};
use choco_types::ast::Program;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Error payload for requests that could not be decoded.
#[derive(Debug, Serialize)]
struct RequestError {
    error: String,
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        format!(r#"{{"error":"Serialization error: {}"}}"#, e)
    })
}

fn request_error(what: &str, err: serde_json::Error) -> String {
    to_json(&RequestError {
        error: format!("invalid {what}: {err}"),
    })
}

/// Options are optional: an empty string means all defaults.
fn parse_limits(options_json: &str) -> serde_json::Result<Limits> {
    if options_json.trim().is_empty() {
        return Ok(Limits::default());
    }
    serde_json::from_str(options_json)
}

/// Run a program in trace mode.
///
/// `options_json` may set `maxSteps`, `maxSnapshots` and `maxCallDepth`.
/// Returns a JSON `Trace`:
/// ```json
/// { "snapshots": [...], "completed": true, "finalOutput": ["42"] }
/// ```
/// Programs that call `input()` come back with `completed: false` and no
/// snapshots.
#[wasm_bindgen]
pub fn run_trace(ast_json: &str, options_json: &str) -> String {
    let program = match Program::from_json(ast_json) {
        Ok(program) => program,
        Err(e) => return request_error("program", e),
    };
    let limits = match parse_limits(options_json) {
        Ok(limits) => limits,
        Err(e) => return request_error("options", e),
    };
    to_json(&choco_eval::run_trace(&program, limits))
}

/// Run a program in live mode with every input line supplied up front.
///
/// `inputs_json` is a JSON array of strings consumed by successive `input()`
/// calls. Returns the JSON array of events the run produced.
#[wasm_bindgen]
pub fn run_batch(ast_json: &str, inputs_json: &str, options_json: &str) -> String {
    let program = match Program::from_json(ast_json) {
        Ok(program) => program,
        Err(e) => return request_error("program", e),
    };
    let inputs: Vec<String> = if inputs_json.trim().is_empty() {
        Vec::new()
    } else {
        match serde_json::from_str(inputs_json) {
            Ok(inputs) => inputs,
            Err(e) => return request_error("inputs", e),
        }
    };
    let limits = match parse_limits(options_json) {
        Ok(limits) => limits,
        Err(e) => return request_error("options", e),
    };

    let mut log = EventLog::with_inputs(inputs);
    choco_eval::run_live(&program, &mut log, limits);
    to_json(&log.events)
}

/// Return the interpreter version string.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
