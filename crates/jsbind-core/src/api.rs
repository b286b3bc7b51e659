//! Request dispatch: request in, response envelope out.
//!
//! Two contracts share these functions:
//!
//! - [`transform_json`] / [`build_json`] never fail. Malformed JSON becomes a
//!   response with one `Failed to parse request JSON: ...` error. Used by the
//!   FFI, Python and wasm-bindgen entrypoints.
//! - [`handle_request`] routes on `command` for the process entrypoint and
//!   returns `Err` only when the input is not a JSON request object, because
//!   a process can report that through its exit status.

use serde::de::Error as _;
use serde::Deserialize;

use crate::engine::{Engine, TransformInput};
use crate::error::{BindError, Result};
use crate::request::{BuildRequest, Envelope, TransformRequest};
use crate::response::Response;

/// Transform one source text. Code is cleared if the engine reports errors.
pub fn transform(engine: &dyn Engine, request: &TransformRequest) -> Response {
    let input = TransformInput {
        source: &request.input,
        loader: request.options.loader(),
        sourcefile: request.options.sourcefile.as_deref(),
    };
    let output = engine.transform(&input);
    tracing::debug!(
        engine = engine.name(),
        loader = %input.loader,
        errors = output.errors.len(),
        warnings = output.warnings.len(),
        "transform"
    );
    Response::from_output(output)
}

/// Bundle entry points to disk. The response never carries code.
pub fn build(engine: &dyn Engine, request: &BuildRequest) -> Response {
    let mut output = engine.build(&request.options);
    output.code.clear();
    tracing::debug!(
        engine = engine.name(),
        entries = request.options.entry_points.len(),
        outfile = %request.options.outfile,
        errors = output.errors.len(),
        "build"
    );
    Response::from_output(output)
}

/// Parse a transform request and run it. Never fails.
pub fn transform_json(engine: &dyn Engine, request: &str) -> Response {
    match serde_json::from_str::<TransformRequest>(request) {
        Ok(request) => transform(engine, &request),
        Err(e) => BindError::RequestJson(e).into(),
    }
}

/// Parse a build request and run it. Never fails.
pub fn build_json(engine: &dyn Engine, request: &str) -> Response {
    match serde_json::from_str::<BuildRequest>(request) {
        Ok(request) => build(engine, &request),
        Err(e) => BindError::RequestJson(e).into(),
    }
}

/// Route a raw request on its `command` field.
///
/// `Err` only for input that is not a JSON object with a usable `command`
/// field. An unknown command, or a known command whose fields do not fit,
/// is a handled outcome and comes back as an error response.
pub fn handle_request(engine: &dyn Engine, raw: &[u8]) -> Result<Response> {
    let value: serde_json::Value = serde_json::from_slice(raw).map_err(BindError::RequestJson)?;
    // Serde's derived visitors also accept arrays; a request must be an object.
    if !value.is_object() {
        return Err(BindError::RequestJson(serde_json::Error::custom(
            "request must be a JSON object",
        )));
    }
    let envelope = Envelope::deserialize(&value).map_err(BindError::RequestJson)?;

    tracing::debug!(command = %envelope.command, "dispatching request");
    let response = match envelope.command.as_str() {
        "transform" => match serde_json::from_value::<TransformRequest>(value) {
            Ok(request) => transform(engine, &request),
            Err(e) => BindError::RequestJson(e).into(),
        },
        "build" => match serde_json::from_value::<BuildRequest>(value) {
            Ok(request) => build(engine, &request),
            Err(e) => BindError::RequestJson(e).into(),
        },
        other => Response::failure(format!("Unknown command: '{other}'")),
    };
    Ok(response)
}
