//! # jsbind-python
//!
//! Python bindings for jsbind, built with PyO3. This is the native-library
//! path for Python hosts: no ctypes, no manual freeing.
//!
//! Exposes the following functions as the `_native` module:
//!
//! - `transform(code, loader="jsx", sourcefile=None)` -- transformed code
//! - `build(entry_points, outfile)` -- response JSON (errors/warnings)
//! - `transform_json(request)` / `build_json(request)` -- raw wire contract
//!
//! The engine is chosen per call from `JSBIND_ENGINE` / `JSBIND_ESBUILD`.
//! Work runs with the GIL released, so Python threads can transform in
//! parallel.

use jsbind_core::{
    api, BuildOptions, BuildRequest, Config, Response, TransformOptions, TransformRequest,
};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

fn error_texts(response: &Response) -> String {
    response
        .errors
        .iter()
        .map(|m| m.text.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Transform source code and return the result.
///
/// Args:
///     code: The source text (TypeScript, JSX, JSON, ...).
///     loader: How to interpret `code`. Unknown loaders are treated as "js".
///     sourcefile: Optional name for the input in error messages.
///
/// Returns:
///     The transformed code.
///
/// Raises:
///     RuntimeError: If the engine reports any errors.
#[pyfunction]
#[pyo3(signature = (code, loader="jsx", sourcefile=None))]
fn transform(
    py: Python<'_>,
    code: &str,
    loader: &str,
    sourcefile: Option<String>,
) -> PyResult<String> {
    let request = TransformRequest {
        input: code.to_string(),
        options: TransformOptions {
            loader: loader.to_string(),
            sourcefile,
        },
    };
    let response = py.allow_threads(|| {
        let engine = Config::from_env_or_default().engine();
        api::transform(engine.as_ref(), &request)
    });
    if !response.is_success() {
        return Err(PyRuntimeError::new_err(format!(
            "esbuild transformation failed: {}",
            error_texts(&response)
        )));
    }
    Ok(response.code)
}

/// Bundle one or more entry points into `outfile`.
///
/// Args:
///     entry_points: Paths of the entry modules.
///     outfile: Where to write the bundle.
///
/// Returns:
///     A JSON string `{"code": "", "errors": [], "warnings": [...]}`.
///
/// Raises:
///     RuntimeError: If the build reports any errors.
#[pyfunction]
fn build(py: Python<'_>, entry_points: Vec<String>, outfile: String) -> PyResult<String> {
    let request = BuildRequest {
        options: BuildOptions {
            entry_points,
            outfile,
        },
    };
    let response = py.allow_threads(|| {
        let engine = Config::from_env_or_default().engine();
        api::build(engine.as_ref(), &request)
    });
    if !response.is_success() {
        return Err(PyRuntimeError::new_err(format!(
            "esbuild build failed: {}",
            error_texts(&response)
        )));
    }
    response
        .to_json()
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Run a raw transform request and return the raw response JSON.
///
/// Never raises for engine errors; inspect the `errors` array instead.
#[pyfunction]
fn transform_json(py: Python<'_>, request: &str) -> String {
    py.allow_threads(|| {
        let engine = Config::from_env_or_default().engine();
        api::transform_json(engine.as_ref(), request).to_json_lossy()
    })
}

/// Run a raw build request and return the raw response JSON.
#[pyfunction]
fn build_json(py: Python<'_>, request: &str) -> String {
    py.allow_threads(|| {
        let engine = Config::from_env_or_default().engine();
        api::build_json(engine.as_ref(), request).to_json_lossy()
    })
}

/// The native extension module, imported as `jsbind._native`.
#[pymodule]
fn _native(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(transform, m)?)?;
    m.add_function(wrap_pyfunction!(build, m)?)?;
    m.add_function(wrap_pyfunction!(transform_json, m)?)?;
    m.add_function(wrap_pyfunction!(build_json, m)?)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
