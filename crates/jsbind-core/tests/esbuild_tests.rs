//! End-to-end checks against a real esbuild executable.
//!
//! Each test returns early when no `esbuild` is on `PATH` (or at
//! `JSBIND_ESBUILD`), so the suite stays green on machines without it.

use jsbind_core::api::{build_json, transform_json};
use jsbind_core::{EsbuildEngine, Loader};

fn esbuild() -> Option<EsbuildEngine> {
    let explicit = std::env::var_os("JSBIND_ESBUILD").map(std::path::PathBuf::from);
    match EsbuildEngine::locate(explicit.as_deref()) {
        Ok(engine) => Some(engine),
        Err(e) => {
            eprintln!("skipping esbuild test: {e}");
            None
        }
    }
}

#[test]
fn every_loader_gets_a_response() {
    let Some(engine) = esbuild() else { return };
    for loader in Loader::ALL {
        let request = serde_json::json!({"input": "x", "options": {"loader": loader.as_str()}});
        let response = transform_json(&engine, &request.to_string());
        // Some loaders reject "x"; either way the envelope is well-formed.
        assert!(response.errors.is_empty() || response.code.is_empty());
    }
}

#[test]
fn ts_transform() {
    let Some(engine) = esbuild() else { return };
    let response = transform_json(
        &engine,
        r#"{"input":"let n: number = 1","options":{"loader":"ts"}}"#,
    );
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert!(response.code.contains("let n = 1"));
}

#[test]
fn syntax_error_has_location() {
    let Some(engine) = esbuild() else { return };
    let response = transform_json(&engine, r#"{"input":"function (;","options":{"loader":"js"}}"#);
    assert_eq!(response.code, "");
    assert!(!response.errors.is_empty());
    let location = response.errors[0].location.as_ref().expect("esbuild reports a location");
    assert_eq!(location.line, 1);
    assert_eq!(location.line_text, "function (;");
}

#[test]
fn bundle_resolves_imports() {
    let Some(engine) = esbuild() else { return };
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("dep.js"), "export const answer = 42;\n").unwrap();
    let entry = dir.path().join("main.js");
    std::fs::write(&entry, "import { answer } from './dep.js';\nconsole.log(answer);\n").unwrap();
    let outfile = dir.path().join("out.js");

    let request = serde_json::json!({
        "command": "build",
        "options": {"entryPoints": [entry], "outfile": outfile},
    });
    let response = build_json(&engine, &request.to_string());
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(response.code, "");
    let written = std::fs::read_to_string(&outfile).unwrap();
    assert!(written.contains("42"));
    assert!(!written.contains("import {"));
}

#[test]
fn missing_binary_is_reported_not_fatal() {
    let engine = EsbuildEngine::new("/nonexistent/esbuild");
    let response = transform_json(&engine, r#"{"input":"1"}"#);
    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0].text.starts_with("Failed to run esbuild"));
}
