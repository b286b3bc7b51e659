//! Exercise the C ABI the way a host would: C strings in, owned C strings out.
//!
//! These run with `JSBIND_ENGINE=oxc` so they do not depend on an installed
//! esbuild.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::sync::Once;

use serde_json::Value;

static PIN_ENGINE: Once = Once::new();

fn pin_engine() {
    PIN_ENGINE.call_once(|| std::env::set_var("JSBIND_ENGINE", "oxc"));
}

/// Call an export, copy the response out, and free the original.
fn call(export: unsafe extern "C" fn(*const c_char) -> *mut c_char, request: &str) -> Value {
    pin_engine();
    let request = CString::new(request).unwrap();
    unsafe {
        let raw = export(request.as_ptr());
        assert!(!raw.is_null());
        let json = CStr::from_ptr(raw).to_str().unwrap().to_owned();
        jsbind::free_string(raw);
        serde_json::from_str(&json).unwrap()
    }
}

#[test]
fn transform_json_loader() {
    let response = call(
        jsbind::transform,
        r#"{"code":"{\"a\":1}","options":{"loader":"json"}}"#,
    );
    assert_eq!(response["errors"], serde_json::json!([]));
    assert_eq!(response["warnings"], serde_json::json!([]));
    assert!(!response["code"].as_str().unwrap().is_empty());
}

#[test]
fn transform_syntax_error() {
    let response = call(
        jsbind::transform,
        r#"{"command":"transform","input":"function (;","options":{"loader":"js"}}"#,
    );
    assert_eq!(response["code"], "");
    assert!(!response["errors"].as_array().unwrap().is_empty());
}

#[test]
fn malformed_request_is_an_error_envelope() {
    let response = call(jsbind::transform, r#"{"command":"#);
    let errors = response["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0]["text"]
        .as_str()
        .unwrap()
        .starts_with("Failed to parse request JSON"));
}

#[test]
fn null_pointer_is_an_error_envelope() {
    unsafe {
        let raw = jsbind::build(std::ptr::null());
        let json = CStr::from_ptr(raw).to_str().unwrap().to_owned();
        jsbind::free_string(raw);
        let response: Value = serde_json::from_str(&json).unwrap();
        assert!(response["errors"][0]["text"]
            .as_str()
            .unwrap()
            .contains("null"));
    }
}

#[test]
fn invalid_utf8_is_an_error_envelope() {
    let bytes = CString::new(vec![b'{', 0xff, b'}']).unwrap();
    unsafe {
        let raw = jsbind::transform(bytes.as_ptr());
        let json = CStr::from_ptr(raw).to_str().unwrap().to_owned();
        jsbind::free_string(raw);
        assert!(json.contains("not valid UTF-8"));
    }
}

#[test]
fn free_string_ignores_null() {
    unsafe { jsbind::free_string(std::ptr::null_mut()) };
}

#[test]
fn build_writes_outfile() {
    let dir = tempfile::tempdir().unwrap();
    let entry = dir.path().join("main.js");
    std::fs::write(&entry, "export const ready = true;\n").unwrap();
    let outfile = dir.path().join("out.js");

    let request = serde_json::json!({
        "command": "build",
        "options": {"entryPoints": [entry], "outfile": outfile},
    });
    let response = call(jsbind::build, &request.to_string());

    assert_eq!(response["code"], "");
    assert_eq!(response["errors"], serde_json::json!([]));
    assert!(std::fs::read_to_string(&outfile).unwrap().contains("ready = true"));
}

#[test]
fn version_is_static() {
    let version = unsafe { CStr::from_ptr(jsbind::jsbind_version()) };
    assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
}

#[test]
fn concurrent_calls_are_independent() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            std::thread::spawn(move || {
                let request = serde_json::json!({
                    "input": format!("export const item{i}: string = \"v{i}\";"),
                    "options": {"loader": "ts"},
                });
                (i, call(jsbind::transform, &request.to_string()))
            })
        })
        .collect();

    for handle in handles {
        let (i, response) = handle.join().unwrap();
        let code = response["code"].as_str().unwrap();
        assert!(code.contains(&format!("item{i} = \"v{i}\"")), "{code}");
        assert_eq!(code.matches("item").count(), 1);
    }
}
