//! `EsbuildEngine` process handling, driven by stand-in executables so it
//! runs without a real esbuild.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::sync::{Mutex, MutexGuard};

use jsbind_core::api::{build_json, transform_json};
use jsbind_core::{BuildOptions, Engine, EsbuildEngine, Loader, TransformInput};
use tempfile::TempDir;

/// Exec'ing a script while another thread forks with its write handle open
/// fails with ETXTBSY, so these tests take turns.
static SPAWN_LOCK: Mutex<()> = Mutex::new(());

struct Stub {
    engine: EsbuildEngine,
    dir: TempDir,
    _guard: MutexGuard<'static, ()>,
}

/// An `esbuild` that runs `script` under `/bin/sh`.
fn stub(script: &str) -> Stub {
    let guard = SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("esbuild");
    std::fs::write(&path, format!("#!/bin/sh\n{script}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    Stub {
        engine: EsbuildEngine::new(path),
        dir,
        _guard: guard,
    }
}

/// A script that drains stdin, prints `log` to stderr and exits with `code`.
fn failing_with(log: &str, code: i32) -> String {
    format!("cat > /dev/null\ncat >&2 <<'LOG'\n{log}LOG\nexit {code}\n")
}

const SYNTAX_ERROR_LOG: &str = "\
✘ [ERROR] Expected \";\" but found \"x\"

    <stdin>:1:4:
      1 │ let x
        ╵     ^

1 error
";

// ─────────────────────────────────────────────────────────────────────────────
// Transform
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn transform_pipes_source_through_stdin() {
    let stub = stub("cat\n");
    let response = transform_json(
        &stub.engine,
        r#"{"input":"let n = 1;","options":{"loader":"ts"}}"#,
    );
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(response.code, "let n = 1;");
}

#[test]
fn input_larger_than_a_pipe_buffer_round_trips() {
    let stub = stub("cat\n");
    let source = "x;\n".repeat(200_000);
    let output = stub.engine.transform(&TransformInput::new(&source, Loader::Js));
    assert!(output.errors.is_empty(), "{:?}", output.errors);
    assert_eq!(output.code.len(), source.len());
}

#[test]
fn transform_passes_loader_and_sourcefile() {
    let stub = stub("cat > /dev/null\nprintf '%s\\n' \"$@\"\n");
    let output = stub.engine.transform(&TransformInput {
        source: "<App />",
        loader: Loader::Tsx,
        sourcefile: Some("src/app.tsx"),
    });
    let args: Vec<&str> = output.code.lines().collect();
    assert_eq!(
        args,
        [
            "--log-level=warning",
            "--color=false",
            "--loader=tsx",
            "--sourcefile=src/app.tsx"
        ]
    );
}

#[test]
fn reported_error_is_parsed_and_code_cleared() {
    let stub = stub(&failing_with(SYNTAX_ERROR_LOG, 1));
    let response = transform_json(&stub.engine, r#"{"input":"let x","options":{"loader":"js"}}"#);
    assert_eq!(response.code, "");
    assert_eq!(response.errors.len(), 1);

    let error = &response.errors[0];
    assert_eq!(error.text, "Expected \";\" but found \"x\"");
    let location = error.location.as_ref().expect("location should be parsed");
    assert_eq!(location.file, "<stdin>");
    assert_eq!((location.line, location.column), (1, 4));
    assert_eq!(location.line_text, "let x");
}

#[test]
fn warnings_keep_the_code() {
    let log = "\
▲ [WARNING] Duplicate key \"a\" in object literal [duplicate-object-key]

    <stdin>:1:11:
      1 │ x = {a: 1, a: 2}
        ╵            ^

1 warning
";
    let stub = stub(&format!(
        "cat > /dev/null\necho 'x = {{ a: 1, a: 2 }};'\ncat >&2 <<'LOG'\n{log}LOG\n"
    ));
    let response = transform_json(&stub.engine, r#"{"input":"x = {a: 1, a: 2}"}"#);
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(response.code, "x = { a: 1, a: 2 };\n");
    assert_eq!(response.warnings.len(), 1);
    assert_eq!(response.warnings[0].id, "duplicate-object-key");
}

#[test]
fn failing_exit_with_unparseable_stderr_keeps_the_text() {
    let stub = stub(&failing_with("Segmentation fault\n", 2));
    let output = stub.engine.transform(&TransformInput::new("1", Loader::Js));
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].text, "Segmentation fault");
}

#[test]
fn failing_exit_with_empty_stderr_names_the_status() {
    let stub = stub("cat > /dev/null\nexit 3\n");
    let output = stub.engine.transform(&TransformInput::new("1", Loader::Js));
    assert_eq!(output.errors.len(), 1);
    assert!(
        output.errors[0].text.starts_with("esbuild exited with"),
        "{}",
        output.errors[0].text
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Build
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn build_passes_entries_and_clears_stdout() {
    let stub = stub("printf '%s\\n' \"$@\" > \"$(dirname \"$0\")/args.txt\"\necho 'bundled output'\n");
    let output = stub.engine.build(&BuildOptions {
        entry_points: vec!["a.ts".into(), "b.ts".into()],
        outfile: "dist/out.js".into(),
    });
    assert!(output.errors.is_empty(), "{:?}", output.errors);
    assert!(output.code.is_empty(), "the bundle goes to disk, not to the caller");

    let args = std::fs::read_to_string(stub.dir.path().join("args.txt")).unwrap();
    assert_eq!(
        args.lines().collect::<Vec<_>>(),
        [
            "--log-level=warning",
            "--color=false",
            "a.ts",
            "b.ts",
            "--bundle",
            "--outfile=dist/out.js"
        ]
    );
}

#[test]
fn build_failure_is_reported() {
    let log = "\
✘ [ERROR] Could not resolve \"./missing\"

    app.js:1:7:
      1 │ import \"./missing\";
        ╵        ~~~~~~~~~~~

1 error
";
    let stub = stub(&failing_with(log, 1));
    let response = build_json(
        &stub.engine,
        r#"{"command":"build","options":{"entryPoints":["app.js"],"outfile":"out.js"}}"#,
    );
    assert_eq!(response.code, "");
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].text, "Could not resolve \"./missing\"");
    assert_eq!(response.errors[0].location.as_ref().unwrap().file, "app.js");
}
