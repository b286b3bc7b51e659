//! In-process engine built on OXC.
//!
//! Script loaders (`js`, `jsx`, `ts`, `tsx`) run the OXC pipeline:
//! parse → semantic analysis (with early errors) → transform (strip
//! TypeScript, lower JSX to `React.createElement`) → codegen. Data loaders
//! are wrapped as CommonJS modules the way esbuild's transform API emits
//! them. `css` and `file` need the esbuild engine.
//!
//! Builds bundle one entry point together with everything it reaches
//! through relative imports (see `engine::bundle`).

use std::fs;
use std::path::Path;

use base64::Engine as _;
use oxc::codegen::Codegen;
use oxc::parser::Parser;
use oxc::semantic::SemanticBuilder;
use oxc::span::SourceType;
use oxc::transformer::{JsxRuntime, TransformOptions, Transformer};

use super::bundle;
use super::{Engine, EngineOutput, TransformInput};
use crate::loader::Loader;
use crate::message::{Location, Message};
use crate::request::BuildOptions;

/// The pure-Rust engine. Stateless; every call allocates its own arena.
#[derive(Debug, Clone, Copy, Default)]
pub struct OxcEngine;

impl OxcEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Engine for OxcEngine {
    fn name(&self) -> &'static str {
        "oxc"
    }

    fn transform(&self, input: &TransformInput<'_>) -> EngineOutput {
        tracing::debug!(loader = %input.loader, bytes = input.source.len(), "oxc transform");
        match input.loader {
            Loader::Js | Loader::Jsx | Loader::Ts | Loader::Tsx => transpile(input),
            _ => match data_expression(input) {
                Ok(expr) => EngineOutput::code(cjs_export(&expr)),
                Err(output) => output,
            },
        }
    }

    fn build(&self, options: &BuildOptions) -> EngineOutput {
        tracing::debug!(entries = ?options.entry_points, outfile = %options.outfile, "oxc build");
        let entry = match options.entry_points.as_slice() {
            [] => return EngineOutput::error(Message::new("No entry points were specified")),
            [entry] => entry,
            _ => {
                return EngineOutput::error(Message::new(
                    "Must use \"outdir\" when there are multiple input files",
                ))
            }
        };
        if options.outfile.is_empty() {
            return EngineOutput::error(Message::new(
                "Must use \"outfile\" when writing a build to disk",
            ));
        }

        let mut output = bundle::bundle(Path::new(entry));
        if output.errors.is_empty() {
            if let Err(e) = write_outfile(Path::new(&options.outfile), &output.code) {
                output.errors.push(Message::new(format!(
                    "Failed to write to output file \"{}\": {e}",
                    options.outfile
                )));
            }
        }
        output.code.clear();
        output
    }
}

/// Run the OXC pipeline over a script.
pub(super) fn transpile(input: &TransformInput<'_>) -> EngineOutput {
    let allocator = oxc_allocator::Allocator::default();
    let source_type = source_type_for(input.loader);

    let parse_ret = Parser::new(&allocator, input.source, source_type).parse();
    if parse_ret.panicked || !parse_ret.errors.is_empty() {
        let errors = parse_ret
            .errors
            .iter()
            .map(|e| Message::new(e.to_string()))
            .collect::<Vec<_>>();
        if errors.is_empty() {
            return EngineOutput::error(Message::new(format!(
                "Failed to parse {}",
                input.display_name()
            )));
        }
        return EngineOutput::errors(errors);
    }

    let mut program = parse_ret.program;

    // Early errors (redeclarations, `break` outside a loop, ...) are only
    // reported when syntax checking is on.
    let semantic_ret = SemanticBuilder::new()
        .with_check_syntax_error(true)
        .with_excess_capacity(2.0)
        .build(&program);
    if !semantic_ret.errors.is_empty() {
        return EngineOutput::errors(
            semantic_ret
                .errors
                .iter()
                .map(|e| Message::new(e.to_string()))
                .collect(),
        );
    }
    let scoping = semantic_ret.semantic.into_scoping();

    let mut transform_options = TransformOptions::default();
    transform_options.jsx.runtime = JsxRuntime::Classic;
    let transform_ret = Transformer::new(
        &allocator,
        Path::new(input.display_name()),
        &transform_options,
    )
    .build_with_scoping(scoping, &mut program);

    if !transform_ret.errors.is_empty() {
        return EngineOutput::errors(
            transform_ret
                .errors
                .iter()
                .map(|e| Message::new(e.to_string()))
                .collect(),
        );
    }

    EngineOutput::code(Codegen::new().build(&program).code)
}

fn source_type_for(loader: Loader) -> SourceType {
    let file_name = match loader {
        Loader::Jsx => "input.jsx",
        Loader::Ts => "input.ts",
        Loader::Tsx => "input.tsx",
        _ => "input.js",
    };
    SourceType::from_path(file_name).unwrap_or_else(|_| SourceType::mjs())
}

/// The JavaScript expression a data loader exports, or the errors that
/// prevent one.
pub(super) fn data_expression(input: &TransformInput<'_>) -> Result<String, EngineOutput> {
    match input.loader {
        Loader::Json => json_expression(input),
        Loader::Text => Ok(string_literal(input.source)),
        Loader::Base64 => Ok(string_literal(&base64_encode(input.source))),
        Loader::DataUrl => Ok(string_literal(&format!(
            "data:text/plain;charset=utf-8;base64,{}",
            base64_encode(input.source)
        ))),
        Loader::Binary => Ok(format!(
            "Uint8Array.from(atob({}), (c) => c.charCodeAt(0))",
            string_literal(&base64_encode(input.source))
        )),
        Loader::Css | Loader::File => Err(EngineOutput::error(
            Message::new(format!(
                "The \"{}\" loader is not supported by the in-process engine",
                input.loader
            ))
            .with_note("Set JSBIND_ENGINE=esbuild to use the esbuild executable"),
        )),
        Loader::Js | Loader::Jsx | Loader::Ts | Loader::Tsx => Err(EngineOutput::error(
            Message::new(format!("The \"{}\" loader is not a data loader", input.loader)),
        )),
    }
}

fn json_expression(input: &TransformInput<'_>) -> Result<String, EngineOutput> {
    let value: serde_json::Value = serde_json::from_str(input.source).map_err(|e| {
        let line = u32::try_from(e.line()).unwrap_or(u32::MAX);
        let column = u32::try_from(e.column().saturating_sub(1)).unwrap_or(u32::MAX);
        let mut location = Location::new(input.display_name(), line, column);
        if let Some(text) = input.source.lines().nth(e.line().saturating_sub(1)) {
            location.line_text = text.to_string();
        }
        EngineOutput::error(Message::new(format!("Invalid JSON: {e}")).with_location(location))
    })?;
    serde_json::to_string_pretty(&value)
        .map_err(|e| EngineOutput::error(Message::new(format!("Failed to print JSON: {e}"))))
}

fn cjs_export(expr: &str) -> String {
    format!("module.exports = {expr};\n")
}

/// A JSON string literal is also a valid JavaScript string literal.
pub(super) fn string_literal(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

fn base64_encode(text: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(text.as_bytes())
}

fn write_outfile(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}
