//! The transform/bundle engine seam.
//!
//! jsbind never parses or bundles JavaScript itself; an [`Engine`] does.
//! Two implementations ship:
//!
//! - [`OxcEngine`] — in-process, pure Rust, available on every target
//!   (including `wasm32-wasip1` and `wasm32-unknown-unknown`)
//! - `EsbuildEngine` — drives the `esbuild` executable (native targets only)
//!
//! Engines are stateless: one instance may serve any number of calls from
//! any number of threads.

mod bundle;
pub mod diagnostics;
#[cfg(not(target_family = "wasm"))]
pub mod esbuild;
pub mod oxc_engine;

#[cfg(not(target_family = "wasm"))]
pub use esbuild::EsbuildEngine;
pub use oxc_engine::OxcEngine;

use crate::loader::Loader;
use crate::message::Message;
use crate::request::BuildOptions;

/// One transform call: source text plus the resolved loader.
#[derive(Debug, Clone, Copy)]
pub struct TransformInput<'a> {
    pub source: &'a str,
    pub loader: Loader,
    /// Name used for the input in diagnostics.
    pub sourcefile: Option<&'a str>,
}

impl<'a> TransformInput<'a> {
    pub fn new(source: &'a str, loader: Loader) -> Self {
        Self {
            source,
            loader,
            sourcefile: None,
        }
    }

    /// The display name of the input: `sourcefile` if given, else `<stdin>`.
    pub fn display_name(&self) -> &'a str {
        self.sourcefile.unwrap_or("<stdin>")
    }
}

/// What an engine hands back from either operation.
///
/// `code` may be populated even when `errors` is not; the response layer
/// decides what the host sees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutput {
    pub code: String,
    pub errors: Vec<Message>,
    pub warnings: Vec<Message>,
}

impl EngineOutput {
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    pub fn error(message: Message) -> Self {
        Self {
            errors: vec![message],
            ..Self::default()
        }
    }

    pub fn errors(errors: Vec<Message>) -> Self {
        Self {
            errors,
            ..Self::default()
        }
    }
}

/// A JavaScript/TypeScript transform and bundle implementation.
pub trait Engine: Send + Sync {
    /// Short name used in logs (`"oxc"`, `"esbuild"`).
    fn name(&self) -> &'static str;

    /// Convert one source text. Exactly one attempt; no retries.
    fn transform(&self, input: &TransformInput<'_>) -> EngineOutput;

    /// Bundle `options.entry_points` into `options.outfile` on disk.
    /// The returned `code` is always empty.
    fn build(&self, options: &BuildOptions) -> EngineOutput;
}
