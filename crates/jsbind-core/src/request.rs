//! Request envelopes accepted by every entrypoint.
//!
//! Canonical wire shapes:
//!
//! ```json
//! {"command":"transform","input":"let x: number = 1","options":{"loader":"ts"}}
//! {"command":"build","options":{"entryPoints":["src/index.ts"],"outfile":"dist/out.js"}}
//! ```
//!
//! `command` only matters to the process entrypoint, which reads it through
//! [`Envelope`]; the FFI functions already know which operation was called
//! and ignore it.

use serde::{Deserialize, Serialize};

use crate::loader::Loader;

/// The minimal view of a request needed to route it.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub command: String,
}

/// A single-file transform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRequest {
    /// Source text. Older hosts send it as `code`.
    #[serde(alias = "code")]
    pub input: String,
    #[serde(default)]
    pub options: TransformOptions,
}

/// Options for a transform. Only the loader is required by the contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// Loader tag; unknown or missing tags resolve to `js`.
    pub loader: String,
    /// Name used for the input in diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sourcefile: Option<String>,
}

impl TransformOptions {
    pub fn loader(&self) -> Loader {
        Loader::from_tag(&self.loader)
    }
}

/// An entry-point build. Bundling and writing to disk are always on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    #[serde(default)]
    pub options: BuildOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildOptions {
    #[serde(alias = "entry_points")]
    pub entry_points: Vec<String>,
    pub outfile: String,
}
