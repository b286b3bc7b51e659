//! Loader tags — how the engine interprets a piece of source content.
//!
//! Hosts name loaders with plain strings (`"ts"`, `"json"`, ...). The mapping
//! onto [`Loader`] is total: anything outside the known set becomes
//! [`Loader::Js`], and the engine reports its own error later if the content
//! does not parse as JavaScript.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// The closed set of loaders understood by the engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Loader {
    Js,
    Jsx,
    Ts,
    Tsx,
    Css,
    Json,
    Text,
    Base64,
    #[serde(rename = "dataurl")]
    DataUrl,
    File,
    Binary,
}

/// Tag → loader lookup table. Order matches the order hosts usually list them.
const TAGS: [(&str, Loader); 11] = [
    ("js", Loader::Js),
    ("jsx", Loader::Jsx),
    ("ts", Loader::Ts),
    ("tsx", Loader::Tsx),
    ("css", Loader::Css),
    ("json", Loader::Json),
    ("text", Loader::Text),
    ("base64", Loader::Base64),
    ("dataurl", Loader::DataUrl),
    ("file", Loader::File),
    ("binary", Loader::Binary),
];

impl Loader {
    /// Every loader, in table order.
    pub const ALL: [Loader; 11] = [
        Loader::Js,
        Loader::Jsx,
        Loader::Ts,
        Loader::Tsx,
        Loader::Css,
        Loader::Json,
        Loader::Text,
        Loader::Base64,
        Loader::DataUrl,
        Loader::File,
        Loader::Binary,
    ];

    /// Map a loader tag onto a [`Loader`]. Never fails.
    ///
    /// Matching is exact (case-sensitive). Unknown tags, including the empty
    /// string, fall back to [`Loader::Js`].
    ///
    /// ```
    /// use jsbind_core::Loader;
    /// assert_eq!(Loader::from_tag("tsx"), Loader::Tsx);
    /// assert_eq!(Loader::from_tag("coffee"), Loader::Js);
    /// ```
    pub fn from_tag(tag: &str) -> Loader {
        TAGS.iter()
            .find(|(name, _)| *name == tag)
            .map(|(_, loader)| *loader)
            .unwrap_or(Loader::Js)
    }

    /// The canonical tag for this loader (inverse of [`Loader::from_tag`]).
    pub fn as_str(self) -> &'static str {
        match self {
            Loader::Js => "js",
            Loader::Jsx => "jsx",
            Loader::Ts => "ts",
            Loader::Tsx => "tsx",
            Loader::Css => "css",
            Loader::Json => "json",
            Loader::Text => "text",
            Loader::Base64 => "base64",
            Loader::DataUrl => "dataurl",
            Loader::File => "file",
            Loader::Binary => "binary",
        }
    }

    /// Pick a loader from a file path's extension, the way a build assigns
    /// loaders to entry points. Unknown or missing extensions use `file`.
    pub fn from_extension(path: &Path) -> Loader {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        match ext {
            "js" | "mjs" | "cjs" => Loader::Js,
            "jsx" => Loader::Jsx,
            "ts" | "mts" | "cts" => Loader::Ts,
            "tsx" => Loader::Tsx,
            "css" => Loader::Css,
            "json" => Loader::Json,
            "txt" => Loader::Text,
            _ => Loader::File,
        }
    }

    /// Whether the loader's content is JavaScript or TypeScript source.
    pub fn is_script(self) -> bool {
        matches!(self, Loader::Js | Loader::Jsx | Loader::Ts | Loader::Tsx)
    }
}

impl fmt::Display for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
