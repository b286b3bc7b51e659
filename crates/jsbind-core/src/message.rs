//! Diagnostic records carried in the `errors` and `warnings` arrays.
//!
//! The shape follows esbuild's JavaScript API (`text`, `location`, `notes`,
//! camelCase keys) so hosts that already consume esbuild messages can read
//! them unchanged. Every field has a default, so partially-filled messages
//! from a host or an older engine still deserialize.

use serde::{Deserialize, Serialize};

/// One diagnostic: an error or a warning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Message {
    pub id: String,
    pub plugin_name: String,
    pub text: String,
    pub location: Option<Location>,
    pub notes: Vec<Note>,
}

/// Where in a source file a diagnostic points.
///
/// `line` is 1-based, `column` is 0-based (in bytes), matching esbuild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    pub file: String,
    pub namespace: String,
    pub line: u32,
    pub column: u32,
    pub length: u32,
    pub line_text: String,
    pub suggestion: String,
}

/// Additional context attached to a [`Message`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
    pub text: String,
    pub location: Option<Location>,
}

impl Message {
    /// A message with only text and no location.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Attach a location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Attach a note without a location.
    pub fn with_note(mut self, text: impl Into<String>) -> Self {
        self.notes.push(Note {
            text: text.into(),
            location: None,
        });
        self
    }
}

impl Location {
    /// A location in `file` at 1-based `line` and 0-based `column`.
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            namespace: "file".to_string(),
            line,
            column,
            ..Self::default()
        }
    }
}
