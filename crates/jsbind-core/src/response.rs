//! The response envelope returned by every entrypoint.
//!
//! `{"code":"...","errors":[...],"warnings":[...]}` — `errors` and `warnings`
//! are always arrays, never `null` or missing, so hosts can iterate them
//! without null checks. The same normalization applies when a response is
//! read back (absent or `null` arrays become empty).

use serde::{Deserialize, Deserializer, Serialize};

use crate::engine::EngineOutput;
use crate::error::{BindError, Result};
use crate::message::Message;

/// Last-resort envelope used when even the fallback cannot be serialized.
pub const FALLBACK_RESPONSE_JSON: &str =
    r#"{"code":"","errors":[{"id":"","pluginName":"","text":"Failed to serialize response JSON","location":null,"notes":[]}],"warnings":[]}"#;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<Message>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub warnings: Vec<Message>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Message>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Message>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Response {
    /// Assemble an envelope, normalizing absent message lists to empty ones.
    pub fn new(
        code: impl Into<String>,
        errors: Option<Vec<Message>>,
        warnings: Option<Vec<Message>>,
    ) -> Self {
        Self {
            code: code.into(),
            errors: errors.unwrap_or_default(),
            warnings: warnings.unwrap_or_default(),
        }
    }

    /// Package an engine result. `code` is cleared whenever `errors` is
    /// non-empty; warnings never affect it.
    pub fn from_output(output: EngineOutput) -> Self {
        let code = if output.errors.is_empty() {
            output.code
        } else {
            String::new()
        };
        Self::new(code, Some(output.errors), Some(output.warnings))
    }

    /// An envelope holding exactly one error.
    pub fn failure(text: impl Into<String>) -> Self {
        Self::new("", Some(vec![Message::new(text)]), None)
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Serialize to compact JSON.
    ///
    /// If the envelope itself cannot be serialized, a fallback envelope
    /// describing the failure is serialized instead. `Err` means the fallback
    /// failed too; FFI callers then return [`FALLBACK_RESPONSE_JSON`].
    pub fn to_json(&self) -> Result<String> {
        match serde_json::to_string(self) {
            Ok(json) => Ok(json),
            Err(e) => {
                tracing::warn!(error = %e, "response serialization failed, sending fallback");
                serde_json::to_string(&Response::failure(format!(
                    "Failed to serialize response JSON: {e}"
                )))
                .map_err(BindError::ResponseJson)
            }
        }
    }

    /// Serialize, falling back to [`FALLBACK_RESPONSE_JSON`]. Never fails.
    pub fn to_json_lossy(&self) -> String {
        self.to_json()
            .unwrap_or_else(|_| FALLBACK_RESPONSE_JSON.to_string())
    }
}

impl From<BindError> for Response {
    fn from(err: BindError) -> Self {
        Response::failure(err.to_string())
    }
}
