//! Engine selection.
//!
//! Read from the environment by every entrypoint:
//!
//! - `JSBIND_ENGINE` — `auto` (default), `oxc`, or `esbuild`
//! - `JSBIND_ESBUILD` — path to the esbuild executable
//!
//! `auto` prefers esbuild when it can be located and otherwise runs the
//! in-process OXC engine. On wasm targets only OXC exists.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::engine::{Engine, OxcEngine};
use crate::error::{BindError, Result};

pub const ENGINE_ENV: &str = "JSBIND_ENGINE";
pub const ESBUILD_ENV: &str = "JSBIND_ESBUILD";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EngineKind {
    #[default]
    Auto,
    Oxc,
    Esbuild,
}

impl FromStr for EngineKind {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(EngineKind::Auto),
            "oxc" => Ok(EngineKind::Oxc),
            "esbuild" => Ok(EngineKind::Esbuild),
            other => Err(BindError::UnknownEngine(other.to_string())),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EngineKind::Auto => "auto",
            EngineKind::Oxc => "oxc",
            EngineKind::Esbuild => "esbuild",
        })
    }
}

fn esbuild_path_from_env() -> Option<PathBuf> {
    std::env::var_os(ESBUILD_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub engine: EngineKind,
    pub esbuild_path: Option<PathBuf>,
}

impl Config {
    /// Load from `JSBIND_ENGINE` / `JSBIND_ESBUILD`. Unset variables keep
    /// their defaults; an unrecognized engine name is an error.
    pub fn from_env() -> Result<Self> {
        let engine = match std::env::var(ENGINE_ENV) {
            Ok(value) => value.parse()?,
            Err(_) => EngineKind::Auto,
        };
        Ok(Self {
            engine,
            esbuild_path: esbuild_path_from_env(),
        })
    }

    /// Like [`Config::from_env`], but an invalid `JSBIND_ENGINE` degrades
    /// to `auto` with a warning. Used at FFI boundaries that must not fail.
    pub fn from_env_or_default() -> Self {
        Self::from_env().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring invalid engine configuration");
            Self {
                engine: EngineKind::Auto,
                esbuild_path: esbuild_path_from_env(),
            }
        })
    }

    /// Construct the configured engine.
    ///
    /// An explicit `esbuild` request that cannot be satisfied falls back to
    /// OXC with a warning rather than failing every call.
    pub fn engine(&self) -> Box<dyn Engine> {
        match self.engine {
            EngineKind::Oxc => Box::new(OxcEngine::new()),
            EngineKind::Auto | EngineKind::Esbuild => self.esbuild_or_oxc(),
        }
    }

    #[cfg(not(target_family = "wasm"))]
    fn esbuild_or_oxc(&self) -> Box<dyn Engine> {
        use crate::engine::EsbuildEngine;

        match EsbuildEngine::locate(self.esbuild_path.as_deref()) {
            Ok(engine) => Box::new(engine),
            Err(e) => {
                if self.engine == EngineKind::Esbuild {
                    tracing::warn!(error = %e, "esbuild requested but unavailable, using oxc");
                } else {
                    tracing::debug!(error = %e, "esbuild not found, using oxc");
                }
                Box::new(OxcEngine::new())
            }
        }
    }

    #[cfg(target_family = "wasm")]
    fn esbuild_or_oxc(&self) -> Box<dyn Engine> {
        if self.engine == EngineKind::Esbuild {
            tracing::warn!("esbuild is unavailable on wasm targets, using oxc");
        }
        Box::new(OxcEngine::new())
    }
}
