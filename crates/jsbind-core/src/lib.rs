//! # jsbind-core
//!
//! Request/response marshaling for JavaScript/TypeScript transform and build
//! engines, shared by every jsbind entrypoint (C FFI, stdin/stdout process,
//! Python, wasm-bindgen).
//!
//! jsbind does not parse or bundle anything itself. It deserializes a request,
//! maps the loader name onto [`Loader`], calls an [`Engine`], and packages the
//! result into a [`Response`] whose `errors` and `warnings` are always arrays.
//!
//! ## Quick start
//!
//! ```rust
//! use jsbind_core::{api, OxcEngine};
//!
//! let request = r#"{"input":"let n: number = 1","options":{"loader":"ts"}}"#;
//! let response = api::transform_json(&OxcEngine::new(), request);
//! assert!(response.errors.is_empty());
//! assert!(response.code.contains("let n = 1"));
//! ```
//!
//! ## Modules
//!
//! - [`api`] — request dispatch (`transform`, `build`, `handle_request`)
//! - [`request`] — transform/build request envelopes
//! - [`response`] — the response envelope and its non-null invariant
//! - [`loader`] — loader tags → [`Loader`]
//! - [`message`] — diagnostic records
//! - [`engine`] — the [`Engine`] trait, OXC and esbuild engines
//! - [`config`] — engine selection from the environment
//! - [`error`] — error types

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod message;
pub mod request;
pub mod response;

pub use config::{Config, EngineKind};
#[cfg(not(target_family = "wasm"))]
pub use engine::EsbuildEngine;
pub use engine::{Engine, EngineOutput, OxcEngine, TransformInput};
pub use error::BindError;
pub use loader::Loader;
pub use message::{Location, Message, Note};
pub use request::{BuildOptions, BuildRequest, TransformOptions, TransformRequest};
pub use response::Response;
