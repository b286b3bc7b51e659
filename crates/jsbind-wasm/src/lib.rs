//! WASM bindings for jsbind-core.
//!
//! Exposes `transform` and `build` as `#[wasm_bindgen]` functions taking and
//! returning JSON strings, the same wire contract as the C ABI. Only the
//! in-process OXC engine is compiled in; `build` reads and writes through
//! `std::fs`, so under `wasm32-unknown-unknown` it reports an I/O error in
//! the response rather than throwing.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p jsbind-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir packages/jsbind-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/jsbind_wasm.wasm
//! ```

use jsbind_core::{api, OxcEngine};
use wasm_bindgen::prelude::*;

/// Transform a request like `{"input":"...","options":{"loader":"ts"}}`.
///
/// Always returns a response JSON string; errors are inside it.
#[wasm_bindgen]
pub fn transform(request: &str) -> String {
    api::transform_json(&OxcEngine::new(), request).to_json_lossy()
}

/// Build a request like `{"options":{"entryPoints":["a.ts"],"outfile":"out.js"}}`.
#[wasm_bindgen]
pub fn build(request: &str) -> String {
    api::build_json(&OxcEngine::new(), request).to_json_lossy()
}

/// The jsbind version this module was built from.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
