//! C ABI for jsbind.
//!
//! Exposes `transform` and `build`, each taking a NUL-terminated UTF-8 JSON
//! request and returning a NUL-terminated UTF-8 JSON response (see
//! `include/jsbind.h`). Hosts load the shared library through their FFI
//! (ctypes, cffi, `dlopen`) and call these directly.
//!
//! ## Ownership
//!
//! Returned strings are allocated by this library with [`CString::into_raw`]
//! and belong to the caller, who must hand each one back to [`free_string`]
//! exactly once. Freeing them with the C allocator is undefined behavior.
//!
//! ## Failure
//!
//! Nothing here aborts the host: a null pointer, invalid UTF-8, malformed
//! JSON, or a panic inside an engine all come back as a response envelope
//! with one error. Calls share no state and may run on any number of host
//! threads at once.
//!
//! ## Build
//!
//! ```sh
//! cargo build -p jsbind-ffi --release
//! # target/release/libjsbind.so (libjsbind.dylib, jsbind.dll)
//! ```

use std::ffi::{c_char, CStr, CString};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use jsbind_core::response::FALLBACK_RESPONSE_JSON;
use jsbind_core::{api, Config, Response};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");

/// Transform one source text.
///
/// # Safety
///
/// `request_json` must be null or point to a NUL-terminated string that
/// stays valid for the duration of the call. The result must be released
/// with [`free_string`].
#[no_mangle]
pub unsafe extern "C" fn transform(request_json: *const c_char) -> *mut c_char {
    let request = unsafe { request_str(request_json) };
    respond(move || match request {
        Ok(request) => {
            let engine = Config::from_env_or_default().engine();
            api::transform_json(engine.as_ref(), request)
        }
        Err(text) => Response::failure(text),
    })
}

/// Bundle entry points to disk. The response's `code` is always empty.
///
/// # Safety
///
/// Same contract as [`transform`].
#[no_mangle]
pub unsafe extern "C" fn build(request_json: *const c_char) -> *mut c_char {
    let request = unsafe { request_str(request_json) };
    respond(move || match request {
        Ok(request) => {
            let engine = Config::from_env_or_default().engine();
            api::build_json(engine.as_ref(), request)
        }
        Err(text) => Response::failure(text),
    })
}

/// Release a string returned by [`transform`] or [`build`]. Null is ignored.
///
/// # Safety
///
/// `response_json` must be null or a pointer previously returned by this
/// library that has not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn free_string(response_json: *mut c_char) {
    if response_json.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(response_json) });
}

/// The library version as a static NUL-terminated string. Do not free.
#[no_mangle]
pub extern "C" fn jsbind_version() -> *const c_char {
    match CStr::from_bytes_with_nul(VERSION.as_bytes()) {
        Ok(version) => version.as_ptr(),
        Err(_) => ptr::null(),
    }
}

/// Borrow the request as `&str`, describing why when that is impossible.
unsafe fn request_str<'a>(ptr: *const c_char) -> Result<&'a str, String> {
    if ptr.is_null() {
        return Err("Failed to parse request JSON: request pointer is null".to_string());
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|e| format!("Failed to parse request JSON: request is not valid UTF-8: {e}"))
}

/// Run `handler` with unwinding contained, then hand the JSON to the caller.
fn respond(handler: impl FnOnce() -> Response) -> *mut c_char {
    let response = panic::catch_unwind(AssertUnwindSafe(handler)).unwrap_or_else(|payload| {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::error!(%detail, "engine panicked");
        Response::failure(format!("Internal error: {detail}"))
    });
    into_raw(response.to_json_lossy())
}

fn into_raw(json: String) -> *mut c_char {
    match CString::new(json) {
        Ok(json) => json.into_raw(),
        Err(e) => {
            // serde_json escapes U+0000, so this only guards against a broken invariant.
            tracing::error!(position = e.nul_position(), "response contained a NUL byte");
            let mut bytes = FALLBACK_RESPONSE_JSON.as_bytes().to_vec();
            bytes.retain(|&b| b != 0);
            // SAFETY: every NUL byte was removed above.
            unsafe { CString::from_vec_unchecked(bytes) }.into_raw()
        }
    }
}
