//! C-ABI registration surface for the troika-rs dispatch engine.
//!
//! The host language loads this library, registers routes, installs its
//! handler callback, and starts the server. The engine itself is an
//! explicit [`Engine`] value; the C ABI forces exactly one piece of
//! process-wide state, the lazily constructed engine handle these
//! exports share, because a C callback has no `self` parameter to carry
//! it.
//!
//! # String and memory discipline
//!
//! - Every `*const c_char` input is borrowed, NUL-terminated UTF-8, valid
//!   only for the duration of the call. The engine copies what it keeps.
//! - NULL or non-UTF-8 input makes a registration return `false`; it
//!   never aborts the process.
//! - The callback's returned C string is copied into engine-owned memory
//!   before the call returns, so the host may free or reuse its buffer
//!   immediately.
//! - The pointer from [`get_performance_stats`] stays owned by this
//!   library and is valid until the next call to it.

use libc::{c_char, c_int, c_ushort};
use log::{error, warn};
use once_cell::sync::Lazy;
use std::ffi::{CStr, CString};
use std::sync::{Arc, Mutex};

use troika_rs::logs::logger::configure_logger;
use troika_rs::models::method::Method;
use troika_rs::models::response::RenderedResponse;
use troika_rs::server::Server;
use troika_rs::services::bridge::{BridgeError, Handler};
use troika_rs::services::engine::Engine;

/// The host handler callback: `(method, path, params_json) -> reply_json`.
///
/// All three arguments are NUL-terminated UTF-8, borrowed for the call.
/// The returned pointer must be a NUL-terminated reply envelope; it is
/// copied before the engine touches anything else, and a NULL return is
/// treated as a handler failure.
pub type HandlerCallback =
    unsafe extern "C" fn(*const c_char, *const c_char, *const c_char) -> *const c_char;

/// The process-wide engine handle shared by every export.
static ENGINE: Lazy<Arc<Engine>> = Lazy::new(|| Arc::new(Engine::new()));

/// Retained buffer for [`get_performance_stats`].
static STATS_BUFFER: Mutex<Option<CString>> = Mutex::new(None);

/// Access to the shared engine for Rust-side embedders and tests.
pub fn engine() -> &'static Arc<Engine> {
    &ENGINE
}

/// Adapter installing a C callback into the engine's handler slot.
struct CallbackHandler {
    callback: HandlerCallback,
}

// The function pointer is plain data; invocation safety is the host's
// side of the contract.
unsafe impl Send for CallbackHandler {}
unsafe impl Sync for CallbackHandler {}

impl Handler for CallbackHandler {
    fn call(
        &self,
        method: Method,
        path: &str,
        params_json: &str,
    ) -> Result<Vec<u8>, BridgeError> {
        let method_c = CString::new(method.as_str())
            .map_err(|_| BridgeError::HandlerFailed("method contains NUL".to_string()))?;
        let path_c = CString::new(path)
            .map_err(|_| BridgeError::HandlerFailed("path contains NUL".to_string()))?;
        let params_c = CString::new(params_json)
            .map_err(|_| BridgeError::HandlerFailed("params contain NUL".to_string()))?;

        let reply =
            unsafe { (self.callback)(method_c.as_ptr(), path_c.as_ptr(), params_c.as_ptr()) };
        if reply.is_null() {
            return Err(BridgeError::HandlerFailed(
                "callback returned NULL".to_string(),
            ));
        }

        // Copy on return: after this line the host may free its buffer.
        Ok(unsafe { CStr::from_ptr(reply) }.to_bytes().to_vec())
    }
}

/// Borrows a C string as UTF-8, rejecting NULL and bad encodings.
unsafe fn cstr<'a>(ptr: *const c_char, what: &str) -> Option<&'a str> {
    if ptr.is_null() {
        warn!("{} pointer is NULL", what);
        return None;
    }
    match CStr::from_ptr(ptr).to_str() {
        Ok(s) => Some(s),
        Err(_) => {
            warn!("{} is not valid UTF-8", what);
            None
        }
    }
}

/// Installs the host handler callback. One-shot: the first installation
/// wins and later attempts are logged and ignored.
///
/// # Safety
///
/// `callback` must be a valid function pointer with the agreed signature
/// for the lifetime of the process, or NULL (which is a no-op).
#[no_mangle]
pub unsafe extern "C" fn install_handler(callback: Option<HandlerCallback>) {
    let Some(callback) = callback else {
        warn!("install_handler called with NULL callback");
        return;
    };
    if ENGINE
        .install_handler(Box::new(CallbackHandler { callback }))
        .is_err()
    {
        warn!("install_handler: bridge already installed, ignoring");
    }
}

/// Registers a pre-rendered static route. Returns `false` when the key is
/// already taken or any argument is unusable.
///
/// # Safety
///
/// All pointer arguments must be NULL or valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn register_static(
    method: *const c_char,
    path: *const c_char,
    body: *const c_char,
    status: c_ushort,
    content_type: *const c_char,
) -> bool {
    let (Some(method_str), Some(path), Some(body), Some(content_type)) = (
        cstr(method, "method"),
        cstr(path, "path"),
        cstr(body, "body"),
        cstr(content_type, "content_type"),
    ) else {
        return false;
    };
    let Some(method) = Method::parse(method_str) else {
        warn!("register_static: unknown method token {:?}", method_str);
        return false;
    };

    let response = RenderedResponse::new(status, content_type, body.as_bytes().to_vec());
    match ENGINE.register_static(method, path, response) {
        Ok(()) => true,
        Err(err) => {
            warn!("register_static failed: {}", err);
            false
        }
    }
}

/// Compiles and registers a dynamic route with its cache TTL (0 disables
/// caching). Returns `false` on a malformed pattern, a duplicate, or an
/// unusable argument.
///
/// # Safety
///
/// All pointer arguments must be NULL or valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn register_dynamic(
    method: *const c_char,
    pattern: *const c_char,
    handler_name: *const c_char,
    ttl_seconds: u64,
) -> bool {
    let (Some(method_str), Some(pattern), Some(handler_name)) = (
        cstr(method, "method"),
        cstr(pattern, "pattern"),
        cstr(handler_name, "handler_name"),
    ) else {
        return false;
    };
    let Some(method) = Method::parse(method_str) else {
        warn!("register_dynamic: unknown method token {:?}", method_str);
        return false;
    };

    match ENGINE.register_dynamic(method, pattern, handler_name, ttl_seconds) {
        Ok(()) => true,
        Err(err) => {
            warn!("register_dynamic failed: {}", err);
            false
        }
    }
}

/// Installs the engine's built-in static routes (`GET /`, `GET /health`)
/// and returns how many were inserted. Host-registered entries are never
/// overwritten.
#[no_mangle]
pub extern "C" fn precompile() -> u64 {
    ENGINE.install_builtin_routes()
}

/// Binds the listener and blocks serving requests.
///
/// Returns `0` on clean shutdown (ctrl-c), `1` when binding or serving
/// fails, `2` when the arguments are unusable.
///
/// # Safety
///
/// `host` must be NULL or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn start_server(host: *const c_char, port: c_ushort) -> c_int {
    configure_logger();

    let Some(host) = cstr(host, "host") else {
        return 2;
    };
    let host = host.to_string();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("failed to build runtime: {}", err);
            return 1;
        }
    };

    let engine = ENGINE.clone();
    let outcome: Result<(), std::io::Error> = runtime.block_on(async move {
        let server = Server::bind(engine, &host, port).await?;
        tokio::select! {
            result = server.serve() => result,
            _ = tokio::signal::ctrl_c() => Ok(()),
        }
    });

    match outcome {
        Ok(()) => 0,
        Err(err) => {
            error!("server terminated: {}", err);
            1
        }
    }
}

/// Serializes the performance-counter snapshot as JSON.
///
/// The returned pointer is owned by this library and remains valid until
/// the next call; the host must copy it before calling again.
#[no_mangle]
pub extern "C" fn get_performance_stats() -> *const c_char {
    let snapshot = ENGINE.stats();
    let json = serde_json::to_string(&snapshot).unwrap_or_else(|_| "{}".to_string());
    let c_string = CString::new(json).unwrap_or_default();

    // Poisoning means a holder panicked mid-store; treat as fatal.
    let mut slot = STATS_BUFFER.lock().unwrap();
    *slot = Some(c_string);
    match slot.as_ref() {
        Some(retained) => retained.as_ptr(),
        None => std::ptr::null(),
    }
}

/// Empties the response cache. Returns `true` on success.
#[no_mangle]
pub extern "C" fn clear_cache() -> bool {
    ENGINE.clear_cache();
    true
}
