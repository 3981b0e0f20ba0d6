//! The cross-language handler bridge.
//!
//! Dynamic requests that miss the cache are forwarded to host-authored
//! code through a single process-wide callable slot. The engine side of
//! the contract is the [`Handler`] trait; the FFI layer installs an
//! adapter around a C callback, and native embeddings install a Rust
//! value directly. Either way the slot is installed once and only read
//! afterwards.
//!
//! The host replies with a JSON envelope. Hosts produce several shapes in
//! practice, so the envelope is deserialized into the [`HandlerReply`] sum
//! type rather than a single struct; anything that is not valid JSON in
//! one of the agreed shapes is a malformed reply and surfaces as a 500.

use crate::models::method::Method;
use crate::models::params::ParamMap;
use crate::models::response::RenderedResponse;
use log::warn;
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;

/// Errors raised at the handler boundary.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A dynamic match was dispatched before any handler was installed.
    #[error("No handler installed in the bridge slot")]
    NotInstalled,

    /// A second installation was attempted; the slot is one-shot.
    #[error("Handler bridge already installed")]
    AlreadyInstalled,

    /// The handler panicked or reported a host-side failure.
    #[error("Handler invocation failed: {0}")]
    HandlerFailed(String),

    /// The reply bytes did not parse as any agreed envelope shape.
    #[error("Malformed handler reply: {0}")]
    MalformedReply(String),
}

/// The engine-facing handler contract.
///
/// `call` receives the method token, the request path, and the parameter
/// map serialized as a JSON object in pattern order. All three are
/// borrowed for the duration of the call. The returned bytes are owned by
/// the callee's side until `call` returns; implementations must hand back
/// an owned buffer (the FFI adapter copies out of the C string before
/// returning, so the host may free its buffer immediately after).
pub trait Handler: Send + Sync {
    fn call(&self, method: Method, path: &str, params_json: &str)
        -> Result<Vec<u8>, BridgeError>;
}

/// The decoded shapes a host reply can take.
///
/// - `Structured`: the full envelope `{"body", "status", "headers"}`.
/// - `TupleWithStatus`: a two-element array `[body, status]`.
/// - `Json`: any other JSON object or array, served as-is.
/// - `Raw`: a bare JSON string, served as plain text.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerReply {
    Structured {
        body: String,
        status: u16,
        headers: Vec<(String, String)>,
    },
    TupleWithStatus {
        body: String,
        status: u16,
    },
    Json(Value),
    Raw(String),
}

impl HandlerReply {
    /// Parses reply bytes into one of the agreed shapes.
    pub fn from_bytes(bytes: &[u8]) -> Result<HandlerReply, BridgeError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| BridgeError::MalformedReply(format!("reply is not JSON: {}", e)))?;

        match value {
            Value::Object(ref map) if map.contains_key("body") => {
                let body = match &map["body"] {
                    Value::String(s) => s.clone(),
                    // Hosts occasionally leave structured data unencoded.
                    other => other.to_string(),
                };
                let status = match map.get("status") {
                    None => 200,
                    Some(v) => reply_status(v)?,
                };
                let mut headers = Vec::new();
                if let Some(raw_headers) = map.get("headers") {
                    let obj = raw_headers.as_object().ok_or_else(|| {
                        BridgeError::MalformedReply("headers is not an object".to_string())
                    })?;
                    for (name, value) in obj {
                        let value = value.as_str().ok_or_else(|| {
                            BridgeError::MalformedReply(format!(
                                "header {} is not a string",
                                name
                            ))
                        })?;
                        headers.push((name.clone(), value.to_string()));
                    }
                }
                Ok(HandlerReply::Structured {
                    body,
                    status,
                    headers,
                })
            }
            Value::Array(ref items) if items.len() == 2 && items[1].is_u64() => {
                let status = reply_status(&items[1])?;
                let body = match &items[0] {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Ok(HandlerReply::TupleWithStatus { body, status })
            }
            Value::String(s) => Ok(HandlerReply::Raw(s)),
            other => Ok(HandlerReply::Json(other)),
        }
    }

    /// Renders the reply into an engine-owned response.
    pub fn into_response(self) -> RenderedResponse {
        match self {
            HandlerReply::Structured {
                body,
                status,
                headers,
            } => {
                let mut content_type = "application/json".to_string();
                let mut extra = Vec::with_capacity(headers.len());
                for (name, value) in headers {
                    if name.eq_ignore_ascii_case("content-type") {
                        content_type = value;
                    } else {
                        extra.push((name, value));
                    }
                }
                RenderedResponse {
                    status,
                    content_type,
                    extra_headers: extra,
                    body: body.into_bytes(),
                }
            }
            HandlerReply::TupleWithStatus { body, status } => {
                RenderedResponse::json(status, body.into_bytes())
            }
            HandlerReply::Json(value) => RenderedResponse::json(200, value.to_string()),
            HandlerReply::Raw(text) => RenderedResponse::new(200, "text/plain", text.into_bytes()),
        }
    }
}

fn reply_status(value: &Value) -> Result<u16, BridgeError> {
    let status = value
        .as_u64()
        .ok_or_else(|| BridgeError::MalformedReply("status is not an integer".to_string()))?;
    if !(100..=599).contains(&status) {
        return Err(BridgeError::MalformedReply(format!(
            "status {} out of range",
            status
        )));
    }
    Ok(status as u16)
}

/// The process-wide handler slot with one-shot installation.
#[derive(Default)]
pub struct HandlerBridge {
    slot: OnceCell<Box<dyn Handler>>,
}

impl std::fmt::Debug for HandlerBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerBridge")
            .field("installed", &self.is_installed())
            .finish()
    }
}

impl HandlerBridge {
    pub fn new() -> Self {
        Self {
            slot: OnceCell::new(),
        }
    }

    /// Installs the handler. Fails if the slot is already occupied; the
    /// existing handler is never replaced.
    pub fn install(&self, handler: Box<dyn Handler>) -> Result<(), BridgeError> {
        self.slot
            .set(handler)
            .map_err(|_| BridgeError::AlreadyInstalled)
    }

    /// True once a handler has been installed.
    pub fn is_installed(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Invokes the installed handler and renders its reply.
    ///
    /// A panic inside the handler is caught here, never crossing further
    /// up the pipeline, and reported as [`BridgeError::HandlerFailed`].
    pub fn invoke(
        &self,
        method: Method,
        path: &str,
        params: &ParamMap,
    ) -> Result<RenderedResponse, BridgeError> {
        let handler = self.slot.get().ok_or(BridgeError::NotInstalled)?;
        let params_json = params.to_json();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            handler.call(method, path, &params_json)
        }));

        let bytes = match outcome {
            Ok(result) => result?,
            Err(_) => {
                warn!("handler panicked while serving {} {}", method, path);
                return Err(BridgeError::HandlerFailed("handler panicked".to_string()));
            }
        };

        Ok(HandlerReply::from_bytes(&bytes)?.into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_envelope() {
        let reply = HandlerReply::from_bytes(
            br#"{"body": "{\"id\":\"42\"}", "status": 200, "headers": {"Content-Type": "application/json", "X-Trace": "abc"}}"#,
        )
        .unwrap();
        let resp = reply.into_response();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type, "application/json");
        assert_eq!(resp.extra_headers, vec![("X-Trace".to_string(), "abc".to_string())]);
        assert_eq!(resp.body, br#"{"id":"42"}"#);
    }

    #[test]
    fn envelope_without_status_defaults_to_200() {
        let reply = HandlerReply::from_bytes(br#"{"body": "hi"}"#).unwrap();
        assert!(matches!(
            reply,
            HandlerReply::Structured { status: 200, .. }
        ));
    }

    #[test]
    fn tuple_with_status_maps_to_json() {
        let reply = HandlerReply::from_bytes(br#"[{"ok":true}, 201]"#).unwrap();
        let resp = reply.into_response();
        assert_eq!(resp.status, 201);
        assert_eq!(resp.content_type, "application/json");
        assert_eq!(resp.body, br#"{"ok":true}"#);
    }

    #[test]
    fn bare_object_is_served_as_json() {
        let reply = HandlerReply::from_bytes(br#"{"message": "hello"}"#).unwrap();
        let resp = reply.into_response();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type, "application/json");
    }

    #[test]
    fn bare_string_is_served_as_text() {
        let reply = HandlerReply::from_bytes(br#""pong""#).unwrap();
        let resp = reply.into_response();
        assert_eq!(resp.content_type, "text/plain");
        assert_eq!(resp.body, b"pong");
    }

    #[test]
    fn non_json_reply_is_malformed() {
        assert!(matches!(
            HandlerReply::from_bytes(b"<html>oops</html>"),
            Err(BridgeError::MalformedReply(_))
        ));
    }

    #[test]
    fn out_of_range_status_is_malformed() {
        assert!(matches!(
            HandlerReply::from_bytes(br#"{"body": "x", "status": 9000}"#),
            Err(BridgeError::MalformedReply(_))
        ));
    }

    struct Panicker;
    impl Handler for Panicker {
        fn call(&self, _: Method, _: &str, _: &str) -> Result<Vec<u8>, BridgeError> {
            panic!("boom");
        }
    }

    #[test]
    fn panics_are_contained() {
        let bridge = HandlerBridge::new();
        bridge.install(Box::new(Panicker)).unwrap();
        let err = bridge
            .invoke(Method::Get, "/x", &ParamMap::new())
            .unwrap_err();
        assert!(matches!(err, BridgeError::HandlerFailed(_)));
    }

    #[test]
    fn second_install_is_rejected() {
        let bridge = HandlerBridge::new();
        bridge.install(Box::new(Panicker)).unwrap();
        assert!(matches!(
            bridge.install(Box::new(Panicker)),
            Err(BridgeError::AlreadyInstalled)
        ));
    }

    #[test]
    fn invoke_without_handler_reports_not_installed() {
        let bridge = HandlerBridge::new();
        assert!(matches!(
            bridge.invoke(Method::Get, "/x", &ParamMap::new()),
            Err(BridgeError::NotInstalled)
        ));
    }
}
