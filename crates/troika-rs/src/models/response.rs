/// A fully rendered HTTP response, ready for serialization.
///
/// Every tier produces one of these: static entries are stored pre-rendered
/// at registration time, cache entries hold one behind an `Arc`, and the
/// handler bridge builds one from the host's reply envelope. The struct is
/// immutable by convention once constructed; concurrent readers share it
/// rather than copying the body.
///
/// `extra_headers` carries host-supplied headers beyond `Content-Type`;
/// the serializer emits them verbatim after the managed headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Value for the `Content-Type` header.
    pub content_type: String,
    /// Additional response headers in emission order.
    pub extra_headers: Vec<(String, String)>,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl RenderedResponse {
    /// Builds a response with no extra headers.
    pub fn new(status: u16, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            extra_headers: Vec::new(),
            body,
        }
    }

    /// Builds an `application/json` response from a serialized body.
    pub fn json(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, "application/json", body.into())
    }

    /// Builds the engine's uniform error body: `{"error": "<category>"}`.
    ///
    /// User-visible failures never expose internals beyond the category
    /// name, so this is the only error shape the engine serves.
    pub fn error_json(status: u16, category: &str) -> Self {
        let body = format!("{{\"error\":\"{}\"}}", category);
        Self::json(status, body.into_bytes())
    }

    /// Body length in bytes, used for `Content-Length`.
    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}
