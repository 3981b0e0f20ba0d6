//! Incremental HTTP/1.1 request parsing with hard resource bounds.
//!
//! The parser reads the request line, the header block, and the full body
//! (per `Content-Length`) from a buffered stream. Everything is bounded:
//! an oversized request line or header block is a parse error, and bodies
//! are capped so a client cannot exhaust memory. Chunked transfer coding
//! is not supported: bodies are read fully into memory before dispatch.

use crate::models::method::Method;
use std::io;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Maximum accepted request-line length in bytes.
pub const MAX_REQUEST_LINE: usize = 8 * 1024;
/// Maximum accepted length of a single header line in bytes.
pub const MAX_HEADER_LINE: usize = 8 * 1024;
/// Maximum number of headers per request.
pub const MAX_HEADERS: usize = 64;
/// Maximum accepted body length in bytes.
pub const MAX_BODY: usize = 1024 * 1024;

/// Errors raised while reading one request off the wire.
///
/// Every variant maps to an HTTP status via [`ParseError::status`]; the
/// connection is closed after reporting it.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The request line exceeded [`MAX_REQUEST_LINE`].
    #[error("Request line exceeds {MAX_REQUEST_LINE} bytes")]
    RequestLineTooLong,

    /// The request line was not `<method> <target> <version>`.
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    /// The method token is not one of the engine's uppercase verbs.
    #[error("Unsupported method token: {0}")]
    UnsupportedMethod(String),

    /// The protocol version is not HTTP/1.0 or HTTP/1.1.
    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(String),

    /// A header line was missing its colon or oversized.
    #[error("Malformed header line: {0}")]
    MalformedHeader(String),

    /// More than [`MAX_HEADERS`] header lines.
    #[error("Too many headers")]
    TooManyHeaders,

    /// `Content-Length` was not a valid integer.
    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),

    /// Chunked or other transfer codings are not supported.
    #[error("Unsupported Transfer-Encoding")]
    UnsupportedTransferEncoding,

    /// Declared body length exceeds [`MAX_BODY`].
    #[error("Body of {0} bytes exceeds limit")]
    BodyTooLarge(u64),

    /// The peer closed the connection mid-request.
    #[error("Connection closed mid-request")]
    UnexpectedEof,

    /// Transport failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ParseError {
    /// The HTTP status this error is reported as.
    pub fn status(&self) -> u16 {
        match self {
            ParseError::BodyTooLarge(_) => 413,
            _ => 400,
        }
    }

    /// The category name used in the JSON error body.
    pub fn category(&self) -> &'static str {
        match self {
            ParseError::BodyTooLarge(_) => "payload_too_large",
            _ => "bad_request",
        }
    }
}

/// One parsed request, body fully in memory.
#[derive(Debug)]
pub struct Request {
    pub method: Method,
    /// Path with the query string stripped.
    pub path: String,
    /// Raw query string after `?`, if any. Not part of route matching or
    /// the cache key.
    pub query: Option<String>,
    /// `1` for HTTP/1.1, `0` for HTTP/1.0.
    pub version_minor: u8,
    /// Headers in arrival order, values with leading whitespace trimmed.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    /// Case-insensitive header lookup, first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the connection must close after this exchange.
    ///
    /// HTTP/1.1 defaults to keep-alive unless `Connection: close`;
    /// HTTP/1.0 defaults to close unless `Connection: keep-alive`.
    pub fn wants_close(&self) -> bool {
        match self.header("connection") {
            Some(value) if value.eq_ignore_ascii_case("close") => true,
            Some(value) if value.eq_ignore_ascii_case("keep-alive") => false,
            _ => self.version_minor == 0,
        }
    }
}

/// Reads one request from the stream.
///
/// Returns `Ok(None)` when the peer closed the connection cleanly between
/// requests, the normal end of a keep-alive session.
pub async fn read_request<R>(reader: &mut R) -> Result<Option<Request>, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let line = match read_line_bounded(reader, MAX_REQUEST_LINE, true).await {
        Ok(Some(line)) => line,
        Ok(None) => return Ok(None),
        Err(LineError::TooLong) => return Err(ParseError::RequestLineTooLong),
        Err(LineError::Eof) => return Err(ParseError::UnexpectedEof),
        Err(LineError::NotUtf8) => {
            return Err(ParseError::MalformedRequestLine("non-UTF-8 bytes".into()))
        }
        Err(LineError::Io(e)) => return Err(ParseError::Io(e)),
    };

    let (method, target, version_minor) = parse_request_line(&line)?;
    let (path, query) = split_target(target);

    let headers = read_headers(reader).await?;
    let body = read_body(reader, &headers).await?;

    Ok(Some(Request {
        method,
        path: path.to_string(),
        query: query.map(str::to_string),
        version_minor,
        headers,
        body,
    }))
}

fn parse_request_line(line: &str) -> Result<(Method, &str, u8), ParseError> {
    let mut parts = line.split_whitespace();
    let (method_token, target, version) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(m), Some(t), Some(v), None) => (m, t, v),
        _ => return Err(ParseError::MalformedRequestLine(truncate(line))),
    };

    let method = Method::parse(method_token)
        .ok_or_else(|| ParseError::UnsupportedMethod(method_token.to_string()))?;

    if !target.starts_with('/') {
        return Err(ParseError::MalformedRequestLine(truncate(line)));
    }

    let version_minor = match version {
        "HTTP/1.1" => 1,
        "HTTP/1.0" => 0,
        other => return Err(ParseError::UnsupportedVersion(other.to_string())),
    };

    Ok((method, target, version_minor))
}

/// Splits a request target at the first `?`.
fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

async fn read_headers<R>(reader: &mut R) -> Result<Vec<(String, String)>, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut headers = Vec::new();
    loop {
        let line = match read_line_bounded(reader, MAX_HEADER_LINE, false).await {
            Ok(Some(line)) => line,
            Ok(None) | Err(LineError::Eof) => return Err(ParseError::UnexpectedEof),
            Err(LineError::TooLong) => {
                return Err(ParseError::MalformedHeader("header line too long".into()))
            }
            Err(LineError::NotUtf8) => {
                return Err(ParseError::MalformedHeader("non-UTF-8 bytes".into()))
            }
            Err(LineError::Io(e)) => return Err(ParseError::Io(e)),
        };

        if line.is_empty() {
            return Ok(headers);
        }
        if headers.len() == MAX_HEADERS {
            return Err(ParseError::TooManyHeaders);
        }

        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ParseError::MalformedHeader(truncate(&line)))?;
        if name.is_empty() || name.contains(' ') {
            return Err(ParseError::MalformedHeader(truncate(&line)));
        }
        headers.push((name.to_string(), value.trim_start().to_string()));
    }
}

async fn read_body<R>(
    reader: &mut R,
    headers: &[(String, String)],
) -> Result<Vec<u8>, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    if headers
        .iter()
        .any(|(n, _)| n.eq_ignore_ascii_case("transfer-encoding"))
    {
        return Err(ParseError::UnsupportedTransferEncoding);
    }

    let length = match headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
    {
        None => return Ok(Vec::new()),
        Some((_, value)) => value
            .trim()
            .parse::<u64>()
            .map_err(|_| ParseError::InvalidContentLength(value.clone()))?,
    };

    if length > MAX_BODY as u64 {
        return Err(ParseError::BodyTooLarge(length));
    }

    let mut body = vec![0u8; length as usize];
    reader
        .read_exact(&mut body)
        .await
        .map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => ParseError::UnexpectedEof,
            _ => ParseError::Io(e),
        })?;
    Ok(body)
}

enum LineError {
    TooLong,
    Eof,
    NotUtf8,
    Io(io::Error),
}

/// Reads one CRLF- (or LF-) terminated line, enforcing `limit`.
///
/// `allow_clean_close` distinguishes the idle point between keep-alive
/// requests (EOF is normal, yields `Ok(None)`) from EOF in the middle of
/// a message (an error).
async fn read_line_bounded<R>(
    reader: &mut R,
    limit: usize,
    allow_clean_close: bool,
) -> Result<Option<String>, LineError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line: Vec<u8> = Vec::new();
    loop {
        let (consumed, done) = {
            let buf = match reader.fill_buf().await {
                Ok(buf) => buf,
                Err(e) => return Err(LineError::Io(e)),
            };
            if buf.is_empty() {
                if line.is_empty() && allow_clean_close {
                    return Ok(None);
                }
                return Err(LineError::Eof);
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    if line.len() + pos > limit {
                        return Err(LineError::TooLong);
                    }
                    line.extend_from_slice(&buf[..pos]);
                    (pos + 1, true)
                }
                None => {
                    if line.len() + buf.len() > limit {
                        return Err(LineError::TooLong);
                    }
                    line.extend_from_slice(buf);
                    (buf.len(), false)
                }
            }
        };
        reader.consume(consumed);
        if done {
            break;
        }
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    String::from_utf8(line)
        .map(Some)
        .map_err(|_| LineError::NotUtf8)
}

fn truncate(line: &str) -> String {
    const SHOWN: usize = 80;
    if line.len() <= SHOWN {
        line.to_string()
    } else {
        let mut end = SHOWN;
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &line[..end])
    }
}
