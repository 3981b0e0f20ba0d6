//! HTTP/1.1 response serialization.

use crate::models::response::RenderedResponse;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Reason phrase for the status codes the engine can emit.
///
/// Unknown codes fall back to a neutral phrase rather than failing, since
/// host handlers may return any status in range.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        413 => "Payload Too Large",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

/// Serializes one response: status line, managed headers, host-supplied
/// extras, blank line, body.
///
/// `Content-Type`, `Content-Length` and `Connection` are managed by the
/// engine; host-supplied duplicates of those names are dropped so the
/// frame stays coherent.
pub async fn write_response<W>(
    writer: &mut W,
    response: &RenderedResponse,
    close: bool,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut head = String::with_capacity(128 + response.extra_headers.len() * 32);
    head.push_str("HTTP/1.1 ");
    head.push_str(&response.status.to_string());
    head.push(' ');
    head.push_str(reason_phrase(response.status));
    head.push_str("\r\n");

    head.push_str("Content-Type: ");
    head.push_str(&response.content_type);
    head.push_str("\r\n");

    head.push_str("Content-Length: ");
    head.push_str(&response.body_len().to_string());
    head.push_str("\r\n");

    for (name, value) in &response.extra_headers {
        if name.eq_ignore_ascii_case("content-type")
            || name.eq_ignore_ascii_case("content-length")
            || name.eq_ignore_ascii_case("connection")
        {
            continue;
        }
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }

    head.push_str(if close {
        "Connection: close\r\n"
    } else {
        "Connection: keep-alive\r\n"
    });
    head.push_str("\r\n");

    writer.write_all(head.as_bytes()).await?;
    writer.write_all(&response.body).await?;
    writer.flush().await
}
