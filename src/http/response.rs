//! HTTP response building module
//!
//! Builders for the statuses the file server produces. Bodies are sent
//! empty on HEAD while `Content-Length` still reports the GET length.
//! File contents are streamed from disk; everything else is a small
//! in-memory body.

use std::io;

use futures::stream;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::Response;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use super::cache::Validators;

/// Bytes read from disk per body frame
const READ_CHUNK_SIZE: usize = 64 * 1024;

pub type ResponseBody = UnsyncBoxBody<Bytes, io::Error>;
pub type HttpResponse = Response<ResponseBody>;

/// In-memory body
pub fn full_body(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

pub fn empty_body() -> ResponseBody {
    full_body(Bytes::new())
}

/// Body that reads `file` in chunks as hyper polls it.
///
/// A read error ends the stream with that error, which makes hyper abort
/// the connection instead of sending a short body.
pub fn file_body(file: File) -> ResponseBody {
    StreamBody::new(stream::try_unfold(file, read_chunk)).boxed_unsync()
}

async fn read_chunk(mut file: File) -> io::Result<Option<(Frame<Bytes>, File)>> {
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    let n = file.read(&mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    buf.truncate(n);
    Ok(Some((Frame::data(Bytes::from(buf)), file)))
}

/// Build 200 response for a file.
///
/// `content_length` comes from the file metadata; `body` is
/// [`file_body`] for GET and [`empty_body`] for HEAD.
pub fn build_file_response(
    body: ResponseBody,
    content_length: u64,
    content_type: &str,
    validators: &Validators,
) -> HttpResponse {
    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("Last-Modified", validators.last_modified_header())
        .header("ETag", &validators.etag)
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(empty_body())
        })
}

/// Build 200 HTML response (generated directory listings)
pub fn build_html_response(content: String, is_head: bool) -> HttpResponse {
    let content_length = content.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(content)
    };

    Response::builder()
        .status(200)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content_length)
        .body(full_body(body))
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            Response::new(empty_body())
        })
}

/// Build 301 redirect adding the trailing slash to a directory URL
pub fn build_301_response(location: &str) -> HttpResponse {
    Response::builder()
        .status(301)
        .header("Location", location)
        .header("Content-Length", 0)
        .body(empty_body())
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            Response::new(empty_body())
        })
}

/// Build 304 Not Modified response
pub fn build_304_response(validators: &Validators) -> HttpResponse {
    Response::builder()
        .status(304)
        .header("ETag", &validators.etag)
        .header("Last-Modified", validators.last_modified_header())
        .body(empty_body())
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(empty_body())
        })
}

/// Build 400 Bad Request response
pub fn build_400_response(is_head: bool) -> HttpResponse {
    build_error_response(400, "400 Bad Request", is_head)
}

/// Build 404 Not Found response
pub fn build_404_response(is_head: bool) -> HttpResponse {
    build_error_response(404, "404 Not Found", is_head)
}

/// Build 501 Not Implemented response for methods other than GET/HEAD
pub fn build_501_response() -> HttpResponse {
    let mut response = build_error_response(501, "501 Unsupported method", false);
    response
        .headers_mut()
        .insert("Allow", hyper::header::HeaderValue::from_static("GET, HEAD"));
    response
}

fn build_error_response(status: u16, message: &'static str, is_head: bool) -> HttpResponse {
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from_static(message.as_bytes())
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", message.len())
        .body(full_body(body))
        .unwrap_or_else(|e| {
            log_build_error(message, &e);
            let mut fallback = Response::new(full_body(message));
            *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
