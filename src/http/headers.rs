//! Response header finalization
//!
//! Every response passes through [`finalize`] after the handler built it
//! and before hyper writes it, so error responses get the same headers as
//! file responses. hyper adds `Date` itself.

use hyper::header::{HeaderMap, HeaderName, HeaderValue, SERVER};
use hyper::Response;

#[allow(clippy::declare_interior_mutable_const)]
pub const CROSS_ORIGIN_OPENER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-opener-policy");
#[allow(clippy::declare_interior_mutable_const)]
pub const CROSS_ORIGIN_EMBEDDER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-embedder-policy");

/// Headers that opt a page into cross-origin isolation
#[allow(clippy::declare_interior_mutable_const)]
pub const ISOLATION_HEADERS: [(HeaderName, HeaderValue); 2] = [
    (
        CROSS_ORIGIN_OPENER_POLICY,
        HeaderValue::from_static("same-origin"),
    ),
    (
        CROSS_ORIGIN_EMBEDDER_POLICY,
        HeaderValue::from_static("require-corp"),
    ),
];

/// Set the isolation headers, replacing any earlier value so each appears once
pub fn apply_isolation_headers(headers: &mut HeaderMap) {
    for (name, value) in ISOLATION_HEADERS {
        headers.insert(name, value);
    }
}

/// Final pass over an outgoing response
pub fn finalize<B>(mut response: Response<B>, server_name: &HeaderValue) -> Response<B> {
    let headers = response.headers_mut();
    apply_isolation_headers(headers);
    headers.insert(SERVER, server_name.clone());
    response
}

/// `Server` header value from the configured name, falling back to the crate name
pub fn server_header(server_name: &str) -> HeaderValue {
    HeaderValue::from_str(server_name)
        .unwrap_or_else(|_| HeaderValue::from_static(env!("CARGO_PKG_NAME")))
}
