//! Request dispatch module
//!
//! Entry point for HTTP request processing: method validation, dispatch to
//! the file server, and header finalization of whatever comes back.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http::{self, HttpResponse};
use crate::logger;
use hyper::{Method, Request};
use std::convert::Infallible;
use std::sync::Arc;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// Raw (still percent-encoded) URL path
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
}

impl<'a> RequestContext<'a> {
    pub fn from_request<B>(req: &'a Request<B>) -> Self {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };

        Self {
            path: req.uri().path(),
            query: req.uri().query(),
            is_head: req.method() == Method::HEAD,
            if_none_match: header("if-none-match"),
            if_modified_since: header("if-modified-since"),
        }
    }
}

/// Main entry point for HTTP request handling
///
/// The body is never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<HttpResponse, Infallible> {
    let rejected = check_request(&req);
    let response = match rejected {
        Some(resp) => resp,
        None => {
            let ctx = RequestContext::from_request(&req);
            static_files::serve_path(&ctx, &state).await
        }
    };

    Ok(http::finalize(response, &state.server_header))
}

/// Reject requests the file server cannot answer
fn check_request<B>(req: &Request<B>) -> Option<HttpResponse> {
    if let Some(resp) = check_http_method(req.method()) {
        return Some(resp);
    }

    // Only origin-form targets ("/path") map onto the served root
    if !req.uri().path().starts_with('/') {
        logger::log_warning(&format!("Unsupported request target: {}", req.uri()));
        return Some(http::build_400_response(req.method() == Method::HEAD));
    }

    None
}

/// Check HTTP method, returning 501 for anything but GET/HEAD
fn check_http_method(method: &Method) -> Option<HttpResponse> {
    match *method {
        Method::GET | Method::HEAD => None,
        _ => {
            logger::log_warning(&format!("Unsupported method: {method}"));
            Some(http::build_501_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::http::headers::{CROSS_ORIGIN_EMBEDDER_POLICY, CROSS_ORIGIN_OPENER_POLICY};
    use http_body_util::BodyExt;
    use hyper::body::Bytes;
    use tempfile::TempDir;

    fn state_for(dir: &TempDir) -> Arc<AppState> {
        let mut cfg = Config::default();
        cfg.server.root = dir.path().to_string_lossy().into_owned();
        Arc::new(AppState::new(&cfg).unwrap())
    }

    async fn send(state: &Arc<AppState>, method: Method, uri: &str) -> HttpResponse {
        let req = Request::builder().method(method).uri(uri).body(()).unwrap();
        handle_request(req, Arc::clone(state)).await.unwrap()
    }

    async fn body(response: HttpResponse) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    fn assert_isolated(response: &HttpResponse) {
        let headers = response.headers();
        assert_eq!(headers.get_all(CROSS_ORIGIN_OPENER_POLICY).iter().count(), 1);
        assert_eq!(headers.get_all(CROSS_ORIGIN_EMBEDDER_POLICY).iter().count(), 1);
        assert_eq!(headers.get(CROSS_ORIGIN_OPENER_POLICY).unwrap(), "same-origin");
        assert_eq!(headers.get(CROSS_ORIGIN_EMBEDDER_POLICY).unwrap(), "require-corp");
    }

    #[tokio::test]
    async fn test_serves_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), b"hello").unwrap();
        let state = state_for(&dir);

        let response = send(&state, Method::GET, "/index.html").await;
        assert_eq!(response.status(), 200);
        assert_isolated(&response);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/html; charset=utf-8"
        );
        assert_eq!(response.headers().get("content-length").unwrap(), "5");
        assert!(response.headers().contains_key("server"));
        assert_eq!(body(response).await, "hello");
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.json"), b"{\"a\":1}").unwrap();
        let state = state_for(&dir);

        let response = send(&state, Method::HEAD, "/data.json").await;
        assert_eq!(response.status(), 200);
        assert_isolated(&response);
        assert_eq!(response.headers().get("content-length").unwrap(), "7");
        assert!(body(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(&dir);

        let response = send(&state, Method::GET, "/does-not-exist").await;
        assert_eq!(response.status(), 404);
        assert_isolated(&response);
    }

    #[tokio::test]
    async fn test_traversal_is_not_served() {
        let outer = tempfile::tempdir().unwrap();
        std::fs::write(outer.path().join("secret.txt"), b"secret").unwrap();
        let served = outer.path().join("www");
        std::fs::create_dir(&served).unwrap();

        let mut cfg = Config::default();
        cfg.server.root = served.to_string_lossy().into_owned();
        let state = Arc::new(AppState::new(&cfg).unwrap());

        for uri in ["/../secret.txt", "/%2e%2e/secret.txt", "/../../etc/passwd"] {
            let response = send(&state, Method::GET, uri).await;
            assert_eq!(response.status(), 404, "{uri}");
            assert_isolated(&response);
            assert_ne!(body(response).await, "secret");
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_out_of_root_is_not_served() {
        let outer = tempfile::tempdir().unwrap();
        std::fs::write(outer.path().join("secret.txt"), b"secret").unwrap();
        let served = outer.path().join("www");
        std::fs::create_dir(&served).unwrap();
        std::os::unix::fs::symlink(outer.path().join("secret.txt"), served.join("leak.txt"))
            .unwrap();

        let mut cfg = Config::default();
        cfg.server.root = served.to_string_lossy().into_owned();
        let state = Arc::new(AppState::new(&cfg).unwrap());

        let response = send(&state, Method::GET, "/leak.txt").await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_unsupported_method() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(&dir);

        let response = send(&state, Method::POST, "/").await;
        assert_eq!(response.status(), 501);
        assert_eq!(response.headers().get("allow").unwrap(), "GET, HEAD");
        assert_isolated(&response);
    }

    #[tokio::test]
    async fn test_bad_encoding_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(&dir);

        let response = send(&state, Method::GET, "/%ff").await;
        assert_eq!(response.status(), 400);
        assert_isolated(&response);
    }

    #[tokio::test]
    async fn test_directory_redirect_and_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/index.htm"), b"docs home").unwrap();
        let state = state_for(&dir);

        let response = send(&state, Method::GET, "/docs?lang=en").await;
        assert_eq!(response.status(), 301);
        assert_eq!(response.headers().get("location").unwrap(), "/docs/?lang=en");
        assert_isolated(&response);

        let response = send(&state, Method::GET, "/docs/").await;
        assert_eq!(response.status(), 200);
        assert_eq!(body(response).await, "docs home");
    }

    #[tokio::test]
    async fn test_directory_redirect_collapses_leading_slashes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("evil.example")).unwrap();
        let state = state_for(&dir);

        for uri in ["//evil.example", "///evil.example"] {
            let response = send(&state, Method::GET, uri).await;
            assert_eq!(response.status(), 301, "{uri}");
            assert_eq!(response.headers().get("location").unwrap(), "/evil.example/");
            assert_isolated(&response);
        }
    }

    #[tokio::test]
    async fn test_directory_listing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("worker.js"), b"").unwrap();
        std::fs::create_dir(dir.path().join("pkg")).unwrap();
        let state = state_for(&dir);

        let response = send(&state, Method::GET, "/").await;
        assert_eq!(response.status(), 200);
        assert_isolated(&response);
        let html = body(response).await;
        let html = String::from_utf8_lossy(&html);
        assert!(html.contains("Directory listing for /"));
        assert!(html.contains("<a href=\"pkg/\">pkg/</a>"));
        assert!(html.contains("<a href=\"worker.js\">worker.js</a>"));
    }

    #[tokio::test]
    async fn test_listing_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.server.root = dir.path().to_string_lossy().into_owned();
        cfg.http.directory_listing = false;
        let state = Arc::new(AppState::new(&cfg).unwrap());

        let response = send(&state, Method::GET, "/").await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_trailing_slash_on_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        let state = state_for(&dir);

        let response = send(&state, Method::GET, "/a.txt/").await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_conditional_get() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.wasm"), b"\0asm").unwrap();
        let state = state_for(&dir);

        let first = send(&state, Method::GET, "/app.wasm").await;
        assert_eq!(first.headers().get("content-type").unwrap(), "application/wasm");
        let etag = first.headers().get("etag").unwrap().clone();
        let last_modified = first.headers().get("last-modified").unwrap().clone();

        let req = Request::builder()
            .uri("/app.wasm")
            .header("If-None-Match", etag)
            .body(())
            .unwrap();
        let response = handle_request(req, Arc::clone(&state)).await.unwrap();
        assert_eq!(response.status(), 304);
        assert_isolated(&response);

        let req = Request::builder()
            .uri("/app.wasm")
            .header("If-Modified-Since", last_modified)
            .body(())
            .unwrap();
        let response = handle_request(req, Arc::clone(&state)).await.unwrap();
        assert_eq!(response.status(), 304);
    }
}
