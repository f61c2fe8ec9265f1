//! Static file serving module
//!
//! Translates request paths into paths under the served root, then serves
//! files, index files, or generated directory listings.

use crate::config::AppState;
use crate::handler::listing;
use crate::handler::router::RequestContext;
use crate::http::{self, cache::Validators, mime, HttpResponse};
use crate::logger;
use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Why a request path could not be mapped under the served root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Percent-decoding produced invalid UTF-8
    BadEncoding,
    /// A segment tried to leave the root (`..`, drive prefix, separator tricks)
    Traversal,
}

/// Request path mapped onto the filesystem, before any disk access
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedPath {
    pub fs_path: PathBuf,
    /// Decoded URL path, used as the listing title
    pub display: String,
}

/// Map a URL path (without query) to a path under `root`.
///
/// Empty and `.` segments are dropped. Any segment that could step outside
/// the root is rejected rather than silently removed.
pub fn translate_path(root: &Path, url_path: &str) -> Result<TranslatedPath, PathError> {
    let decoded = urlencoding::decode(url_path).map_err(|_| PathError::BadEncoding)?;

    let mut fs_path = root.to_path_buf();
    for segment in decoded.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment.contains(['\\', '\0']) {
            return Err(PathError::Traversal);
        }
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) => fs_path.push(part),
            _ => return Err(PathError::Traversal),
        }
    }

    Ok(TranslatedPath {
        fs_path,
        display: decoded.into_owned(),
    })
}

/// Canonicalize `path` and make sure it is still inside `root`.
///
/// Catches symlinks pointing out of the served tree. `None` covers both a
/// missing path and an escape; escapes are logged.
async fn resolve_within(root: &Path, path: &Path, request_path: &str) -> Option<PathBuf> {
    let canonical = fs::canonicalize(path).await.ok()?;
    if canonical.starts_with(root) {
        Some(canonical)
    } else {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            request_path,
            canonical.display()
        ));
        None
    }
}

/// Serve the request path from the served root
pub async fn serve_path(ctx: &RequestContext<'_>, state: &AppState) -> HttpResponse {
    let translated = match translate_path(&state.root, ctx.path) {
        Ok(t) => t,
        Err(PathError::BadEncoding) => {
            logger::log_warning(&format!("Undecodable request path: {}", ctx.path));
            return http::build_400_response(ctx.is_head);
        }
        Err(PathError::Traversal) => {
            logger::log_warning(&format!("Path traversal attempt blocked: {}", ctx.path));
            return http::build_404_response(ctx.is_head);
        }
    };

    // File not found is common (404), no need to log
    let Some(resolved) = resolve_within(&state.root, &translated.fs_path, ctx.path).await else {
        return http::build_404_response(ctx.is_head);
    };
    let Ok(metadata) = fs::metadata(&resolved).await else {
        return http::build_404_response(ctx.is_head);
    };

    if metadata.is_dir() {
        return serve_directory(ctx, state, &resolved, &translated.display).await;
    }

    // "file.txt/" names a directory that does not exist
    if ctx.path.ends_with('/') {
        return http::build_404_response(ctx.is_head);
    }

    serve_file(ctx, &resolved, &metadata).await
}

async fn serve_directory(
    ctx: &RequestContext<'_>,
    state: &AppState,
    dir: &Path,
    display_path: &str,
) -> HttpResponse {
    // Relative links in the page only work once the URL ends with '/'
    if !ctx.path.ends_with('/') {
        return http::build_301_response(&slash_redirect_location(ctx.path, ctx.query));
    }

    for index_file in &state.config.http.index_files {
        let Some(index_path) = resolve_within(&state.root, &dir.join(index_file), ctx.path).await
        else {
            continue;
        };
        if let Ok(metadata) = fs::metadata(&index_path).await {
            if metadata.is_file() {
                return serve_file(ctx, &index_path, &metadata).await;
            }
        }
    }

    if !state.config.http.directory_listing {
        return http::build_404_response(ctx.is_head);
    }

    match listing::read_listing(dir).await {
        Ok(entries) => {
            let html = listing::render_listing(display_path, &entries);
            http::response::build_html_response(html, ctx.is_head)
        }
        Err(e) => {
            logger::log_warning(&format!(
                "No permission to list directory '{}': {e}",
                dir.display()
            ));
            http::build_404_response(ctx.is_head)
        }
    }
}

/// Location for the trailing-slash redirect.
///
/// Leading slashes are collapsed to one: `//host/dir/` would be read by
/// browsers as a protocol-relative URL pointing at another host.
fn slash_redirect_location(path: &str, query: Option<&str>) -> String {
    let path = path.trim_start_matches('/');
    match query {
        Some(q) => format!("/{path}/?{q}"),
        None => format!("/{path}/"),
    }
}

async fn serve_file(ctx: &RequestContext<'_>, path: &Path, metadata: &Metadata) -> HttpResponse {
    let validators = Validators::from_metadata(metadata);
    if validators.is_not_modified(ctx.if_none_match.as_deref(), ctx.if_modified_since.as_deref()) {
        return http::build_304_response(&validators);
    }

    let body = if ctx.is_head {
        http::response::empty_body()
    } else {
        match fs::File::open(path).await {
            Ok(file) => http::response::file_body(file),
            Err(e) => {
                logger::log_error(&format!("Failed to open file '{}': {}", path.display(), e));
                return http::build_404_response(ctx.is_head);
            }
        }
    };

    http::response::build_file_response(
        body,
        metadata.len(),
        mime::content_type_for(path),
        &validators,
    )
}
