// Application state module
// Runtime state shared by every connection task

use std::path::{Path, PathBuf};

use hyper::header::HeaderValue;

use super::types::Config;
use crate::error::ServerError;
use crate::http::headers::server_header;
use crate::logger::LogFormat;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Canonical served root, resolved once at startup
    pub root: PathBuf,
    /// `Server` header sent on every response
    pub server_header: HeaderValue,
    pub access_log_format: LogFormat,
    pub access_log: bool,
}

impl AppState {
    /// Resolve the served root and build the state.
    ///
    /// The root is canonicalized here so every containment check later
    /// compares canonical paths.
    pub fn new(config: &Config) -> Result<Self, ServerError> {
        let root = canonical_root(Path::new(&config.server.root))?;

        Ok(Self {
            config: config.clone(),
            root,
            server_header: server_header(&config.http.server_name),
            access_log_format: LogFormat::parse(&config.logging.access_log_format),
            access_log: config.logging.access_log,
        })
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.access_log
    }
}

fn canonical_root(path: &Path) -> Result<PathBuf, ServerError> {
    let root = path.canonicalize().map_err(|source| ServerError::Root {
        path: path.to_path_buf(),
        source,
    })?;

    if !root.is_dir() {
        return Err(ServerError::Root {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
        });
    }

    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_canonicalized() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.server.root = dir.path().join(".").to_string_lossy().into_owned();

        let state = AppState::new(&cfg).unwrap();
        assert_eq!(state.root, dir.path().canonicalize().unwrap());
        assert!(state.access_log_enabled());
    }

    #[test]
    fn test_access_log_follows_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.server.root = dir.path().to_string_lossy().into_owned();
        cfg.logging.access_log = false;

        assert!(!AppState::new(&cfg).unwrap().access_log_enabled());
    }

    #[test]
    fn test_missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::default();
        cfg.server.root = dir.path().join("missing").to_string_lossy().into_owned();

        assert!(matches!(AppState::new(&cfg), Err(ServerError::Root { .. })));
    }

    #[test]
    fn test_file_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();
        let mut cfg = Config::default();
        cfg.server.root = file.to_string_lossy().into_owned();

        assert!(matches!(AppState::new(&cfg), Err(ServerError::Root { .. })));
    }
}
