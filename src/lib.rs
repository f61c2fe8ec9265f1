//! Static file server for cross-origin isolated pages.
//!
//! Serves the working directory over HTTP/1 and adds
//! `Cross-Origin-Opener-Policy: same-origin` and
//! `Cross-Origin-Embedder-Policy: require-corp` to every response, which
//! browsers require before enabling `SharedArrayBuffer` and WebAssembly
//! threads.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use config::{AppState, Config};
pub use error::ServerError;
pub use server::Server;
