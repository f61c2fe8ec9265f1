//! Logger module
//!
//! Provides logging utilities for the file server including:
//! - The startup line (`Serving at port N`) on stdout
//! - Access logging with multiple formats
//! - Error, warning and debug diagnostics gated by `logging.level`
//! - File-based logging support

mod format;
pub mod writer;

pub use format::{AccessLogEntry, LogFormat};

use crate::config::{AppState, Config};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};

/// Diagnostic verbosity, ordered from quietest to loudest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl Level {
    /// Unknown names fall back to `Info`
    pub fn parse(level: &str) -> Self {
        match level.to_ascii_lowercase().as_str() {
            "error" => Self::Error,
            "warn" | "warning" => Self::Warn,
            "debug" | "trace" => Self::Debug,
            _ => Self::Info,
        }
    }

    const fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Error,
            1 => Self::Warn,
            3 => Self::Debug,
            _ => Self::Info,
        }
    }
}

static LEVEL: AtomicU8 = AtomicU8::new(Level::Info as u8);

fn enabled(level: Level) -> bool {
    level <= Level::from_u8(LEVEL.load(Ordering::Relaxed))
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    LEVEL.store(Level::parse(&config.logging.level) as u8, Ordering::Relaxed);
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => eprintln!("{message}"),
    }
}

/// Announce the bound port. This is the only line the server prints on stdout.
pub fn log_server_start(addr: &SocketAddr, state: &AppState) {
    println!("Serving at port {}", addr.port());

    log_debug(&format!("Listening on: http://{addr}"));
    log_debug(&format!("Serving root: {}", state.root.display()));
    if let Some(workers) = state.config.server.workers {
        log_debug(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = state.config.logging.access_log_file {
        log_debug(&format!("Access log: {path}"));
    }
    if let Some(ref path) = state.config.logging.error_log_file {
        log_debug(&format!("Error log: {path}"));
    }
}

pub fn log_shutdown(in_flight: usize) {
    if enabled(Level::Info) {
        write_error(&format!(
            "[INFO] Shutting down, {in_flight} connection(s) still open"
        ));
    }
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    if enabled(Level::Warn) {
        write_error(&format!("[WARN] Failed to serve connection: {err}"));
    }
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    if enabled(Level::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}

pub fn log_debug(message: &str) {
    if enabled(Level::Debug) {
        write_error(&format!("[DEBUG] {message}"));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &LogFormat) {
    write_access(&entry.format(format));
}
