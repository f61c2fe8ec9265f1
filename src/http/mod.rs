//! HTTP protocol layer module
//!
//! Protocol helpers shared by the file handler: content types, cache
//! validators, response builders and the header finalization hook.

pub mod cache;
pub mod headers;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use headers::finalize;
pub use response::{
    build_301_response, build_304_response, build_400_response, build_404_response,
    build_501_response, HttpResponse,
};
