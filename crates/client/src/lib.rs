// crates/client/src/lib.rs
//! HTTP client for the data-agent backend.
//!
//! Controllers in `datadesk-core` only see the [`Backend`] trait; the
//! production implementation is [`HttpBackend`], a thin `reqwest` wrapper
//! that maps each backend route to one method.

pub mod backend;
pub mod config;
pub mod error;
pub mod http;

pub use backend::{Backend, CsvFile, SharedBackend};
pub use config::ClientConfig;
pub use error::ClientError;
pub use http::HttpBackend;
