//! # feed-digest
//!
//! Command-line host for [`digest_search`]: loads a TOML configuration,
//! runs one of the three retrieval pipelines (pooled search, feed digest,
//! issue digest) and prints the merged report as JSON.

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

pub use config::DigestConfig;
pub use error::{AppError, Result};
