//! # reelstats common library
//!
//! Shared code for the reelstats crates:
//! - Error type ([`Error`], [`Result`])
//! - Configuration file model and resolution
//! - Tracing initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
