//! # Kopdesk Common Library
//!
//! Shared code for the Kopdesk cooperative-administration crates:
//! - Error type
//! - Configuration loading and value resolution
//! - HTTP response envelope types
//! - Clock helpers

pub mod api;
pub mod config;
pub mod error;
pub mod time;

pub use config::Cadence;
pub use error::{Error, Result};
