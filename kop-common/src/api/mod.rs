//! Shared HTTP API types
//!
//! The Kopdesk backend wraps every response in the same
//! `{success, message, data?, errors?, pagination?, links?}` envelope.
//! This module holds ONLY the wire types; the HTTP client itself lives in
//! the crates that talk to the backend.

pub mod types;

pub use types::{ApiResponse, Pagination, PaginationLinks};
