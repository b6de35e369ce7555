//! Dashboard backend REST client.
//!
//! This module provides the HTTP client for authentication, institution
//! listings and institution analytics.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
