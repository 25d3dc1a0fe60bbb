//! Shared building blocks for the Kaiwu adapter and its hosting server

#![allow(clippy::must_use_candidate)]

pub mod error;
pub mod headers;

pub use error::HttpError;
pub use headers::{HeaderOverrides, bearer_authorization, combine_headers, is_header_denied};
