//! HTTP route handlers.

pub mod cart;
pub mod ops;
pub mod orders;
pub mod products;

use std::str::FromStr;

use crate::error::ApiError;

/// Parses a path identifier, rejecting malformed values with 400.
pub(crate) fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, ApiError>
where
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid {what} format: {e}")))
}
