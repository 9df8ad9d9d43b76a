//! Caller identity extraction.
//!
//! Authentication happens upstream; the gateway forwards the resolved caller
//! in `x-user-id` and `x-user-role` headers.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use common::{Requester, Role, UserId};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Extractor that requires a caller identity.
///
/// A missing or malformed `x-user-id` is rejected with 401. A missing role
/// means customer.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Identity(requester): Identity) -> impl IntoResponse {
///     requester.user_id.to_string()
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub Requester);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        requester_from_headers(&parts.headers).map(Self)
    }
}

fn requester_from_headers(headers: &HeaderMap) -> Result<Requester, ApiError> {
    let raw_id = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?;
    let user_id: UserId = raw_id
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| ApiError::Unauthorized(format!("invalid {USER_ID_HEADER} header")))?;

    let role = match headers.get(USER_ROLE_HEADER) {
        None => Role::Customer,
        Some(raw) => raw
            .to_str()
            .ok()
            .and_then(|v| v.trim().to_ascii_lowercase().parse().ok())
            .ok_or_else(|| ApiError::Unauthorized(format!("invalid {USER_ROLE_HEADER} header")))?,
    };

    Ok(Requester { user_id, role })
}
