//! Caller identity extraction.
//!
//! Authentication happens upstream. The gateway forwards the resolved user as
//! `x-user-*` headers, which are parsed here into a typed [`Identity`].

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use common::{Identity, Role, UserId};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Caller(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from_headers(&parts.headers).map(Caller)
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn identity_from_headers(headers: &HeaderMap) -> Result<Identity, ApiError> {
    let user_id = header(headers, USER_ID_HEADER)
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?
        .parse::<i64>()
        .map_err(|_| ApiError::Unauthorized(format!("invalid {USER_ID_HEADER} header")))?;

    let role = header(headers, USER_ROLE_HEADER)
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_ROLE_HEADER} header")))?
        .parse::<Role>()
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let name = header(headers, USER_NAME_HEADER).unwrap_or_default();
    let email = header(headers, USER_EMAIL_HEADER).unwrap_or_default();

    Ok(Identity::new(UserId::new(user_id), name, email, role))
}
