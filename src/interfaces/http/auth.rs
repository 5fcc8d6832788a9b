use crate::error::{Result, ShippingError};
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};

pub const AUTH_COOKIE: &str = "backend_auth_token";

/// The caller's backend token, from `Authorization: Bearer` or the
/// `backend_auth_token` cookie.
pub fn bearer_token(headers: &HeaderMap) -> Result<String> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = from_header {
        return Ok(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == AUTH_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
        .ok_or(ShippingError::NotAuthenticated)
}
