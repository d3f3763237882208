//! Client request utilities
//!
//! Helpers for reading client credentials from HTTP headers.

use axum::http::{HeaderMap, header};

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the credential from an `Authorization: Bearer <token>` header
///
/// Returns `None` when the header is missing, not valid ASCII, uses another
/// scheme, or carries an empty token.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(BEARER_PREFIX)?;
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
