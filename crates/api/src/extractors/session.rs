use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{cookies, error::ApiError};

/// Bearer token of the signed-in user, read from the HTTP-only session
/// cookie. The token is opaque here; the remote API is the authority on
/// its validity.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        cookies::get(&parts.headers, cookies::ACCESS_TOKEN)
            .map(|access_token| Session { access_token })
            .ok_or_else(|| {
                ApiError::Unauthorized("Not signed in or the session has expired".to_string())
            })
    }
}
