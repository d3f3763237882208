//! Bearer Session Middleware

use crate::application::authenticate::AuthenticateUseCase;
use crate::domain::repository::{ProfileRepository, SessionRepository};
use crate::error::OtpError;
use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use platform::client::extract_bearer_token;
use std::sync::Arc;

/// Middleware state
#[derive(Clone)]
pub struct BearerAuthState<R>
where
    R: SessionRepository + ProfileRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
}

/// Require `Authorization: Bearer <token>` naming a live session.
/// Inserts the caller's `Profile` into request extensions.
pub async fn require_bearer_session<R>(
    State(state): State<BearerAuthState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, OtpError>
where
    R: SessionRepository + ProfileRepository + Clone + Send + Sync + 'static,
{
    let token =
        extract_bearer_token(req.headers()).ok_or(OtpError::MissingOrMalformedHeader)?;

    let use_case = AuthenticateUseCase::new(state.repo.clone(), state.repo.clone());
    let profile = use_case.execute(&token).await?;

    req.extensions_mut().insert(profile);
    Ok(next.run(req).await)
}
