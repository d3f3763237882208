//! Authenticate Use Case
//!
//! Resolves a presented bearer token to the caller's profile.

use crate::domain::entities::Profile;
use crate::domain::repository::{ProfileRepository, SessionRepository};
use crate::domain::value_objects::SessionToken;
use crate::error::{OtpError, OtpResult};
use chrono::Utc;
use std::sync::Arc;

/// Authenticate Use Case
pub struct AuthenticateUseCase<S, P>
where
    S: SessionRepository,
    P: ProfileRepository,
{
    session_repo: Arc<S>,
    profile_repo: Arc<P>,
}

impl<S, P> AuthenticateUseCase<S, P>
where
    S: SessionRepository,
    P: ProfileRepository,
{
    pub fn new(session_repo: Arc<S>, profile_repo: Arc<P>) -> Self {
        Self {
            session_repo,
            profile_repo,
        }
    }

    pub async fn execute(&self, token: &str) -> OtpResult<Profile> {
        if token.is_empty() {
            return Err(OtpError::MissingOrMalformedHeader);
        }

        let now_ms = Utc::now().timestamp_millis();
        let token_hash = SessionToken::hash_presented(token);
        let session = self
            .session_repo
            .find_active_by_token_hash(&token_hash, now_ms)
            .await?
            .ok_or(OtpError::InvalidOrExpiredToken)?;

        let profile = self
            .profile_repo
            .find_by_phone(&session.phone)
            .await?
            .ok_or(OtpError::ProfileNotFound)?;

        tracing::debug!(session_id = %session.id, profile_id = %profile.id, "Session resolved");

        Ok(profile)
    }
}
