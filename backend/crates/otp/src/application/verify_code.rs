//! Verify Code Use Case

use crate::application::config::OtpConfig;
use crate::domain::entities::{Profile, Session};
use crate::domain::repository::{LoginRepository, OtpCodeRepository};
use crate::domain::value_objects::{PhoneNumber, SessionToken, clean_display_name};
use crate::error::{OtpError, OtpResult};
use chrono::Utc;
use std::sync::Arc;

/// Input DTO for verify code
#[derive(Debug, Clone)]
pub struct VerifyCodeInput {
    pub phone: String,
    pub code: String,
    pub name: Option<String>,
}

/// Output DTO for verify code
#[derive(Debug, Clone)]
pub struct VerifyCodeOutput {
    /// Plaintext bearer token, returned once
    pub token: String,
    pub profile: Profile,
    pub session_expires_at_ms: i64,
}

/// Verify Code Use Case
pub struct VerifyCodeUseCase<C, L>
where
    C: OtpCodeRepository,
    L: LoginRepository,
{
    otp_repo: Arc<C>,
    login_repo: Arc<L>,
    config: Arc<OtpConfig>,
}

impl<C, L> VerifyCodeUseCase<C, L>
where
    C: OtpCodeRepository,
    L: LoginRepository,
{
    pub fn new(otp_repo: Arc<C>, login_repo: Arc<L>, config: Arc<OtpConfig>) -> Self {
        Self {
            otp_repo,
            login_repo,
            config,
        }
    }

    pub async fn execute(&self, input: VerifyCodeInput) -> OtpResult<VerifyCodeOutput> {
        let phone = PhoneNumber::parse(&input.phone)?;
        let max_attempts = self.config.max_attempts;
        let now_ms = Utc::now().timestamp_millis();

        let record = self
            .otp_repo
            .find_latest_active(&phone, now_ms)
            .await?
            .ok_or(OtpError::NoValidCode)?;

        if record.is_exhausted(max_attempts) {
            return Err(OtpError::MaxAttemptsExceeded);
        }

        if !record.code.matches(&input.code) {
            match self
                .otp_repo
                .record_failed_attempt(record.id, max_attempts)
                .await?
            {
                Some(attempts) => tracing::warn!(
                    otp_id = %record.id,
                    phone = %phone.masked(),
                    attempts,
                    "Wrong OTP submitted"
                ),
                None => tracing::debug!(
                    otp_id = %record.id,
                    "Wrong OTP for a code consumed or exhausted concurrently"
                ),
            }
            return Err(OtpError::InvalidCode);
        }

        let name = clean_display_name(input.name.as_deref());
        let token = SessionToken::generate();
        let session = Session::new(phone.clone(), &token, self.config.session_ttl_ms());

        // Only one concurrent verifier wins the compare-and-set; a failed
        // profile or session write leaves the code unconsumed
        let Some(profile) = self
            .login_repo
            .complete_login(record.id, max_attempts, now_ms, name.as_deref(), &session)
            .await?
        else {
            tracing::debug!(otp_id = %record.id, "OTP already consumed");
            return Err(OtpError::NoValidCode);
        };

        tracing::info!(
            otp_id = %record.id,
            session_id = %session.id,
            profile_id = %profile.id,
            phone = %phone.masked(),
            "OTP verified, session issued"
        );

        Ok(VerifyCodeOutput {
            token: token.into_string(),
            profile,
            session_expires_at_ms: session.expires_at_ms,
        })
    }
}
