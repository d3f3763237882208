//! HTTP Handlers

use crate::application::config::OtpConfig;
use crate::application::request_code::RequestCodeUseCase;
use crate::application::verify_code::{VerifyCodeInput, VerifyCodeUseCase};
use crate::domain::entities::Profile;
use crate::domain::notifier::Notifier;
use crate::domain::repository::{
    LoginRepository, OtpCodeRepository, ProfileRepository, SessionRepository,
};
use crate::error::{OtpError, OtpResult};
use crate::presentation::dto::{
    OtpRequestBody, OtpRequestResponse, OtpVerifyBody, OtpVerifyResponse, ProfileResponse,
    ProfileSummary, SenderNumberResponse,
};
use axum::body::Bytes;
use axum::extract::State;
use axum::{Extension, Json};
use std::sync::Arc;

/// Shared state for OTP handlers
#[derive(Clone)]
pub struct OtpAppState<R, N>
where
    R: OtpCodeRepository
        + LoginRepository
        + ProfileRepository
        + SessionRepository
        + Clone
        + Send
        + Sync
        + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub notifier: Arc<N>,
    pub config: Arc<OtpConfig>,
}

/// POST /api/otp/request
///
/// The body is parsed as JSON whatever the `Content-Type` header says.
pub async fn request_code<R, N>(
    State(state): State<OtpAppState<R, N>>,
    body: Bytes,
) -> OtpResult<Json<OtpRequestResponse>>
where
    R: OtpCodeRepository
        + LoginRepository
        + ProfileRepository
        + SessionRepository
        + Clone
        + Send
        + Sync
        + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let req: OtpRequestBody = serde_json::from_slice(&body)?;
    let raw_phone = req.phone.ok_or(OtpError::InvalidPhone)?;

    let use_case = RequestCodeUseCase::new(
        state.repo.clone(),
        state.notifier.clone(),
        state.config.clone(),
    );

    let output = use_case.execute(&raw_phone).await?;

    Ok(Json(OtpRequestResponse {
        success: true,
        code: output.exposed_code,
    }))
}

/// POST /api/otp/verify
pub async fn verify_code<R, N>(
    State(state): State<OtpAppState<R, N>>,
    body: Bytes,
) -> OtpResult<Json<OtpVerifyResponse>>
where
    R: OtpCodeRepository
        + LoginRepository
        + ProfileRepository
        + SessionRepository
        + Clone
        + Send
        + Sync
        + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    let req: OtpVerifyBody = serde_json::from_slice(&body)?;
    let phone = req.phone.ok_or(OtpError::MissingPhone)?;
    let code = req.code.ok_or(OtpError::MissingCode)?;

    let use_case =
        VerifyCodeUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(VerifyCodeInput {
            phone,
            code,
            name: req.name,
        })
        .await?;

    Ok(Json(OtpVerifyResponse {
        success: true,
        token: output.token,
        profile: ProfileSummary {
            phone: output.profile.phone.to_string(),
            name: output.profile.name,
        },
    }))
}

/// GET /api/me
///
/// The profile is resolved by `require_bearer_session`.
pub async fn me(Extension(profile): Extension<Profile>) -> Json<ProfileResponse> {
    Json(ProfileResponse::from(&profile))
}

/// GET /api/tele/number
pub async fn sender_number<R, N>(
    State(state): State<OtpAppState<R, N>>,
) -> Json<SenderNumberResponse>
where
    R: OtpCodeRepository
        + LoginRepository
        + ProfileRepository
        + SessionRepository
        + Clone
        + Send
        + Sync
        + 'static,
    N: Notifier + Clone + Send + Sync + 'static,
{
    Json(SenderNumberResponse {
        phone: state.config.sms_sender.clone().unwrap_or_default(),
    })
}
