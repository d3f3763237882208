//! OTP Router

use crate::application::config::OtpConfig;
use crate::domain::notifier::Notifier;
use crate::domain::repository::{
    LoginRepository, OtpCodeRepository, ProfileRepository, SessionRepository,
};
use crate::infra::notifier::ConfiguredNotifier;
use crate::infra::postgres::PgOtpRepository;
use crate::presentation::handlers::{self, OtpAppState};
use crate::presentation::middleware::{BearerAuthState, require_bearer_session};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

/// Create the OTP router with PostgreSQL repository
pub fn otp_router(
    repo: PgOtpRepository,
    notifier: ConfiguredNotifier,
    config: OtpConfig,
) -> Router {
    otp_router_generic(repo, notifier, config)
}

/// Create a generic OTP router for any repository and notifier
pub fn otp_router_generic<R, N>(repo: R, notifier: N, config: OtpConfig) -> Router
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
    let repo = Arc::new(repo);
    let state = OtpAppState {
        repo: repo.clone(),
        notifier: Arc::new(notifier),
        config: Arc::new(config),
    };
    let auth_state = BearerAuthState { repo };

    let protected = Router::new()
        .route("/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(
            auth_state,
            require_bearer_session::<R>,
        ));

    Router::new()
        .route("/otp/request", post(handlers::request_code::<R, N>))
        .route("/otp/verify", post(handlers::verify_code::<R, N>))
        .route("/tele/number", get(handlers::sender_number::<R, N>))
        .with_state(state)
        .merge(protected)
}
