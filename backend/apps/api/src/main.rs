//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request errors are `OtpError`,
//! rendered through `kernel::error::AppError`.

use axum::{
    Router, http,
    http::{Method, header},
};
use otp::{
    ConfiguredNotifier, LogNotifier, OtpConfig, OtpResult, SmsNotifier, otp_router,
    otp_router_generic,
    store::{MemoryOtpStore, OtpStore},
};
use platform::sms::{SmsClient, SmsCredentials};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,otp=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // OTP configuration
    let production = env::var("APP_ENV").is_ok_and(|v| v.eq_ignore_ascii_case("production"));
    let mut otp_config = if production {
        OtpConfig::default()
    } else {
        tracing::warn!("APP_ENV is not production, OTP codes are returned in responses");
        OtpConfig::development()
    };
    otp_config.sms_sender = env::var("TWILIO_PHONE_NUMBER").ok().filter(|v| !v.is_empty());

    let notifier = build_notifier(&otp_config)?;

    let cleanup_interval = Duration::from_secs(
        env::var("CLEANUP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_CLEANUP_INTERVAL_SECS),
    );
    let retention = otp_config.record_retention;

    // Storage: PostgreSQL when configured, otherwise process memory
    let otp_routes = match env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;

            tracing::info!("Connected to database");

            // Run migrations
            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;

            tracing::info!("Migrations completed");

            let store = OtpStore::new(pool);
            let cleanup_store = store.clone();
            start_reaper(cleanup_interval, move || {
                let store = cleanup_store.clone();
                async move { store.cleanup_expired(retention).await }
            })
            .await;

            otp_router(store, notifier, otp_config)
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, using in-memory store (data is lost on restart)");

            let store = MemoryOtpStore::new();
            let cleanup_store = store.clone();
            start_reaper(cleanup_interval, move || {
                let store = cleanup_store.clone();
                async move { store.cleanup_expired(retention).await }
            })
            .await;

            otp_router_generic(store, notifier, otp_config)
        }
    };

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]));

    // Build router
    let app = Router::new()
        .nest("/api", otp_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// SMS gateway when all Twilio credentials are present, log-only otherwise
fn build_notifier(config: &OtpConfig) -> anyhow::Result<ConfiguredNotifier> {
    let account_sid = env::var("TWILIO_ACCOUNT_SID").ok().filter(|v| !v.is_empty());
    let auth_token = env::var("TWILIO_AUTH_TOKEN").ok().filter(|v| !v.is_empty());

    match (account_sid, auth_token, config.sms_sender.clone()) {
        (Some(account_sid), Some(auth_token), Some(from)) => {
            let credentials = SmsCredentials {
                account_sid,
                auth_token,
                from,
            };
            let client = SmsClient::new(credentials, config.notify_timeout)?;
            tracing::info!(sender = client.sender(), "SMS delivery enabled");
            Ok(ConfiguredNotifier::Sms(SmsNotifier::new(client)))
        }
        _ => {
            tracing::warn!("Twilio credentials not configured, OTP codes will not be sent");
            Ok(ConfiguredNotifier::Log(LogNotifier))
        }
    }
}

/// Run one cleanup now, then repeat every `interval` in the background.
/// Cleanup errors never prevent startup.
async fn start_reaper<F, Fut>(interval: Duration, mut cleanup: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = OtpResult<(u64, u64)>> + Send + 'static,
{
    run_cleanup(cleanup()).await;

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately and startup already ran once
        ticker.tick().await;

        loop {
            ticker.tick().await;
            run_cleanup(cleanup()).await;
        }
    });
}

async fn run_cleanup(cleanup: impl Future<Output = OtpResult<(u64, u64)>>) {
    match cleanup.await {
        Ok((otp_codes, sessions)) => {
            tracing::info!(
                otp_codes_deleted = otp_codes,
                sessions_deleted = sessions,
                "OTP cleanup completed"
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, "OTP cleanup failed, continuing anyway");
        }
    }
}
