//! OTP (Phone Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Phone numbers, codes, tokens, entities, repository and notifier traits
//! - `application/` - Use cases (request code, verify code, authenticate)
//! - `infra/` - PostgreSQL and in-memory stores, SMS notifiers
//! - `presentation/` - HTTP handlers, DTOs, bearer middleware, router
//!
//! ## Security Model
//! - Codes and tokens come from the OS CSPRNG
//! - A code is valid for 5 minutes and 5 guesses, and is consumed at most once
//!   (atomic compare-and-set, committed together with the profile and
//!   session writes)
//! - Bearer tokens are stored as SHA-256 digests and expire after 30 days
//! - SMS delivery is best effort and never fails the request

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::OtpConfig;
pub use error::{OtpError, OtpResult};
pub use infra::memory::MemoryOtpRepository;
pub use infra::notifier::{ConfiguredNotifier, LogNotifier, SmsNotifier};
pub use infra::postgres::PgOtpRepository;
pub use presentation::router::{otp_router, otp_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod store {
    pub use crate::infra::memory::MemoryOtpRepository as MemoryOtpStore;
    pub use crate::infra::postgres::PgOtpRepository as OtpStore;
}
