//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use kernel::id::OtpCodeId;

use crate::domain::entities::{OtpRecord, Profile, Session};
use crate::domain::value_objects::PhoneNumber;
use crate::error::OtpResult;

/// OTP code repository trait
#[trait_variant::make(OtpCodeRepository: Send)]
pub trait LocalOtpCodeRepository {
    /// Store a freshly issued code
    async fn create(&self, record: &OtpRecord) -> OtpResult<()>;

    /// Most recently created unconsumed code with `expires_at_ms >= now_ms`
    async fn find_latest_active(
        &self,
        phone: &PhoneNumber,
        now_ms: i64,
    ) -> OtpResult<Option<OtpRecord>>;

    /// Atomically bump the attempt counter while it is below `max_attempts`
    /// and the code is unconsumed. Returns the new count, or `None` if the
    /// guard did not hold.
    async fn record_failed_attempt(
        &self,
        id: OtpCodeId,
        max_attempts: u32,
    ) -> OtpResult<Option<u32>>;

    /// Atomically mark the code consumed if it is still unconsumed, under the
    /// attempt limit and unexpired. Exactly one concurrent caller gets `true`.
    async fn consume(&self, id: OtpCodeId, max_attempts: u32, now_ms: i64) -> OtpResult<bool>;
}

/// Profile repository trait
#[trait_variant::make(ProfileRepository: Send)]
pub trait LocalProfileRepository {
    /// Create the profile for `phone`, or fill its name if it has none.
    /// An existing non-empty name is never overwritten.
    async fn upsert(&self, phone: &PhoneNumber, name: Option<&str>) -> OtpResult<Profile>;

    async fn find_by_phone(&self, phone: &PhoneNumber) -> OtpResult<Option<Profile>>;
}

/// Session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    async fn create(&self, session: &Session) -> OtpResult<()>;

    /// Session whose stored digest equals `token_hash` and whose
    /// `expires_at_ms` is still after `now_ms`
    async fn find_active_by_token_hash(
        &self,
        token_hash: &[u8],
        now_ms: i64,
    ) -> OtpResult<Option<Session>>;
}

/// Login completion as one unit of work
#[trait_variant::make(LoginRepository: Send)]
pub trait LocalLoginRepository {
    /// Consume the code, upsert the profile for `session.phone` and store
    /// `session`, all or nothing.
    ///
    /// Returns `None` without writing anything when the code is no longer
    /// consumable (see [`OtpCodeRepository::consume`]). Any error leaves the
    /// code unconsumed.
    async fn complete_login(
        &self,
        otp_id: OtpCodeId,
        max_attempts: u32,
        now_ms: i64,
        name: Option<&str>,
        session: &Session,
    ) -> OtpResult<Option<Profile>>;
}
