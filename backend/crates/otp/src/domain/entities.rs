//! Domain Entities
//!
//! Core business entities for the OTP domain.

use chrono::{DateTime, Utc};
use kernel::id::{OtpCodeId, ProfileId, SessionId};

use crate::domain::value_objects::{OtpCode, PhoneNumber, SessionToken};

/// OtpRecord entity - one issued code for a phone
#[derive(Debug, Clone)]
pub struct OtpRecord {
    pub id: OtpCodeId,
    pub phone: PhoneNumber,
    pub code: OtpCode,
    pub attempts: u32,
    pub consumed: bool,
    pub expires_at_ms: i64,
    pub created_at: DateTime<Utc>,
}

impl OtpRecord {
    /// Issue a fresh record expiring `ttl_ms` from now
    pub fn new(phone: PhoneNumber, code: OtpCode, ttl_ms: i64) -> Self {
        let now = Utc::now();
        Self {
            id: OtpCodeId::new(),
            phone,
            code,
            attempts: 0,
            consumed: false,
            expires_at_ms: now.timestamp_millis() + ttl_ms,
            created_at: now,
        }
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at_ms
    }

    /// Unconsumed and not yet expired
    pub fn is_active_at(&self, now_ms: i64) -> bool {
        !self.consumed && !self.is_expired_at(now_ms)
    }

    pub fn is_exhausted(&self, max_attempts: u32) -> bool {
        self.attempts >= max_attempts
    }
}

/// Profile entity - one per canonical phone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: ProfileId,
    pub phone: PhoneNumber,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(phone: PhoneNumber, name: Option<String>) -> Self {
        Self {
            id: ProfileId::new(),
            phone,
            name,
            created_at: Utc::now(),
        }
    }

    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.is_empty())
    }

    /// Set the name only when none is recorded yet. Returns whether it changed.
    pub fn fill_name_if_empty(&mut self, name: Option<&str>) -> bool {
        match name {
            Some(name) if !name.is_empty() && !self.has_name() => {
                self.name = Some(name.to_owned());
                true
            }
            _ => false,
        }
    }
}

/// Session entity - bearer credential bound to a phone
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub phone: PhoneNumber,
    pub token_hash: Vec<u8>,
    pub expires_at_ms: i64,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(phone: PhoneNumber, token: &SessionToken, ttl_ms: i64) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            phone,
            token_hash: token.hash(),
            expires_at_ms: now.timestamp_millis() + ttl_ms,
            created_at: now,
        }
    }

    /// Sessions are valid only while `expires_at_ms > now_ms`
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone() -> PhoneNumber {
        PhoneNumber::parse("+919876543210").unwrap()
    }

    #[test]
    fn test_otp_record_lifecycle_flags() {
        let record = OtpRecord::new(phone(), OtpCode::generate(), 300_000);
        let now = Utc::now().timestamp_millis();

        assert_eq!(record.attempts, 0);
        assert!(record.is_active_at(now));
        assert!(!record.is_exhausted(5));
        assert!(record.is_expired_at(record.expires_at_ms + 1));
        // Boundary instant is still valid
        assert!(!record.is_expired_at(record.expires_at_ms));
    }

    #[test]
    fn test_otp_record_exhaustion() {
        let mut record = OtpRecord::new(phone(), OtpCode::generate(), 300_000);
        record.attempts = 5;
        assert!(record.is_exhausted(5));
        record.consumed = true;
        assert!(!record.is_active_at(Utc::now().timestamp_millis()));
    }

    #[test]
    fn test_profile_name_is_filled_once() {
        let mut profile = Profile::new(phone(), None);
        assert!(!profile.fill_name_if_empty(None));
        assert!(profile.fill_name_if_empty(Some("Asha")));
        assert!(!profile.fill_name_if_empty(Some("Ravi")));
        assert_eq!(profile.name.as_deref(), Some("Asha"));
    }

    #[test]
    fn test_profile_empty_name_counts_as_missing() {
        let mut profile = Profile::new(phone(), Some(String::new()));
        assert!(!profile.has_name());
        assert!(profile.fill_name_if_empty(Some("Asha")));
    }

    #[test]
    fn test_session_stores_hash_not_token() {
        let token = SessionToken::generate();
        let session = Session::new(phone(), &token, 1_000);
        assert_eq!(session.token_hash, token.hash());
        assert!(!session.is_expired_at(session.expires_at_ms - 1));
        assert!(session.is_expired_at(session.expires_at_ms));
    }
}
