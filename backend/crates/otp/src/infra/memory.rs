//! In-memory Repository
//!
//! Same guarantees as the PostgreSQL store, with every compare-and-set done
//! under one mutex. Used when no database is configured and by the tests.

use crate::domain::entities::{OtpRecord, Profile, Session};
use crate::domain::repository::{
    LoginRepository, OtpCodeRepository, ProfileRepository, SessionRepository,
};
use crate::domain::value_objects::PhoneNumber;
use crate::error::{OtpError, OtpResult};
use chrono::Utc;
use kernel::id::OtpCodeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Default)]
struct MemoryState {
    otp_codes: Vec<OtpRecord>,
    profiles: HashMap<PhoneNumber, Profile>,
    sessions: Vec<Session>,
}

impl MemoryState {
    fn consume(&mut self, id: OtpCodeId, max_attempts: u32, now_ms: i64) -> bool {
        let Some(record) = self.otp_codes.iter_mut().find(|r| r.id == id) else {
            return false;
        };
        if !record.is_active_at(now_ms) || record.is_exhausted(max_attempts) {
            return false;
        }
        record.consumed = true;
        true
    }

    fn upsert_profile(&mut self, phone: &PhoneNumber, name: Option<&str>) -> Profile {
        let profile = self
            .profiles
            .entry(phone.clone())
            .or_insert_with(|| Profile::new(phone.clone(), None));
        profile.fill_name_if_empty(name);
        profile.clone()
    }

    /// Token digests are unique, as in the `api_sessions` table
    fn check_session_insertable(&self, session: &Session) -> OtpResult<()> {
        if self
            .sessions
            .iter()
            .any(|s| s.token_hash == session.token_hash)
        {
            return Err(OtpError::Internal(
                "duplicate session token digest".to_string(),
            ));
        }
        Ok(())
    }
}

/// Process-local repository
#[derive(Clone, Default)]
pub struct MemoryOtpRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryOtpRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> OtpResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| OtpError::Internal("memory store lock poisoned".to_string()))
    }

    /// Delete expired sessions and OTP records older than `retention`.
    /// Returns `(otp_codes_deleted, sessions_deleted)`.
    pub async fn cleanup_expired(&self, retention: Duration) -> OtpResult<(u64, u64)> {
        let now_ms = Utc::now().timestamp_millis();
        let otp_cutoff_ms = now_ms - retention.as_millis() as i64;
        let mut state = self.lock()?;

        let otp_before = state.otp_codes.len();
        state.otp_codes.retain(|r| r.expires_at_ms >= otp_cutoff_ms);
        let sessions_before = state.sessions.len();
        state.sessions.retain(|s| s.expires_at_ms >= now_ms);

        let otp_codes_deleted = (otp_before - state.otp_codes.len()) as u64;
        let sessions_deleted = (sessions_before - state.sessions.len()) as u64;

        tracing::debug!(
            otp_codes = otp_codes_deleted,
            sessions = sessions_deleted,
            "Cleaned up expired OTP data"
        );

        Ok((otp_codes_deleted, sessions_deleted))
    }

    /// All records issued for `phone`, oldest first
    pub fn otp_records_for(&self, phone: &PhoneNumber) -> OtpResult<Vec<OtpRecord>> {
        Ok(self
            .lock()?
            .otp_codes
            .iter()
            .filter(|r| &r.phone == phone)
            .cloned()
            .collect())
    }

    pub fn session_count(&self) -> OtpResult<usize> {
        Ok(self.lock()?.sessions.len())
    }

    pub fn profile_count(&self) -> OtpResult<usize> {
        Ok(self.lock()?.profiles.len())
    }

    /// Drop a profile while leaving its sessions behind
    pub fn remove_profile(&self, phone: &PhoneNumber) -> OtpResult<Option<Profile>> {
        Ok(self.lock()?.profiles.remove(phone))
    }
}

impl OtpCodeRepository for MemoryOtpRepository {
    async fn create(&self, record: &OtpRecord) -> OtpResult<()> {
        self.lock()?.otp_codes.push(record.clone());
        Ok(())
    }

    async fn find_latest_active(
        &self,
        phone: &PhoneNumber,
        now_ms: i64,
    ) -> OtpResult<Option<OtpRecord>> {
        let state = self.lock()?;
        // Later insertions win ties on created_at
        let latest = state
            .otp_codes
            .iter()
            .filter(|r| &r.phone == phone && r.is_active_at(now_ms))
            .fold(None::<&OtpRecord>, |best, r| match best {
                Some(b) if b.created_at > r.created_at => Some(b),
                _ => Some(r),
            });
        Ok(latest.cloned())
    }

    async fn record_failed_attempt(
        &self,
        id: OtpCodeId,
        max_attempts: u32,
    ) -> OtpResult<Option<u32>> {
        let mut state = self.lock()?;
        let Some(record) = state.otp_codes.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if record.consumed || record.attempts >= max_attempts {
            return Ok(None);
        }
        record.attempts += 1;
        Ok(Some(record.attempts))
    }

    async fn consume(&self, id: OtpCodeId, max_attempts: u32, now_ms: i64) -> OtpResult<bool> {
        Ok(self.lock()?.consume(id, max_attempts, now_ms))
    }
}

impl ProfileRepository for MemoryOtpRepository {
    async fn upsert(&self, phone: &PhoneNumber, name: Option<&str>) -> OtpResult<Profile> {
        Ok(self.lock()?.upsert_profile(phone, name))
    }

    async fn find_by_phone(&self, phone: &PhoneNumber) -> OtpResult<Option<Profile>> {
        Ok(self.lock()?.profiles.get(phone).cloned())
    }
}

impl SessionRepository for MemoryOtpRepository {
    async fn create(&self, session: &Session) -> OtpResult<()> {
        let mut state = self.lock()?;
        state.check_session_insertable(session)?;
        state.sessions.push(session.clone());
        Ok(())
    }

    async fn find_active_by_token_hash(
        &self,
        token_hash: &[u8],
        now_ms: i64,
    ) -> OtpResult<Option<Session>> {
        Ok(self
            .lock()?
            .sessions
            .iter()
            .find(|s| s.token_hash == token_hash && !s.is_expired_at(now_ms))
            .cloned())
    }
}

impl LoginRepository for MemoryOtpRepository {
    async fn complete_login(
        &self,
        otp_id: OtpCodeId,
        max_attempts: u32,
        now_ms: i64,
        name: Option<&str>,
        session: &Session,
    ) -> OtpResult<Option<Profile>> {
        let mut state = self.lock()?;
        // Every fallible check runs before the first write
        state.check_session_insertable(session)?;

        if !state.consume(otp_id, max_attempts, now_ms) {
            return Ok(None);
        }
        let profile = state.upsert_profile(&session.phone, name);
        state.sessions.push(session.clone());

        Ok(Some(profile))
    }
}
