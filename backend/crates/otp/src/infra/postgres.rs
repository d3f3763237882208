//! PostgreSQL Repository Implementations

use crate::domain::entities::{OtpRecord, Profile, Session};
use crate::domain::repository::{
    LoginRepository, OtpCodeRepository, ProfileRepository, SessionRepository,
};
use crate::domain::value_objects::{OtpCode, PhoneNumber};
use crate::error::OtpResult;
use chrono::{DateTime, Utc};
use kernel::id::{OtpCodeId, ProfileId, SessionId};
use sqlx::{PgExecutor, PgPool};
use std::time::Duration;
use uuid::Uuid;

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgOtpRepository {
    pool: PgPool,
}

impl PgOtpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete expired sessions and OTP records older than `retention`.
    /// Returns `(otp_codes_deleted, sessions_deleted)`.
    pub async fn cleanup_expired(&self, retention: Duration) -> OtpResult<(u64, u64)> {
        let now_ms = Utc::now().timestamp_millis();
        let otp_cutoff_ms = now_ms - retention.as_millis() as i64;

        let otp_codes_deleted = sqlx::query("DELETE FROM otp_codes WHERE expires_at_ms < $1")
            .bind(otp_cutoff_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        let sessions_deleted = sqlx::query("DELETE FROM api_sessions WHERE expires_at_ms < $1")
            .bind(now_ms)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!(
            otp_codes = otp_codes_deleted,
            sessions = sessions_deleted,
            "Cleaned up expired OTP data"
        );

        Ok((otp_codes_deleted, sessions_deleted))
    }
}

impl OtpCodeRepository for PgOtpRepository {
    async fn create(&self, record: &OtpRecord) -> OtpResult<()> {
        sqlx::query(
            r#"
            INSERT INTO otp_codes (
                otp_code_id,
                phone,
                code,
                attempts,
                consumed,
                expires_at_ms,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id.into_uuid())
        .bind(record.phone.as_str())
        .bind(record.code.as_str())
        .bind(record.attempts as i32)
        .bind(record.consumed)
        .bind(record.expires_at_ms)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_latest_active(
        &self,
        phone: &PhoneNumber,
        now_ms: i64,
    ) -> OtpResult<Option<OtpRecord>> {
        let row = sqlx::query_as::<_, OtpCodeRow>(
            r#"
            SELECT
                otp_code_id,
                phone,
                code,
                attempts,
                consumed,
                expires_at_ms,
                created_at
            FROM otp_codes
            WHERE phone = $1 AND consumed = FALSE AND expires_at_ms >= $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(phone.as_str())
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(OtpCodeRow::into_record))
    }

    async fn record_failed_attempt(
        &self,
        id: OtpCodeId,
        max_attempts: u32,
    ) -> OtpResult<Option<u32>> {
        let attempts = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE otp_codes
            SET attempts = attempts + 1
            WHERE otp_code_id = $1 AND consumed = FALSE AND attempts < $2
            RETURNING attempts
            "#,
        )
        .bind(id.into_uuid())
        .bind(max_attempts as i32)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempts.map(|a| a as u32))
    }

    async fn consume(&self, id: OtpCodeId, max_attempts: u32, now_ms: i64) -> OtpResult<bool> {
        consume_code(&self.pool, id, max_attempts, now_ms).await
    }
}

impl ProfileRepository for PgOtpRepository {
    async fn upsert(&self, phone: &PhoneNumber, name: Option<&str>) -> OtpResult<Profile> {
        upsert_profile(&self.pool, phone, name).await
    }

    async fn find_by_phone(&self, phone: &PhoneNumber) -> OtpResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT profile_id, phone, name, created_at
            FROM user_profiles
            WHERE phone = $1
            "#,
        )
        .bind(phone.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProfileRow::into_profile))
    }
}

impl SessionRepository for PgOtpRepository {
    async fn create(&self, session: &Session) -> OtpResult<()> {
        insert_session(&self.pool, session).await
    }

    async fn find_active_by_token_hash(
        &self,
        token_hash: &[u8],
        now_ms: i64,
    ) -> OtpResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT session_id, phone, token_hash, expires_at_ms, created_at
            FROM api_sessions
            WHERE token_hash = $1 AND expires_at_ms > $2
            "#,
        )
        .bind(token_hash)
        .bind(now_ms)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRow::into_session))
    }
}

impl LoginRepository for PgOtpRepository {
    async fn complete_login(
        &self,
        otp_id: OtpCodeId,
        max_attempts: u32,
        now_ms: i64,
        name: Option<&str>,
        session: &Session,
    ) -> OtpResult<Option<Profile>> {
        // Dropping the transaction on an error path rolls it back
        let mut tx = self.pool.begin().await?;

        if !consume_code(&mut *tx, otp_id, max_attempts, now_ms).await? {
            tx.rollback().await?;
            return Ok(None);
        }

        let profile = upsert_profile(&mut *tx, &session.phone, name).await?;
        insert_session(&mut *tx, session).await?;

        tx.commit().await?;

        Ok(Some(profile))
    }
}

// Statements shared by the pool-level methods and `complete_login`

async fn consume_code<'e, E>(
    executor: E,
    id: OtpCodeId,
    max_attempts: u32,
    now_ms: i64,
) -> OtpResult<bool>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE otp_codes
        SET consumed = TRUE
        WHERE otp_code_id = $1
          AND consumed = FALSE
          AND attempts < $2
          AND expires_at_ms >= $3
        "#,
    )
    .bind(id.into_uuid())
    .bind(max_attempts as i32)
    .bind(now_ms)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

async fn upsert_profile<'e, E>(
    executor: E,
    phone: &PhoneNumber,
    name: Option<&str>,
) -> OtpResult<Profile>
where
    E: PgExecutor<'e>,
{
    let profile = Profile::new(phone.clone(), name.map(str::to_owned));

    // Single statement so concurrent first logins converge on one row
    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        INSERT INTO user_profiles (profile_id, phone, name, created_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (phone) DO UPDATE SET name = CASE
            WHEN (user_profiles.name IS NULL OR user_profiles.name = '')
                AND EXCLUDED.name IS NOT NULL
                AND EXCLUDED.name <> ''
            THEN EXCLUDED.name
            ELSE user_profiles.name
        END
        RETURNING profile_id, phone, name, created_at
        "#,
    )
    .bind(profile.id.into_uuid())
    .bind(profile.phone.as_str())
    .bind(profile.name.as_deref())
    .bind(profile.created_at)
    .fetch_one(executor)
    .await?;

    Ok(row.into_profile())
}

async fn insert_session<'e, E>(executor: E, session: &Session) -> OtpResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO api_sessions (
            session_id,
            phone,
            token_hash,
            expires_at_ms,
            created_at
        ) VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(session.id.into_uuid())
    .bind(session.phone.as_str())
    .bind(&session.token_hash)
    .bind(session.expires_at_ms)
    .bind(session.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

// Internal row types for sqlx mapping
#[derive(sqlx::FromRow)]
struct OtpCodeRow {
    otp_code_id: Uuid,
    phone: String,
    code: String,
    attempts: i32,
    consumed: bool,
    expires_at_ms: i64,
    created_at: DateTime<Utc>,
}

impl OtpCodeRow {
    fn into_record(self) -> OtpRecord {
        OtpRecord {
            id: OtpCodeId::from_uuid(self.otp_code_id),
            phone: PhoneNumber::from_db(self.phone),
            code: OtpCode::from_db(self.code),
            attempts: self.attempts.max(0) as u32,
            consumed: self.consumed,
            expires_at_ms: self.expires_at_ms,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    profile_id: Uuid,
    phone: String,
    name: Option<String>,
    created_at: DateTime<Utc>,
}

impl ProfileRow {
    fn into_profile(self) -> Profile {
        Profile {
            id: ProfileId::from_uuid(self.profile_id),
            phone: PhoneNumber::from_db(self.phone),
            name: self.name,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: Uuid,
    phone: String,
    token_hash: Vec<u8>,
    expires_at_ms: i64,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            id: SessionId::from_uuid(self.session_id),
            phone: PhoneNumber::from_db(self.phone),
            token_hash: self.token_hash,
            expires_at_ms: self.expires_at_ms,
            created_at: self.created_at,
        }
    }
}
