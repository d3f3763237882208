//! Request Code Use Case

use crate::application::config::OtpConfig;
use crate::domain::entities::OtpRecord;
use crate::domain::notifier::Notifier;
use crate::domain::repository::OtpCodeRepository;
use crate::domain::value_objects::{OtpCode, PhoneNumber};
use crate::error::OtpResult;
use kernel::id::OtpCodeId;
use std::sync::Arc;

/// Output DTO for request code
#[derive(Debug, Clone)]
pub struct RequestCodeOutput {
    pub otp_id: OtpCodeId,
    pub phone: PhoneNumber,
    pub expires_at_ms: i64,
    /// Plaintext code, only when `expose_code` is on
    pub exposed_code: Option<String>,
}

/// Request Code Use Case
pub struct RequestCodeUseCase<C, N>
where
    C: OtpCodeRepository,
    N: Notifier,
{
    otp_repo: Arc<C>,
    notifier: Arc<N>,
    config: Arc<OtpConfig>,
}

impl<C, N> RequestCodeUseCase<C, N>
where
    C: OtpCodeRepository,
    N: Notifier,
{
    pub fn new(otp_repo: Arc<C>, notifier: Arc<N>, config: Arc<OtpConfig>) -> Self {
        Self {
            otp_repo,
            notifier,
            config,
        }
    }

    pub async fn execute(&self, raw_phone: &str) -> OtpResult<RequestCodeOutput> {
        let phone = PhoneNumber::parse(raw_phone)?;

        // Older codes stay stored; verification only looks at the newest
        let code = OtpCode::generate();
        let record = OtpRecord::new(phone.clone(), code.clone(), self.config.code_ttl_ms());
        self.otp_repo.create(&record).await?;

        tracing::info!(
            otp_id = %record.id,
            phone = %phone.masked(),
            expires_at_ms = record.expires_at_ms,
            "OTP issued"
        );

        self.deliver(&phone, &code).await;

        Ok(RequestCodeOutput {
            otp_id: record.id,
            phone,
            expires_at_ms: record.expires_at_ms,
            exposed_code: self.config.expose_code.then(|| code.as_str().to_owned()),
        })
    }

    /// Best-effort send. The stored code stays valid whatever happens here.
    async fn deliver(&self, phone: &PhoneNumber, code: &OtpCode) {
        let message = self.config.sms_message(code.as_str());
        let send = self.notifier.send(phone, &message);

        match tokio::time::timeout(self.config.notify_timeout, send).await {
            Ok(Ok(())) => {
                tracing::debug!(phone = %phone.masked(), "OTP delivered");
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    phone = %phone.masked(),
                    error = %e,
                    "OTP delivery failed, code remains valid"
                );
            }
            Err(_) => {
                tracing::warn!(
                    phone = %phone.masked(),
                    timeout_ms = self.config.notify_timeout.as_millis() as u64,
                    "OTP delivery timed out, code remains valid"
                );
            }
        }
    }
}
