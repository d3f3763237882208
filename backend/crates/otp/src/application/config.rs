//! Application Configuration
//!
//! Configuration for the OTP application layer.

use std::time::Duration;

/// OTP application configuration
#[derive(Debug, Clone)]
pub struct OtpConfig {
    /// Lifetime of an issued code
    pub code_ttl: Duration,
    /// Wrong guesses allowed per code
    pub max_attempts: u32,
    /// Lifetime of a bearer session
    pub session_ttl: Duration,
    /// Return the plaintext code in the request response (development only)
    pub expose_code: bool,
    /// Upper bound on a single SMS send
    pub notify_timeout: Duration,
    /// Sender number shown to clients
    pub sms_sender: Option<String>,
    /// Brand used in the SMS text
    pub app_name: String,
    /// How long expired OTP records are kept before reaping
    pub record_retention: Duration,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_ttl: Duration::from_secs(5 * 60),
            max_attempts: 5,
            session_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            expose_code: false,
            notify_timeout: Duration::from_secs(5),
            sms_sender: None,
            app_name: "TN Gamyam".to_string(),
            record_retention: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl OtpConfig {
    /// Create config for development (code echoed in responses)
    pub fn development() -> Self {
        Self {
            expose_code: true,
            ..Default::default()
        }
    }

    pub fn code_ttl_ms(&self) -> i64 {
        self.code_ttl.as_millis() as i64
    }

    pub fn session_ttl_ms(&self) -> i64 {
        self.session_ttl.as_millis() as i64
    }

    pub fn record_retention_ms(&self) -> i64 {
        self.record_retention.as_millis() as i64
    }

    /// SMS body carrying the code
    pub fn sms_message(&self, code: &str) -> String {
        let minutes = (self.code_ttl.as_secs() / 60).max(1);
        format!(
            "Your {} code is {}. Valid for {} minutes.",
            self.app_name, code, minutes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OtpConfig::default();
        assert_eq!(config.code_ttl_ms(), 300_000);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.session_ttl_ms(), 2_592_000_000);
        assert!(!config.expose_code);
        assert!(OtpConfig::development().expose_code);
    }

    #[test]
    fn test_sms_message() {
        let config = OtpConfig::default();
        assert_eq!(
            config.sms_message("042042"),
            "Your TN Gamyam code is 042042. Valid for 5 minutes."
        );
    }
}
