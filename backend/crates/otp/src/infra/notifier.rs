//! Notifier Implementations

use crate::domain::notifier::{Notifier, NotifyError};
use crate::domain::value_objects::PhoneNumber;
use platform::sms::SmsClient;

/// Sends codes through the SMS gateway
#[derive(Debug, Clone)]
pub struct SmsNotifier {
    client: SmsClient,
}

impl SmsNotifier {
    pub fn new(client: SmsClient) -> Self {
        Self { client }
    }
}

impl Notifier for SmsNotifier {
    async fn send(&self, to: &PhoneNumber, message: &str) -> Result<(), NotifyError> {
        self.client
            .send(to.as_str(), message)
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))
    }
}

/// Stand-in when no gateway credentials are configured
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, to: &PhoneNumber, _message: &str) -> Result<(), NotifyError> {
        tracing::warn!(
            phone = %to.masked(),
            "SMS gateway not configured, message not sent"
        );
        Ok(())
    }
}

/// Notifier picked at startup from the environment
#[derive(Debug, Clone)]
pub enum ConfiguredNotifier {
    Sms(SmsNotifier),
    Log(LogNotifier),
}

impl Notifier for ConfiguredNotifier {
    async fn send(&self, to: &PhoneNumber, message: &str) -> Result<(), NotifyError> {
        match self {
            ConfiguredNotifier::Sms(n) => n.send(to, message).await,
            ConfiguredNotifier::Log(n) => n.send(to, message).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::sms::SmsCredentials;
    use std::time::Duration;

    fn phone() -> PhoneNumber {
        PhoneNumber::parse("+919876543210").unwrap()
    }

    #[tokio::test]
    async fn test_log_notifier_succeeds() {
        assert!(LogNotifier.send(&phone(), "hello").await.is_ok());
    }

    #[tokio::test]
    async fn test_sms_notifier_maps_gateway_failure() {
        let credentials = SmsCredentials {
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            from: "+15550001111".to_string(),
        };
        let client = SmsClient::new(credentials, Duration::from_secs(2))
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        let notifier = ConfiguredNotifier::Sms(SmsNotifier::new(client));

        let result = notifier.send(&phone(), "hello").await;
        assert!(matches!(result, Err(NotifyError::Delivery(_))));
    }
}
