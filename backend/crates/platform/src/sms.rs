//! SMS Gateway Client
//!
//! Minimal client for the Twilio Messages API. Delivery is a single
//! form-encoded POST authenticated with the account SID and auth token.

use std::time::Duration;

use thiserror::Error;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Credentials for the SMS gateway account
#[derive(Clone)]
pub struct SmsCredentials {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number in E.164 form
    pub from: String,
}

impl std::fmt::Debug for SmsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("from", &self.from)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("SMS request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("SMS gateway rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// HTTP client bound to one gateway account
#[derive(Debug, Clone)]
pub struct SmsClient {
    http: reqwest::Client,
    credentials: SmsCredentials,
    base_url: String,
}

impl SmsClient {
    /// Build a client whose requests are bounded by `timeout`
    pub fn new(credentials: SmsCredentials, timeout: Duration) -> Result<Self, SmsError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            credentials,
            base_url: TWILIO_API_BASE.to_string(),
        })
    }

    /// Point the client at another API root (e.g. a local stub gateway)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn sender(&self) -> &str {
        &self.credentials.from
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.base_url, self.credentials.account_sid
        )
    }

    /// Send one text message
    pub async fn send(&self, to: &str, body: &str) -> Result<(), SmsError> {
        let form = [
            ("To", to),
            ("From", self.credentials.from.as_str()),
            ("Body", body),
        ];

        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.credentials.account_sid, Some(&self.credentials.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SmsError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> SmsCredentials {
        SmsCredentials {
            account_sid: "AC123".to_string(),
            auth_token: "secret-token".to_string(),
            from: "+15005550006".to_string(),
        }
    }

    #[test]
    fn test_messages_url() {
        let client = SmsClient::new(credentials(), Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );

        let client = client.with_base_url("http://127.0.0.1:9999/");
        assert_eq!(
            client.messages_url(),
            "http://127.0.0.1:9999/Accounts/AC123/Messages.json"
        );
        assert_eq!(client.sender(), "+15005550006");
    }

    #[test]
    fn test_credentials_debug_redacts_token() {
        let debug = format!("{:?}", credentials());
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("AC123"));
    }

    #[tokio::test]
    async fn test_send_to_unreachable_gateway_fails() {
        let client = SmsClient::new(credentials(), Duration::from_millis(500))
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        let result = client.send("+919876543210", "hello").await;
        assert!(matches!(result, Err(SmsError::Http(_))));
    }
}
