//! API DTOs (Data Transfer Objects)

use crate::domain::entities::Profile;
use serde::{Deserialize, Deserializer, Serialize};

/// Request for POST /api/otp/request
#[derive(Debug, Clone, Deserialize)]
pub struct OtpRequestBody {
    #[serde(default, deserialize_with = "string_or_absent")]
    pub phone: Option<String>,
}

/// Response for POST /api/otp/request
#[derive(Debug, Clone, Serialize)]
pub struct OtpRequestResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Request for POST /api/otp/verify
#[derive(Debug, Clone, Deserialize)]
pub struct OtpVerifyBody {
    #[serde(default, deserialize_with = "string_or_absent")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "string_or_absent")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "string_or_absent")]
    pub name: Option<String>,
}

/// Response for POST /api/otp/verify
#[derive(Debug, Clone, Serialize)]
pub struct OtpVerifyResponse {
    pub success: bool,
    pub token: String,
    pub profile: ProfileSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub phone: String,
    pub name: Option<String>,
}

/// Response for GET /api/me
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub phone: String,
    pub name: Option<String>,
    /// Unix milliseconds
    pub created_at: i64,
}

impl From<&Profile> for ProfileResponse {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id.to_string(),
            phone: profile.phone.to_string(),
            name: profile.name.clone(),
            created_at: profile.created_at.timestamp_millis(),
        }
    }
}

/// Response for GET /api/tele/number
#[derive(Debug, Clone, Serialize)]
pub struct SenderNumberResponse {
    pub phone: String,
}

/// Accept only non-empty JSON strings; any other value reads as absent
fn string_or_absent<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_string_fields_read_as_absent() {
        let body: OtpVerifyBody =
            serde_json::from_str(r#"{"phone": 9876543210, "code": ["1"], "name": null}"#).unwrap();
        assert!(body.phone.is_none());
        assert!(body.code.is_none());
        assert!(body.name.is_none());
    }

    #[test]
    fn test_missing_and_empty_fields_read_as_absent() {
        let body: OtpVerifyBody = serde_json::from_str(r#"{"code": ""}"#).unwrap();
        assert!(body.phone.is_none());
        assert!(body.code.is_none());

        let body: OtpRequestBody = serde_json::from_str(r#"{"phone": "98765 43210"}"#).unwrap();
        assert_eq!(body.phone.as_deref(), Some("98765 43210"));
    }

    #[test]
    fn test_request_response_omits_code_when_hidden() {
        let json = serde_json::to_value(OtpRequestResponse {
            success: true,
            code: None,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "success": true }));
    }
}
