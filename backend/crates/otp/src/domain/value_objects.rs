//! Domain Value Objects
//!
//! Immutable value types for the OTP domain.

use std::fmt;

use platform::crypto;

use crate::error::{OtpError, OtpResult};

/// Country code prepended to numbers given without one
pub const DEFAULT_COUNTRY_CODE: &str = "+91";

/// Canonical E.164-style phone number: `+` followed by 7 to 15 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub const MIN_DIGITS: usize = 7;
    pub const MAX_DIGITS: usize = 15;

    /// Normalize user input into canonical form.
    ///
    /// Everything except ASCII digits and `+` is stripped. A leading `0` is a
    /// trunk prefix and is replaced by the default country code; input with no
    /// leading `+` gets the default country code prepended.
    pub fn parse(raw: &str) -> OtpResult<Self> {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();

        let normalized = if let Some(rest) = cleaned.strip_prefix('0') {
            format!("{DEFAULT_COUNTRY_CODE}{rest}")
        } else if !cleaned.starts_with('+') {
            format!("{DEFAULT_COUNTRY_CODE}{cleaned}")
        } else {
            cleaned
        };

        let digits = &normalized[1..];
        let valid = digits.chars().all(|c| c.is_ascii_digit())
            && (Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits.len());
        if !valid {
            return Err(OtpError::InvalidPhoneFormat);
        }

        Ok(Self(normalized))
    }

    /// Rebuild from a value that was canonical when stored
    pub fn from_db(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Log-safe form keeping only the last four digits
    pub fn masked(&self) -> String {
        let visible = self.0.len().saturating_sub(4);
        let mut out = String::with_capacity(self.0.len());
        for (i, c) in self.0.chars().enumerate() {
            out.push(if i == 0 || i >= visible { c } else { '*' });
        }
        out
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Six-digit one-time code
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    pub const DIGITS: u32 = 6;

    pub fn generate() -> Self {
        Self(crypto::random_numeric_code(Self::DIGITS))
    }

    pub fn from_db(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact string comparison, constant time in the submitted length
    pub fn matches(&self, submitted: &str) -> bool {
        crypto::constant_time_eq(self.0.as_bytes(), submitted.as_bytes())
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

/// Opaque bearer token handed to the client once. Only its digest is stored.
#[derive(Clone)]
pub struct SessionToken(String);

impl SessionToken {
    pub const BYTES: usize = 32;

    pub fn generate() -> Self {
        Self(crypto::random_token_hex(Self::BYTES))
    }

    /// Digest used as the storage key
    pub fn hash(&self) -> Vec<u8> {
        Self::hash_presented(&self.0)
    }

    /// Digest of a token presented by a client
    pub fn hash_presented(token: &str) -> Vec<u8> {
        crypto::sha256(token.as_bytes()).to_vec()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([redacted])")
    }
}

/// Trim an optional display name; blank becomes `None`
pub fn clean_display_name(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_formats_normalize_to_same_value() {
        let expected = "+919876543210";
        for raw in [
            "9876543210",
            "98765 43210",
            "09876543210",
            "+919876543210",
            "+91 98765-43210",
            "(+91) 98765.43210",
        ] {
            let phone = PhoneNumber::parse(raw).unwrap();
            assert_eq!(phone.as_str(), expected, "input {raw:?}");
        }
    }

    #[test]
    fn test_phone_keeps_explicit_country_code() {
        let phone = PhoneNumber::parse("+1 415 555 0100").unwrap();
        assert_eq!(phone.as_str(), "+14155550100");
    }

    #[test]
    fn test_phone_rejects_bad_lengths() {
        assert!(matches!(
            PhoneNumber::parse(""),
            Err(OtpError::InvalidPhoneFormat)
        ));
        assert!(matches!(
            PhoneNumber::parse("+12345"),
            Err(OtpError::InvalidPhoneFormat)
        ));
        assert!(matches!(
            PhoneNumber::parse("+1234567890123456"),
            Err(OtpError::InvalidPhoneFormat)
        ));
        assert!(matches!(
            PhoneNumber::parse("abc"),
            Err(OtpError::InvalidPhoneFormat)
        ));
    }

    #[test]
    fn test_phone_length_bounds() {
        assert!(PhoneNumber::parse("+1234567").is_ok());
        assert!(PhoneNumber::parse("+123456789012345").is_ok());
    }

    #[test]
    fn test_phone_rejects_inner_plus() {
        assert!(matches!(
            PhoneNumber::parse("+91+9876543210"),
            Err(OtpError::InvalidPhoneFormat)
        ));
        assert!(matches!(
            PhoneNumber::parse("98765+43210"),
            Err(OtpError::InvalidPhoneFormat)
        ));
    }

    #[test]
    fn test_phone_masked() {
        let phone = PhoneNumber::parse("+919876543210").unwrap();
        assert_eq!(phone.masked(), "+********3210");
    }

    #[test]
    fn test_otp_code_generation() {
        let code = OtpCode::generate();
        assert_eq!(code.as_str().len(), 6);
        assert!(code.as_str().chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_otp_code_matches_exactly() {
        let code = OtpCode::from_db("012345".to_string());
        assert!(code.matches("012345"));
        assert!(!code.matches("12345"));
        assert!(!code.matches(" 012345"));
        assert!(!code.matches("012346"));
    }

    #[test]
    fn test_debug_output_is_redacted() {
        let code = OtpCode::from_db("123456".to_string());
        assert!(!format!("{code:?}").contains("123456"));

        let token = SessionToken::generate();
        assert!(!format!("{token:?}").contains(token.as_str()));
    }

    #[test]
    fn test_session_token_shape_and_hash() {
        let token = SessionToken::generate();
        assert_eq!(token.as_str().len(), 64);
        assert!(token.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(token.hash(), SessionToken::hash_presented(token.as_str()));
        assert_eq!(token.hash().len(), 32);
        assert_ne!(token.hash(), token.as_str().as_bytes());
    }

    #[test]
    fn test_clean_display_name() {
        assert_eq!(clean_display_name(Some("  Asha ")), Some("Asha".to_string()));
        assert_eq!(clean_display_name(Some("   ")), None);
        assert_eq!(clean_display_name(Some("")), None);
        assert_eq!(clean_display_name(None), None);
    }
}
