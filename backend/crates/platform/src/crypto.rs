//! Cryptographic Utilities
//!
//! Every random value here comes from the operating system CSPRNG.

use rand::{Rng, RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Uniformly random decimal code of `digits` digits, zero-padded.
///
/// `digits` must be in `1..=9` so the range fits a `u32`.
pub fn random_numeric_code(digits: u32) -> String {
    debug_assert!((1..=9).contains(&digits));
    let upper = 10u32.pow(digits);
    let value = OsRng.gen_range(0..upper);
    format!("{:0width$}", value, width = digits as usize)
}

/// Random opaque token, hex-encoded (`2 * len` characters)
pub fn random_token_hex(len: usize) -> String {
    hex::encode(random_bytes(len))
}

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
