//! PBKDF2-HMAC-SHA256 password hashes
//!
//! Stored as `pbkdf2$<iterations>$<salt b64>$<hash b64>` so the iteration
//! count can be raised without invalidating existing hashes.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use expensectl_core::models::Password;

const SCHEME: &str = "pbkdf2";
pub const DEFAULT_ITERATIONS: u32 = 210_000;
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("malformed password hash")]
    Malformed,
}

fn derive_key(password: &str, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    key
}

/// Hash with a fresh random salt. Use `DEFAULT_ITERATIONS` outside tests.
pub fn hash_password(password: &Password, iterations: u32) -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let key = derive_key(password.expose(), &salt, iterations);
    format!(
        "{SCHEME}${iterations}${}${}",
        B64.encode(salt),
        B64.encode(key)
    )
}

/// A well-formed hash no password matches, with the same verification cost
/// as a real one at `iterations`. Checked against when the account is unknown.
pub fn decoy_hash(iterations: u32) -> String {
    format!(
        "{SCHEME}${}${}${}",
        iterations.max(1),
        B64.encode([0u8; SALT_LEN]),
        B64.encode([0u8; KEY_LEN])
    )
}

/// Check a password against a stored hash in constant time.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(PasswordError::Malformed);
    };

    let iterations: u32 = iterations.parse().map_err(|_| PasswordError::Malformed)?;
    if iterations == 0 {
        return Err(PasswordError::Malformed);
    }
    let salt = B64.decode(salt).map_err(|_| PasswordError::Malformed)?;
    let expected = B64.decode(hash).map_err(|_| PasswordError::Malformed)?;
    if expected.len() != KEY_LEN {
        return Err(PasswordError::Malformed);
    }

    let actual = derive_key(password, &salt, iterations);
    Ok(constant_time_eq(&actual, &expected))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
