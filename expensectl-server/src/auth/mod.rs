//! Password hashing and session tokens

pub mod password;
pub mod token;

pub use password::{
    decoy_hash, hash_password, verify_password, PasswordError, DEFAULT_ITERATIONS,
};
pub use token::{hash_token, new_token};
