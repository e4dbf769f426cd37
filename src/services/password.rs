//! Password hashing and throwaway-credential generation.
//!
//! Argon2id is CPU- and memory-expensive on purpose; the async wrappers run
//! the work on a blocking thread so request handling is never stalled.

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::constants::limits::TEMP_PASSWORD_LEN;

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the library defaults.
pub fn hash_blocking(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash string. Comparison timing is
/// handled by the argon2 crate.
pub fn verify_blocking(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub async fn hash(password: String, config: SecurityConfig) -> Result<String> {
    task::spawn_blocking(move || hash_blocking(&password, Some(&config)))
        .await
        .context("Password hashing task panicked")?
}

pub async fn verify(password: String, stored_hash: String) -> Result<bool> {
    task::spawn_blocking(move || verify_blocking(&password, &stored_hash))
        .await
        .context("Password verification task panicked")?
}

/// Random throwaway password for accounts that must go through the reset
/// flow before their first real login. The plaintext is discarded by the
/// caller; only the hash is stored.
#[must_use]
pub fn generate_temp_password() -> String {
    use rand::Rng;

    const CHARSET: &[u8] =
        b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890!@#$%^&*()";

    let mut rng = rand::rng();
    (0..TEMP_PASSWORD_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
