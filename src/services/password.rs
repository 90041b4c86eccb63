//! Admin credential check
//!
//! The board has exactly one account, configured as a plain username/password
//! pair. The configured password is hashed with Argon2id once at startup so the
//! plaintext does not have to be kept around for every login; verification then
//! goes through Argon2's own comparison. Pass/fail outcomes are the same as an
//! exact string comparison against the configured pair.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password using Argon2id with secure defaults.
///
/// Returns the PHC string (algorithm, parameters, salt and hash).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
        .context("Password hashing failed")?;

    Ok(password_hash.to_string())
}

/// Verify a password against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch and an error only if the hash itself is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))
        .context("Failed to parse password hash")?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification failed: {}", e))
            .context("Password verification error"),
    }
}

/// The single configured admin account
pub struct AdminCredentials {
    username: String,
    password_hash: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl AdminCredentials {
    /// Build from the configured pair, hashing the password
    pub fn new(username: impl Into<String>, password: &str) -> Result<Self> {
        Ok(Self {
            username: username.into(),
            password_hash: hash_password(password)?,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Check a login attempt. Any internal hashing failure counts as a mismatch.
    pub fn check(&self, username: &str, password: &str) -> bool {
        if username != self.username {
            // Still run the hash so a wrong username costs the same as a wrong password.
            let _ = verify_password(password, &self.password_hash);
            return false;
        }

        match verify_password(password, &self.password_hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!("Admin password verification failed: {:#}", e);
                false
            }
        }
    }
}
