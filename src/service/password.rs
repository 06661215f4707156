//! Password hashing with PBKDF2-HMAC-SHA256.

use std::num::NonZeroU32;

use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};

use crate::error::CoreError;
use crate::storage::models::{Credential, Password};

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const CREDENTIAL_LEN: usize = digest::SHA256_OUTPUT_LEN;
const SALT_LEN: usize = 16;
const ITERATIONS: u32 = 100_000;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 1024;

/// Derive a fresh verifier for `password` under a random salt.
pub fn hash_password(password: &Password) -> Result<Credential, CoreError> {
    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| CoreError::Internal("failed to generate a password salt".to_string()))?;

    let iterations = NonZeroU32::new(ITERATIONS)
        .ok_or_else(|| CoreError::Internal("PBKDF2 iteration count is zero".to_string()))?;

    let mut hash = [0u8; CREDENTIAL_LEN];
    pbkdf2::derive(
        ALGORITHM,
        iterations,
        &salt,
        password.expose().as_bytes(),
        &mut hash,
    );

    Ok(Credential {
        iterations: ITERATIONS,
        salt: salt.to_vec(),
        hash: hash.to_vec(),
    })
}

/// Constant-time check of `password` against a stored verifier.
pub fn verify_password(password: &Password, credential: &Credential) -> bool {
    let Some(iterations) = NonZeroU32::new(credential.iterations) else {
        return false;
    };
    pbkdf2::verify(
        ALGORITHM,
        iterations,
        &credential.salt,
        password.expose().as_bytes(),
        &credential.hash,
    )
    .is_ok()
}

pub fn validate_password(password: &Password) -> Result<(), CoreError> {
    let secret = password.expose();
    if secret.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoreError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if secret.len() > MAX_PASSWORD_LEN {
        return Err(CoreError::InvalidInput(format!(
            "password must be at most {MAX_PASSWORD_LEN} bytes"
        )));
    }
    Ok(())
}
