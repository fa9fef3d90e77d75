use std::sync::Arc;

use argon2::{Argon2, password_hash, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::{rand_core, SaltString};

use crate::models::User;

/// Longest password accepted as is, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Clone)]
pub struct Argon2Hash(Argon2<'static>);

#[derive(Clone)]
pub struct AuthService {
    hasher: Arc<Argon2Hash>,
}

impl AuthService {
    pub fn new() -> Self {
        let hash = Argon2Hash(Argon2::default());

        Self {
            hasher: Arc::new(hash),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String, password_hash::Error> {
        let hash_salt = SaltString::generate(&mut rand_core::OsRng);
        let hash = self.hasher.0.hash_password(truncate(password).as_bytes(), &hash_salt)?;

        Ok(hash.to_string())
    }

    pub fn verify(&self, user: &User, password: &str) -> Result<bool, password_hash::Error> {
        let parsed_hash = PasswordHash::new(&user.password)?;

        Ok(self
            .hasher
            .0
            .verify_password(truncate(password).as_bytes(), &parsed_hash)
            .is_ok())
    }
}

impl Default for AuthService {
    fn default() -> Self {
        Self::new()
    }
}

/// Cuts the password at the last char boundary within [`MAX_PASSWORD_BYTES`].
pub fn truncate(password: &str) -> &str {
    if password.len() <= MAX_PASSWORD_BYTES {
        return password;
    }

    let mut end = MAX_PASSWORD_BYTES;
    while !password.is_char_boundary(end) {
        end -= 1;
    }
    tracing::warn!("password longer than {} bytes, truncated", MAX_PASSWORD_BYTES);

    &password[..end]
}
