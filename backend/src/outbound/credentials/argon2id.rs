//! Argon2id password hashes in PHC string format.
//!
//! Stored format: `$argon2id$v=19$m=<KiB>,t=<passes>,p=<lanes>$<salt>$<hash>`.
//! Verification reads the cost parameters from the stored string, so hashes
//! made under older parameters keep verifying. Both operations run on the
//! blocking pool.

use argon2::password_hash::{
    self, PasswordHash as PhcString, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use rand::rngs::OsRng;

use crate::domain::ports::{PasswordHasher, PasswordHasherError};
use crate::domain::{Password, PasswordHash};

/// `PasswordHasher` backed by the `argon2` crate with a random salt per
/// password.
#[derive(Debug, Clone, Default)]
pub struct Argon2idHasher {
    params: Params,
}

impl Argon2idHasher {
    /// Hasher with a custom memory cost (KiB) and pass count, one lane.
    ///
    /// Tests use a tiny cost; production keeps [`Default`].
    pub fn with_cost(memory_kib: u32, passes: u32) -> Result<Self, PasswordHasherError> {
        let params = Params::new(memory_kib, passes, 1, None)
            .map_err(|error| PasswordHasherError::internal(format!("argon2 params: {error}")))?;
        Ok(Self { params })
    }

    fn engine(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

fn join_error(error: tokio::task::JoinError) -> PasswordHasherError {
    PasswordHasherError::internal(error.to_string())
}

fn verify_blocking(password: &str, encoded: &str) -> Result<bool, PasswordHasherError> {
    let parsed = PhcString::new(encoded)
        .map_err(|error| PasswordHasherError::malformed_hash(error.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(error) => Err(PasswordHasherError::malformed_hash(error.to_string())),
    }
}

#[async_trait]
impl PasswordHasher for Argon2idHasher {
    async fn hash(&self, password: &Password) -> Result<PasswordHash, PasswordHasherError> {
        let password = password.clone();
        let engine = self.engine();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            engine
                .hash_password(password.expose().as_bytes(), &salt)
                .map(|phc| PasswordHash::new(phc.to_string()))
                .map_err(|error| PasswordHasherError::internal(error.to_string()))
        })
        .await
        .map_err(join_error)?
    }

    async fn verify(
        &self,
        password: &Password,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        let password = password.clone();
        let encoded = hash.as_str().to_owned();
        tokio::task::spawn_blocking(move || verify_blocking(password.expose(), &encoded))
            .await
            .map_err(join_error)?
    }
}
