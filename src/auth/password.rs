//! Password hashing and verification using Argon2
//!
//! Digests are stored as `<argon2 PHC string>||<salt>`. The appended salt is a
//! fresh UUID mixed into the hashed input; Argon2 adds its own random salt
//! inside the PHC string. The PHC alphabet never contains `|`, so splitting on
//! the separator is unambiguous.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

/// Separator between the hash and the appended salt
pub const DIGEST_SEPARATOR: &str = "||";

/// Failure modes of the credential hasher
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HashError {
    /// The stored digest does not have the expected shape (corrupt record)
    #[error("malformed digest: {0}")]
    Malformed(String),

    /// The digest is well-formed but the secret does not match
    #[error("secret does not match digest")]
    Mismatch,

    /// The hash function itself failed (bad parameters, engine error)
    #[error("hashing failed: {0}")]
    Hashing(String),
}

/// Turns secrets into salted digests and checks secrets against them
pub trait CredentialHasher: Send + Sync {
    /// Produce a fresh salted digest; two calls on the same secret differ.
    fn generate(&self, secret: &str) -> Result<String, HashError>;

    /// Succeeds iff `secret` matches `digest`.
    fn compare(&self, digest: &str, secret: &str) -> Result<(), HashError>;
}

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl HashParams {
    pub const fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }
}

impl Default for HashParams {
    /// Roughly 100ms per guess on commodity hardware
    fn default() -> Self {
        Self::new(64 * 1024, 3, 1)
    }
}

/// Argon2id implementation of [`CredentialHasher`]
#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    /// Build a hasher with the given cost; rejects parameters Argon2 refuses.
    pub fn new(params: HashParams) -> Result<Self, HashError> {
        let params = Params::new(params.memory_kib, params.iterations, params.parallelism, None)
            .map_err(|e| HashError::Hashing(format!("invalid Argon2 parameters: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl std::fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2Hasher").finish_non_exhaustive()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn generate(&self, secret: &str) -> Result<String, HashError> {
        let salt = uuid::Uuid::new_v4().to_string();
        let argon_salt = SaltString::generate(&mut OsRng);
        let salted = Zeroizing::new(format!("{secret}{salt}"));

        let hash = self
            .argon2
            .hash_password(salted.as_bytes(), &argon_salt)
            .map_err(|e| HashError::Hashing(format!("Failed to hash secret: {e}")))?;

        Ok(format!("{hash}{DIGEST_SEPARATOR}{salt}"))
    }

    fn compare(&self, digest: &str, secret: &str) -> Result<(), HashError> {
        let parts: Vec<&str> = digest.split(DIGEST_SEPARATOR).collect();
        let [hash, salt] = parts.as_slice() else {
            return Err(HashError::Malformed(format!(
                "expected 2 parts, found {}",
                parts.len()
            )));
        };

        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| HashError::Malformed(format!("invalid hash format: {e}")))?;

        let salted = Zeroizing::new(format!("{secret}{salt}"));
        // Cost parameters come from the PHC string, not from `self`
        match self.argon2.verify_password(salted.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(()),
            Err(argon2::password_hash::Error::Password) => Err(HashError::Mismatch),
            Err(e) => Err(HashError::Malformed(e.to_string())),
        }
    }
}
