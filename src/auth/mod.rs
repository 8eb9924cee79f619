//! Authentication for the address book
//!
//! Provides:
//! - Credential hashing with Argon2id
//! - Session token generation and validation (HS256 JWT)
//! - The access gate that admits requests to the contact routes

pub mod gate;
pub mod jwt;
pub mod password;

pub use gate::{extract_bearer_token, AccessGate, AuthSession};
pub use jwt::{SessionCodec, SessionToken, TokenError, MIN_SECRET_LEN};
pub use password::{Argon2Hasher, CredentialHasher, HashError, HashParams};
