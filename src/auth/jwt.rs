//! Session token codec
//!
//! Tokens are HS256 JWTs whose claims are the credentials presented at login.
//! They carry no expiry; callers that want one must layer it on top.
//!
//! Security notes:
//! - Only HS256 is accepted on decode; any other `alg` is rejected
//! - The payload contains the plaintext password, so every request re-verifies
//!   it against the stored digest

use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::types::{AddressBookError, Credentials};

/// Minimum accepted signing secret length outside dev mode
pub const MIN_SECRET_LEN: usize = 32;

const DEV_SECRET: &str = "dev-mode-secret-not-for-production-use-123456";

/// Signed bearer token returned by login
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionToken {
    pub token: String,
}

/// Why a presented token was refused
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid signature")]
    BadSignature,

    #[error("unexpected signing algorithm")]
    UnexpectedAlgorithm,

    #[error("invalid token claims: {0}")]
    Claims(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => Self::BadSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::UnexpectedAlgorithm
            }
            ErrorKind::Json(e) => Self::Claims(e.to_string()),
            ErrorKind::MissingRequiredClaim(claim) => Self::Claims(format!("missing {claim}")),
            _ => Self::Malformed,
        }
    }
}

/// Encodes credentials into signed tokens and back
#[derive(Clone)]
pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SessionCodec {
    /// Create a codec from the server-held secret
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: &str) -> Result<Self, AddressBookError> {
        if secret.is_empty() {
            return Err(AddressBookError::Config(
                "JWT_SECRET is required in production mode".into(),
            ));
        }

        if secret.len() < MIN_SECRET_LEN {
            return Err(AddressBookError::Config(format!(
                "JWT_SECRET must be at least {MIN_SECRET_LEN} characters"
            )));
        }

        Ok(Self::from_secret(secret))
    }

    /// Create a codec for dev mode (fixed, public secret)
    pub fn new_dev() -> Self {
        Self::from_secret(DEV_SECRET)
    }

    fn from_secret(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign `credentials` into a bearer token
    pub fn create(&self, credentials: &Credentials) -> Result<SessionToken, AddressBookError> {
        let token = encode(&Header::new(Algorithm::HS256), credentials, &self.encoding)
            .map_err(|e| AddressBookError::Internal(format!("Failed to generate token: {e}")))?;

        Ok(SessionToken { token })
    }

    /// Verify a token's signature and algorithm and recover its credentials
    pub fn decode(&self, token: &str) -> Result<Credentials, TokenError> {
        let data = decode::<Credentials>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}

impl std::fmt::Debug for SessionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCodec").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-characters-long";

    fn codec() -> SessionCodec {
        SessionCodec::new(SECRET).unwrap()
    }

    #[test]
    fn test_create_and_decode() {
        let codec = codec();
        let creds = Credentials::new("testUser", "testPassword");

        let token = codec.create(&creds).unwrap();
        assert!(!token.token.is_empty());

        let decoded = codec.decode(&token.token).unwrap();
        assert_eq!(decoded, creds);
    }

    #[test]
    fn test_token_serializes_as_object() {
        let token = SessionToken { token: "abc".into() };
        assert_eq!(serde_json::to_string(&token).unwrap(), r#"{"token":"abc"}"#);
    }

    #[test]
    fn test_invalid_token() {
        assert_eq!(codec().decode("invalid-token"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_tampered_signature() {
        let codec = codec();
        let token = codec.create(&Credentials::new("alice", "pw1")).unwrap().token;

        let (head, sig) = token.rsplit_once('.').unwrap();
        let mut sig: Vec<u8> = sig.bytes().collect();
        sig[0] = if sig[0] == b'A' { b'B' } else { b'A' };
        let tampered = format!("{head}.{}", String::from_utf8(sig).unwrap());

        assert!(codec.decode(&tampered).is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let other = SessionCodec::new("different-secret-that-is-at-least-32-characters").unwrap();
        let token = codec().create(&Credentials::new("alice", "pw1")).unwrap();

        assert_eq!(other.decode(&token.token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_rejects_other_algorithm() {
        let creds = Credentials::new("alice", "pw1");
        let token = encode(
            &Header::new(Algorithm::HS512),
            &creds,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(codec().decode(&token), Err(TokenError::UnexpectedAlgorithm));
    }

    #[test]
    fn test_rejects_foreign_claims() {
        #[derive(Serialize)]
        struct Other {
            sub: String,
        }

        let token = encode(
            &Header::new(Algorithm::HS256),
            &Other { sub: "x".into() },
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(codec().decode(&token), Err(TokenError::Claims(_))));
    }

    #[test]
    fn test_secret_validation() {
        assert!(SessionCodec::new("short").is_err());
        assert!(SessionCodec::new("").is_err());
        assert!(SessionCodec::new("this-secret-is-at-least-32-chars-long").is_ok());
    }

    #[test]
    fn test_dev_codec() {
        let codec = SessionCodec::new_dev();
        let creds = Credentials::new("dev", "dev");
        let token = codec.create(&creds).unwrap();
        assert_eq!(codec.decode(&token.token).unwrap(), creds);
    }
}
