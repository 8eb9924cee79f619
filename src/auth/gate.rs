//! Access gate for protected routes
//!
//! Two stages run in order before a protected handler:
//!
//! 1. Token stage: pull the bearer token out of the `Authorization` header and
//!    decode it back into credentials.
//! 2. Identity stage: log those credentials in against the user store.
//!
//! The result is an [`AuthSession`] handed to the handler as a plain argument.
//! Because the token carries the password, every protected request pays for a
//! full hash comparison.

use std::sync::Arc;

use hyper::header::HeaderValue;
use tracing::{debug, warn};

use crate::auth::SessionCodec;
use crate::store::UserStore;
use crate::types::{AddressBookError, Credentials, Result, User};

/// Identity resolved for one request
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub credentials: Credentials,
    pub user: User,
}

/// Extract the token from an `Authorization: Bearer <token>` header value
///
/// - absent or empty header: `Unauthorized`
/// - a value that is not visible ASCII, or anything other than exactly two
///   space-separated parts with a `Bearer` scheme: `Validation`
pub fn extract_bearer_token(header: Option<&HeaderValue>) -> Result<&str> {
    let malformed = || AddressBookError::Validation("invalid authorization header".into());

    let header = match header {
        Some(value) => value.to_str().map_err(|_| malformed())?.trim(),
        None => "",
    };
    if header.is_empty() {
        return Err(AddressBookError::Unauthorized(
            "route requires bearer authorization".into(),
        ));
    }

    // Other two-part schemes such as `Token abc` are refused, not ignored
    let parts: Vec<&str> = header.split(' ').collect();
    match parts.as_slice() {
        [scheme, token] if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => {
            Ok(*token)
        }
        _ => Err(malformed()),
    }
}

/// Admits requests whose bearer token names a valid account
#[derive(Clone)]
pub struct AccessGate {
    codec: SessionCodec,
    store: Arc<dyn UserStore>,
}

impl AccessGate {
    pub fn new(codec: SessionCodec, store: Arc<dyn UserStore>) -> Self {
        Self { codec, store }
    }

    /// Codec used to issue tokens at login
    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    /// Decode the header's token into the credentials it carries
    ///
    /// Decode failures are reported as `Internal`, not as a client error.
    pub fn token_stage(&self, header: Option<&HeaderValue>) -> Result<Credentials> {
        let token = extract_bearer_token(header)?;

        self.codec.decode(token).map_err(|e| {
            warn!("Bearer token rejected: {}", e);
            AddressBookError::Internal(format!("token decode failed: {}", e))
        })
    }

    /// Re-authenticate decoded credentials against the store
    pub async fn identity_stage(&self, credentials: Option<Credentials>) -> Result<AuthSession> {
        let Some(credentials) = credentials else {
            return Err(AddressBookError::Unauthorized("no credentials presented".into()));
        };

        match self.store.login(&credentials).await {
            Ok(user) => Ok(AuthSession { credentials, user }),
            Err(e) => {
                debug!("Identity stage refused {}: {}", credentials.username, e);
                Err(AddressBookError::Unauthorized("authentication failed".into()))
            }
        }
    }

    /// Run both stages against a raw `Authorization` header value
    pub async fn admit(&self, header: Option<&HeaderValue>) -> Result<AuthSession> {
        let credentials = self.token_stage(header)?;
        self.identity_stage(Some(credentials)).await
    }
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}
