//! Account routes
//!
//! - `POST /users` register
//! - `POST /users/login` exchange credentials for a bearer token
//! - `GET /users/me` the account behind the bearer token
//! - `GET /users/{username}` public view of an account

use hyper::StatusCode;
use serde::Serialize;
use tracing::{error, info};

use crate::auth::{AuthSession, SessionCodec};
use crate::routes::response::{error_response, json_response, parse_json, HttpResponse};
use crate::store::UserStore;
use crate::types::{AddressBookError, Credentials, Result, User};

/// Public view of an account; the digest is never serialized
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
        }
    }
}

/// POST /users
///
/// Every store failure other than a rejected body, duplicate usernames
/// included, is reported as 500.
pub async fn create_user(store: &dyn UserStore, body: &[u8]) -> Result<HttpResponse> {
    let credentials: Credentials = parse_json(body)?;

    match store.insert(&credentials).await {
        Ok(user) => Ok(json_response(StatusCode::OK, &UserResponse::from(&user))),
        Err(e @ AddressBookError::Validation(_)) => Err(e),
        Err(e) => {
            error!("Registration of {} failed: {}", credentials.username, e);
            Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &e.public_message(),
            ))
        }
    }
}

/// POST /users/login
pub async fn login(
    store: &dyn UserStore,
    codec: &SessionCodec,
    body: &[u8],
) -> Result<HttpResponse> {
    let credentials: Credentials = parse_json(body)?;

    if let Err(e) = store.login(&credentials).await {
        if !matches!(e, AddressBookError::Unauthorized(_)) {
            error!("Login for {} failed: {}", credentials.username, e);
        }
        return Ok(error_response(
            StatusCode::UNAUTHORIZED,
            "invalid credentials",
        ));
    }

    let token = codec.create(&credentials)?;
    info!("User {} logged in", credentials.username);
    Ok(json_response(StatusCode::OK, &token))
}

/// GET /users/me
pub fn me(session: &AuthSession) -> HttpResponse {
    json_response(StatusCode::OK, &UserResponse::from(&session.user))
}

/// GET /users/{username}
///
/// The path segment is percent-decoded before lookup.
pub async fn get_user(store: &dyn UserStore, raw_username: &str) -> Result<HttpResponse> {
    let username = urlencoding::decode(raw_username)
        .map_err(|e| AddressBookError::Validation(format!("invalid username encoding: {}", e)))?;

    let user = store.find_by_username(&username).await?;
    Ok(json_response(StatusCode::OK, &UserResponse::from(&user)))
}
