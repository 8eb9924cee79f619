//! Response builders and request body helpers shared by the route handlers

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::types::{AddressBookError, Result};

/// Response type produced by every handler
pub type HttpResponse = Response<Full<Bytes>>;

/// Limit for single-record JSON bodies
pub const JSON_BODY_LIMIT: usize = 10 * 1024;

/// Limit for CSV contact imports
pub const IMPORT_BODY_LIMIT: usize = 1_000_000;

fn with_cors(mut response: HttpResponse) -> HttpResponse {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    response
}

fn build(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> HttpResponse {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    with_cors(response)
}

/// Serialize `body` as the JSON response payload
pub fn json_response<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> HttpResponse {
    match serde_json::to_vec(body) {
        Ok(json) => build(status, "application/json", json),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            build(
                StatusCode::INTERNAL_SERVER_ERROR,
                "application/json",
                r#"{"error":"internal error"}"#,
            )
        }
    }
}

/// `{"error": message}` with the given status
pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    json_response(status, &serde_json::json!({ "error": message }))
}

/// Translate a typed failure into its status and public message
///
/// Server-side failures are logged with their detail, which never reaches the
/// response body.
pub fn from_error(err: &AddressBookError) -> HttpResponse {
    let status = err.status_code();
    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        debug!("Request rejected: {}", err);
    }
    error_response(status, &err.public_message())
}

/// CSV download served as an attachment named `filename`
pub fn csv_response(filename: &str, body: String) -> Result<HttpResponse> {
    let disposition = HeaderValue::from_str(&format!("attachment;filename={}", filename))
        .map_err(|e| AddressBookError::Internal(format!("Invalid filename header: {}", e)))?;

    let mut response = build(StatusCode::OK, "text/csv", body);
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, disposition);
    Ok(response)
}

/// CORS preflight response
pub fn preflight_response() -> HttpResponse {
    let mut response = with_cors(Response::new(Full::new(Bytes::new())));
    *response.status_mut() = StatusCode::NO_CONTENT;
    response.headers_mut().insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("86400"),
    );
    response
}

pub fn not_found_response() -> HttpResponse {
    error_response(StatusCode::NOT_FOUND, "not found")
}

pub fn method_not_allowed_response() -> HttpResponse {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
}

/// Collect a request body, refusing anything over `limit` bytes
pub async fn read_body<B>(body: B, limit: usize) -> Result<Bytes>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(
            AddressBookError::Validation(format!("request body exceeds {} bytes", limit)),
        ),
        Err(e) => Err(AddressBookError::Validation(format!(
            "failed to read body: {}",
            e
        ))),
    }
}

/// Parse a JSON request body
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    if body.is_empty() {
        return Err(AddressBookError::Validation("no request body".into()));
    }

    serde_json::from_slice(body)
        .map_err(|e| AddressBookError::Validation(format!("invalid JSON: {}", e)))
}
