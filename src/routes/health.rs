//! Liveness probe
//!
//! `/health` answers 200 whenever the process is serving requests; it does not
//! touch the user store.

use hyper::StatusCode;
use serde::Serialize;

use crate::routes::response::{json_response, HttpResponse};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
pub fn health_check() -> HttpResponse {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}
