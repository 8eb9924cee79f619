//! HTTP routes for the address book

pub mod contacts;
pub mod csv;
pub mod health;
pub mod response;
pub mod users;

pub use health::health_check;
pub use response::{
    error_response, from_error, json_response, method_not_allowed_response, not_found_response,
    preflight_response, read_body, HttpResponse, IMPORT_BODY_LIMIT, JSON_BODY_LIMIT,
};
pub use users::UserResponse;
