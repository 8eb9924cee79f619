//! Shared types: error taxonomy and domain models

mod error;
mod models;

pub use error::{AddressBookError, Result};
pub use models::{Contact, Credentials, User};
