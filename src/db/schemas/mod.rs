//! Database schemas for the address book
//!
//! Defines the MongoDB document structures for users and their embedded contacts.

mod contact;
mod metadata;
mod user;

pub use contact::{parse_contact_id, ContactDoc};
pub use metadata::Metadata;
pub use user::{UserDoc, USER_COLLECTION};
