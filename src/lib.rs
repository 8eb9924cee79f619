//! Address book - per-user contact collections behind bearer-token auth
//!
//! Each registered user owns a private collection of contacts. Clients log in
//! with a username and password, receive a signed session token, and present
//! it on every contact request.
//!
//! ## Components
//!
//! - **Credential hasher**: Argon2id digests with an appended salt
//! - **Session codec**: HS256 tokens carrying the login credentials
//! - **User store**: accounts with an embedded contact collection, on MongoDB
//!   or in memory
//! - **Access gate**: decodes the bearer token and re-authenticates it
//! - **Routes**: JSON endpoints for users and contacts, CSV import/export

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use store::{DocumentUserStore, MemoryBackend, MongoBackend, UserStore};
pub use types::{AddressBookError, Result};
