//! Database layer for the address book
//!
//! Provides MongoDB storage for user documents and their embedded contacts.

pub mod mongo;
pub mod schemas;

pub use mongo::{MongoClient, MongoCollection};
pub use schemas::{ContactDoc, Metadata, UserDoc};
