//! User storage
//!
//! Two seams:
//!
//! - [`UserStore`] is the operation set the access gate and the routes consume.
//! - [`UserBackend`] is the document-store contract a persistence backend has to
//!   satisfy. [`DocumentUserStore`] implements the former once on top of any
//!   backend, so MongoDB and the in-memory double share the contact logic.
//!
//! Contacts are an embedded sub-collection of the user document. Every contact
//! mutation reads the whole document, edits the collection in memory and
//! replaces the whole collection in one conditional write.

mod document;
mod memory;
mod mongo;

use bson::oid::ObjectId;

use crate::db::schemas::{ContactDoc, UserDoc};
use crate::types::{Contact, Credentials, Result, User};

pub use document::DocumentUserStore;
pub use memory::MemoryBackend;
pub use mongo::MongoBackend;

/// Authoritative store of accounts and their contacts
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Register a new account; `Conflict` if the username is taken
    async fn insert(&self, credentials: &Credentials) -> Result<User>;

    /// `NotFound` if absent
    async fn find_by_username(&self, username: &str) -> Result<User>;

    async fn find_all(&self) -> Result<Vec<User>>;

    /// Remove the account and every contact it owns; `NotFound` if absent
    async fn delete(&self, username: &str) -> Result<()>;

    /// Verify credentials; unknown user and wrong password are both `Unauthorized`
    async fn login(&self, credentials: &Credentials) -> Result<User>;

    /// Append a contact under a freshly assigned id and return it
    async fn create_contact(&self, username: &str, contact: &Contact) -> Result<Contact>;

    /// All contacts in stored order
    async fn find_all_contacts(&self, username: &str) -> Result<Vec<Contact>>;

    /// `NotFound` if the id is absent or not a valid id
    async fn find_contact_by_id(&self, username: &str, contact_id: &str) -> Result<Contact>;

    /// Replace the contact with `contact.id` in place.
    ///
    /// `InvalidId` for a malformed id; an id missing from the collection is a no-op.
    async fn update_contact(&self, username: &str, contact: &Contact) -> Result<()>;

    /// Remove the contact; an id missing from the collection is a no-op
    async fn delete_contact(&self, username: &str, contact_id: &str) -> Result<()>;
}

/// Document-store operations over user documents
#[async_trait::async_trait]
pub trait UserBackend: Send + Sync {
    /// Persist a new document; `Conflict` on a duplicate username
    async fn insert(&self, doc: UserDoc) -> Result<ObjectId>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserDoc>>;

    async fn find_all(&self) -> Result<Vec<UserDoc>>;

    /// Returns whether a document was removed
    async fn remove(&self, username: &str) -> Result<bool>;

    /// Replace the embedded contact collection of `user_id`, but only if the
    /// stored revision still equals `expected_revision`. Bumps the revision.
    ///
    /// Returns `false` when nothing matched (revision moved on or user gone).
    async fn replace_contacts(
        &self,
        user_id: ObjectId,
        expected_revision: i64,
        contacts: &[ContactDoc],
    ) -> Result<bool>;
}
