//! User document schema
//!
//! One document per account: credentials plus the embedded contact collection.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::{ContactDoc, Metadata};
use crate::types::{AddressBookError, User};

/// Default collection name for users
pub const USER_COLLECTION: &str = "user";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at)
    #[serde(default)]
    pub metadata: Metadata,

    /// Unique, case-sensitive login name
    pub username: String,

    /// Digest from the credential hasher
    pub password: String,

    /// Bumped on every contact collection write; guards against lost updates
    #[serde(default)]
    pub revision: i64,

    /// Contacts in insertion order
    #[serde(default)]
    pub contacts: Vec<ContactDoc>,
}

impl UserDoc {
    /// Create a new user document with an empty contact collection
    pub fn new(username: String, password_digest: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            username,
            password: password_digest,
            revision: 0,
            contacts: Vec::new(),
        }
    }

    /// The persisted id, or an error for a document that was never stored
    pub fn id(&self) -> Result<ObjectId, AddressBookError> {
        self._id.ok_or_else(|| {
            AddressBookError::Database(format!("user document '{}' has no _id", self.username))
        })
    }

    /// Convert to the domain model
    pub fn to_model(&self) -> User {
        User {
            id: self._id.map(|id| id.to_hex()).unwrap_or_default(),
            username: self.username.clone(),
            password_digest: self.password.clone(),
            contacts: self.contacts.iter().map(ContactDoc::to_model).collect(),
        }
    }

    /// Index of the contact with `id`, if present
    pub fn position_of(&self, id: &ObjectId) -> Option<usize> {
        self.contacts.iter().position(|c| &c.id == id)
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "username": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("username_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
