//! Contact sub-document schema
//!
//! Contacts live inline in their owner's user document; they have no
//! collection of their own.

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::types::Contact;

/// Contact as stored inside `UserDoc::contacts`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ContactDoc {
    /// Unique within the owning user's collection only
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl ContactDoc {
    /// Copy the editable fields of `contact` under the given id.
    ///
    /// `contact.id` is ignored; the caller decides which id the document gets.
    pub fn with_id(id: ObjectId, contact: &Contact) -> Self {
        Self {
            id,
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
        }
    }

    /// Convert to the domain model
    pub fn to_model(&self) -> Contact {
        Contact {
            id: self.id.to_hex(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Parse a contact id, returning `None` if it is not a valid ObjectId
pub fn parse_contact_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}
