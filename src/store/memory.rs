//! In-memory [`UserBackend`] for dev mode and tests
//!
//! Mirrors the MongoDB backend's observable behaviour: unique usernames,
//! store-assigned ObjectIds and revision-checked contact writes.

use bson::oid::ObjectId;
use dashmap::{mapref::entry::Entry, DashMap};

use crate::db::schemas::{ContactDoc, UserDoc};
use crate::store::UserBackend;
use crate::types::{AddressBookError, Result};

#[derive(Default)]
pub struct MemoryBackend {
    users: DashMap<ObjectId, UserDoc>,
    /// Username -> document id; doubles as the unique index
    usernames: DashMap<String, ObjectId>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait::async_trait]
impl UserBackend for MemoryBackend {
    async fn insert(&self, mut doc: UserDoc) -> Result<ObjectId> {
        match self.usernames.entry(doc.username.clone()) {
            Entry::Occupied(_) => Err(AddressBookError::Conflict(format!(
                "username '{}' already exists",
                doc.username
            ))),
            Entry::Vacant(slot) => {
                let id = ObjectId::new();
                doc._id = Some(id);
                self.users.insert(id, doc);
                slot.insert(id);
                Ok(id)
            }
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserDoc>> {
        let Some(id) = self.usernames.get(username).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|doc| doc.value().clone()))
    }

    async fn find_all(&self) -> Result<Vec<UserDoc>> {
        let mut docs: Vec<UserDoc> = self.users.iter().map(|doc| doc.value().clone()).collect();
        // ObjectIds grow monotonically within a process: sort for insertion order
        docs.sort_by_key(|doc| doc._id);
        Ok(docs)
    }

    async fn remove(&self, username: &str) -> Result<bool> {
        match self.usernames.remove(username) {
            Some((_, id)) => Ok(self.users.remove(&id).is_some()),
            None => Ok(false),
        }
    }

    async fn replace_contacts(
        &self,
        user_id: ObjectId,
        expected_revision: i64,
        contacts: &[ContactDoc],
    ) -> Result<bool> {
        let Some(mut doc) = self.users.get_mut(&user_id) else {
            return Ok(false);
        };

        if doc.revision != expected_revision {
            return Ok(false);
        }

        doc.contacts = contacts.to_vec();
        doc.revision += 1;
        doc.metadata.touch();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_assigns_id_and_enforces_unique_username() {
        let backend = MemoryBackend::new();

        let id = backend
            .insert(UserDoc::new("alice".into(), "d".into()))
            .await
            .unwrap();
        let stored = backend.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored._id, Some(id));

        let dup = backend.insert(UserDoc::new("alice".into(), "d2".into())).await;
        assert!(matches!(dup, Err(AddressBookError::Conflict(_))));
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_usernames_are_case_sensitive() {
        let backend = MemoryBackend::new();
        backend.insert(UserDoc::new("alice".into(), "d".into())).await.unwrap();
        backend.insert(UserDoc::new("Alice".into(), "d".into())).await.unwrap();
        assert_eq!(backend.len(), 2);
    }

    #[tokio::test]
    async fn test_replace_contacts_checks_revision() {
        let backend = MemoryBackend::new();
        let id = backend
            .insert(UserDoc::new("alice".into(), "d".into()))
            .await
            .unwrap();
        let contact = ContactDoc::with_id(ObjectId::new(), &Default::default());

        assert!(backend.replace_contacts(id, 0, &[contact.clone()]).await.unwrap());
        // A second writer that also read revision 0 must not clobber the first
        assert!(!backend.replace_contacts(id, 0, &[]).await.unwrap());

        let stored = backend.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.revision, 1);
        assert_eq!(stored.contacts, vec![contact]);
    }

    #[tokio::test]
    async fn test_remove() {
        let backend = MemoryBackend::new();
        backend.insert(UserDoc::new("alice".into(), "d".into())).await.unwrap();

        assert!(backend.remove("alice").await.unwrap());
        assert!(!backend.remove("alice").await.unwrap());
        assert!(backend.find_by_username("alice").await.unwrap().is_none());
        assert!(backend.is_empty());
    }
}
