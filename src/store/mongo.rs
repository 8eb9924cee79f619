//! MongoDB-backed [`UserBackend`]

use bson::{doc, oid::ObjectId, DateTime};
use tracing::info;

use crate::db::schemas::{ContactDoc, UserDoc};
use crate::db::{MongoClient, MongoCollection};
use crate::store::UserBackend;
use crate::types::{AddressBookError, Result};

/// User documents in one MongoDB collection, unique on `username`
#[derive(Clone)]
pub struct MongoBackend {
    users: MongoCollection<UserDoc>,
}

impl MongoBackend {
    /// Open `collection` and ensure the username index exists
    pub async fn new(client: &MongoClient, collection: &str) -> Result<Self> {
        let users = client.collection::<UserDoc>(collection).await?;
        info!(
            "User collection '{}.{}' ready",
            client.db_name(),
            collection
        );
        Ok(Self { users })
    }
}

#[async_trait::async_trait]
impl UserBackend for MongoBackend {
    async fn insert(&self, doc: UserDoc) -> Result<ObjectId> {
        let username = doc.username.clone();
        self.users.insert_one(doc).await.map_err(|e| match e {
            AddressBookError::Conflict(_) => {
                AddressBookError::Conflict(format!("username '{}' already exists", username))
            }
            other => other,
        })
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserDoc>> {
        self.users.find_one(doc! { "username": username }).await
    }

    async fn find_all(&self) -> Result<Vec<UserDoc>> {
        self.users.find_many(doc! {}).await
    }

    async fn remove(&self, username: &str) -> Result<bool> {
        self.users.delete_one(doc! { "username": username }).await
    }

    async fn replace_contacts(
        &self,
        user_id: ObjectId,
        expected_revision: i64,
        contacts: &[ContactDoc],
    ) -> Result<bool> {
        let contacts = bson::to_bson(contacts)?;

        let result = self
            .users
            .update_one(
                doc! { "_id": user_id, "revision": expected_revision },
                doc! {
                    "$set": {
                        "contacts": contacts,
                        "metadata.updated_at": DateTime::now(),
                    },
                    "$inc": { "revision": 1_i64 },
                },
            )
            .await?;

        Ok(result.matched_count == 1)
    }
}
