//! Backend-independent implementation of [`UserStore`]

use std::sync::Arc;

use bson::oid::ObjectId;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::auth::{CredentialHasher, HashError};
use crate::db::schemas::{parse_contact_id, ContactDoc, UserDoc};
use crate::store::{UserBackend, UserStore};
use crate::types::{AddressBookError, Contact, Credentials, Result, User};

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// [`UserStore`] over any [`UserBackend`], hashing credentials with `hasher`
pub struct DocumentUserStore<B> {
    backend: B,
    hasher: Arc<dyn CredentialHasher>,
    /// Digest of a random secret, compared against when a login names no user
    decoy_digest: OnceCell<String>,
}

impl<B: UserBackend> DocumentUserStore<B> {
    pub fn new(backend: B, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self {
            backend,
            hasher,
            decoy_digest: OnceCell::new(),
        }
    }

    async fn load(&self, username: &str) -> Result<UserDoc> {
        self.backend
            .find_by_username(username)
            .await?
            .ok_or_else(|| AddressBookError::NotFound(format!("user '{}' not found", username)))
    }

    /// Write `user.contacts` back, conditional on the revision it was read at
    async fn commit(&self, user: &UserDoc) -> Result<()> {
        let user_id = user.id()?;
        let written = self
            .backend
            .replace_contacts(user_id, user.revision, &user.contacts)
            .await?;

        if written {
            Ok(())
        } else {
            warn!(
                "Contact write for '{}' lost the race at revision {}",
                user.username, user.revision
            );
            Err(AddressBookError::Conflict(
                "contacts were modified concurrently, retry the request".into(),
            ))
        }
    }

    async fn hash(&self, secret: &str) -> Result<String> {
        let hasher = Arc::clone(&self.hasher);
        let secret = Zeroizing::new(secret.to_string());

        tokio::task::spawn_blocking(move || hasher.generate(&secret))
            .await?
            .map_err(|e| AddressBookError::Internal(format!("Failed to hash password: {}", e)))
    }

    async fn verify(&self, digest: String, secret: &str) -> Result<std::result::Result<(), HashError>> {
        let hasher = Arc::clone(&self.hasher);
        let secret = Zeroizing::new(secret.to_string());

        Ok(tokio::task::spawn_blocking(move || hasher.compare(&digest, &secret)).await?)
    }

    /// Run a full comparison that can never succeed
    ///
    /// Unknown usernames cost the same hashing work as a wrong password.
    async fn verify_decoy(&self, secret: &str) -> Result<()> {
        let digest = self
            .decoy_digest
            .get_or_try_init(|| async {
                let seed = uuid::Uuid::new_v4().to_string();
                self.hash(&seed).await
            })
            .await?
            .clone();

        let _ = self.verify(digest, secret).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl<B: UserBackend> UserStore for DocumentUserStore<B> {
    async fn insert(&self, credentials: &Credentials) -> Result<User> {
        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Err(AddressBookError::Validation(
                "username and password are required".into(),
            ));
        }

        let digest = self.hash(&credentials.password).await?;
        let mut doc = UserDoc::new(credentials.username.clone(), digest);

        let id = self.backend.insert(doc.clone()).await?;
        doc._id = Some(id);

        info!("Registered user {}", credentials.username);
        Ok(doc.to_model())
    }

    async fn find_by_username(&self, username: &str) -> Result<User> {
        Ok(self.load(username).await?.to_model())
    }

    async fn find_all(&self) -> Result<Vec<User>> {
        let docs = self.backend.find_all().await?;
        Ok(docs.iter().map(UserDoc::to_model).collect())
    }

    async fn delete(&self, username: &str) -> Result<()> {
        if self.backend.remove(username).await? {
            info!("Deleted user {}", username);
            Ok(())
        } else {
            Err(AddressBookError::NotFound(format!("user '{}' not found", username)))
        }
    }

    async fn login(&self, credentials: &Credentials) -> Result<User> {
        let Some(doc) = self.backend.find_by_username(&credentials.username).await? else {
            self.verify_decoy(&credentials.password).await?;
            debug!("Login failed - user not found: {}", credentials.username);
            return Err(AddressBookError::Unauthorized(INVALID_CREDENTIALS.into()));
        };

        match self.verify(doc.password.clone(), &credentials.password).await? {
            Ok(()) => Ok(doc.to_model()),
            Err(HashError::Mismatch) => {
                debug!("Login failed - invalid password: {}", credentials.username);
                Err(AddressBookError::Unauthorized(INVALID_CREDENTIALS.into()))
            }
            Err(e) => {
                warn!(
                    "Login failed - stored digest for {} is corrupt: {}",
                    credentials.username, e
                );
                Err(AddressBookError::Unauthorized(INVALID_CREDENTIALS.into()))
            }
        }
    }

    async fn create_contact(&self, username: &str, contact: &Contact) -> Result<Contact> {
        let mut user = self.load(username).await?;

        let created = ContactDoc::with_id(ObjectId::new(), contact);
        user.contacts.push(created.clone());
        self.commit(&user).await?;

        debug!("Created contact {} for {}", created.id, username);
        Ok(created.to_model())
    }

    async fn find_all_contacts(&self, username: &str) -> Result<Vec<Contact>> {
        Ok(self.load(username).await?.to_model().contacts)
    }

    async fn find_contact_by_id(&self, username: &str, contact_id: &str) -> Result<Contact> {
        let not_found = || AddressBookError::NotFound("no contact with that id".into());

        let id = parse_contact_id(contact_id).ok_or_else(not_found)?;
        let user = self.load(username).await?;

        user.position_of(&id)
            .map(|i| user.contacts[i].to_model())
            .ok_or_else(not_found)
    }

    async fn update_contact(&self, username: &str, contact: &Contact) -> Result<()> {
        let id = parse_contact_id(&contact.id)
            .ok_or_else(|| AddressBookError::InvalidId(format!("invalid id '{}'", contact.id)))?;
        let mut user = self.load(username).await?;

        let Some(index) = user.position_of(&id) else {
            debug!("Update of absent contact {} for {} is a no-op", id, username);
            return Ok(());
        };

        user.contacts[index] = ContactDoc::with_id(id, contact);
        self.commit(&user).await
    }

    async fn delete_contact(&self, username: &str, contact_id: &str) -> Result<()> {
        let mut user = self.load(username).await?;

        let Some(index) = parse_contact_id(contact_id).and_then(|id| user.position_of(&id)) else {
            debug!("Delete of absent contact {} for {} is a no-op", contact_id, username);
            return Ok(());
        };

        user.contacts.remove(index);
        self.commit(&user).await
    }
}
