//! Integration tests for the user store
//!
//! Runs the shared document-store logic against the in-memory backend with the
//! real Argon2 hasher at a cheap cost.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use addressbook::auth::{Argon2Hasher, CredentialHasher, HashError, HashParams};
use addressbook::store::{DocumentUserStore, MemoryBackend, UserStore};
use addressbook::types::{AddressBookError, Contact, Credentials};

fn create_store() -> DocumentUserStore<MemoryBackend> {
    let hasher = Argon2Hasher::new(HashParams::new(8, 1, 1)).unwrap();
    DocumentUserStore::new(MemoryBackend::new(), Arc::new(hasher))
}

async fn create_user(store: &DocumentUserStore<MemoryBackend>, username: &str) {
    store
        .insert(&Credentials::new(username, "pw1"))
        .await
        .unwrap();
}

fn contact(first: &str, last: &str) -> Contact {
    Contact {
        first_name: first.into(),
        last_name: last.into(),
        email: format!("{}@example.com", first.to_lowercase()),
        phone: "555-0100".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_insert_then_find_hides_plaintext() {
    let store = create_store();

    let inserted = store.insert(&Credentials::new("alice", "pw1")).await.unwrap();
    assert!(!inserted.id.is_empty());

    let found = store.find_by_username("alice").await.unwrap();
    assert_eq!(found.username, "alice");
    assert_eq!(found.id, inserted.id);
    assert_ne!(found.password_digest, "pw1");
    assert!(!found.password_digest.contains("pw1"));
    assert!(found.contacts.is_empty());
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let store = create_store();
    create_user(&store, "alice").await;

    let result = store.insert(&Credentials::new("alice", "other")).await;
    assert!(matches!(result, Err(AddressBookError::Conflict(_))));

    // The original password still works
    assert!(store.login(&Credentials::new("alice", "pw1")).await.is_ok());
}

#[tokio::test]
async fn test_insert_requires_username_and_password() {
    let store = create_store();

    let result = store.insert(&Credentials::new("", "pw1")).await;
    assert!(matches!(result, Err(AddressBookError::Validation(_))));

    let result = store.insert(&Credentials::new("alice", "")).await;
    assert!(matches!(result, Err(AddressBookError::Validation(_))));
}

#[tokio::test]
async fn test_find_missing_user_is_not_found() {
    let store = create_store();
    let result = store.find_by_username("nobody").await;
    assert!(matches!(result, Err(AddressBookError::NotFound(_))));
}

#[tokio::test]
async fn test_find_all_users() {
    let store = create_store();
    create_user(&store, "alice").await;
    create_user(&store, "bob").await;

    let users = store.find_all().await.unwrap();
    let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["alice", "bob"]);
}

#[tokio::test]
async fn test_login() {
    let store = create_store();
    create_user(&store, "alice").await;

    let user = store.login(&Credentials::new("alice", "pw1")).await.unwrap();
    assert_eq!(user.username, "alice");

    let wrong_password = store.login(&Credentials::new("alice", "pw2")).await;
    assert!(matches!(wrong_password, Err(AddressBookError::Unauthorized(_))));

    // Unknown users are indistinguishable from wrong passwords
    let unknown = store.login(&Credentials::new("mallory", "pw1")).await;
    match (wrong_password, unknown) {
        (Err(a), Err(b)) => assert_eq!(a.public_message(), b.public_message()),
        _ => unreachable!(),
    }
}

/// Argon2 hasher that counts how many comparisons it ran
struct CountingHasher {
    inner: Argon2Hasher,
    compares: AtomicUsize,
}

impl CredentialHasher for CountingHasher {
    fn generate(&self, secret: &str) -> Result<String, HashError> {
        self.inner.generate(secret)
    }

    fn compare(&self, digest: &str, secret: &str) -> Result<(), HashError> {
        self.compares.fetch_add(1, Ordering::SeqCst);
        self.inner.compare(digest, secret)
    }
}

#[tokio::test]
async fn test_unknown_user_login_runs_a_comparison() {
    let hasher = Arc::new(CountingHasher {
        inner: Argon2Hasher::new(HashParams::new(8, 1, 1)).unwrap(),
        compares: AtomicUsize::new(0),
    });
    let store = DocumentUserStore::new(MemoryBackend::new(), hasher.clone());
    create_user(&store, "alice").await;

    let wrong_password = store.login(&Credentials::new("alice", "wrong")).await;
    assert!(matches!(wrong_password, Err(AddressBookError::Unauthorized(_))));
    assert_eq!(hasher.compares.load(Ordering::SeqCst), 1);

    let unknown = store.login(&Credentials::new("nobody", "wrong")).await;
    assert!(matches!(unknown, Err(AddressBookError::Unauthorized(_))));
    assert_eq!(hasher.compares.load(Ordering::SeqCst), 2);

    // The decoy digest never admits anyone
    let unknown = store.login(&Credentials::new("nobody", "")).await;
    assert!(matches!(unknown, Err(AddressBookError::Unauthorized(_))));
    assert_eq!(hasher.compares.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_delete_user() {
    let store = create_store();
    create_user(&store, "alice").await;
    store.create_contact("alice", &contact("Ann", "Lee")).await.unwrap();

    store.delete("alice").await.unwrap();

    assert!(matches!(
        store.find_by_username("alice").await,
        Err(AddressBookError::NotFound(_))
    ));
    assert!(matches!(
        store.delete("alice").await,
        Err(AddressBookError::NotFound(_))
    ));

    // The username is free again, with an empty collection
    create_user(&store, "alice").await;
    assert!(store.find_all_contacts("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ten_contacts_in_creation_order() {
    let store = create_store();
    create_user(&store, "alice").await;

    let mut created = Vec::new();
    for i in 0..10 {
        let c = store
            .create_contact("alice", &contact(&format!("First{i}"), "Last"))
            .await
            .unwrap();
        created.push(c);
    }

    let all = store.find_all_contacts("alice").await.unwrap();
    assert_eq!(all.len(), 10);
    assert_eq!(all, created);

    let ids: HashSet<&str> = all.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids.len(), 10);
    assert!(ids.iter().all(|id| !id.is_empty()));

    for (i, c) in all.iter().enumerate() {
        assert_eq!(c.first_name, format!("First{i}"));
    }
}

#[tokio::test]
async fn test_create_ignores_supplied_id() {
    let store = create_store();
    create_user(&store, "alice").await;

    let mut input = contact("Ann", "Lee");
    input.id = "65a000000000000000000001".into();
    let created = store.create_contact("alice", &input).await.unwrap();

    assert_ne!(created.id, input.id);
}

#[tokio::test]
async fn test_contacts_are_private_to_their_owner() {
    let store = create_store();
    create_user(&store, "alice").await;
    create_user(&store, "bob").await;

    let created = store.create_contact("alice", &contact("Ann", "Lee")).await.unwrap();

    assert!(store.find_all_contacts("bob").await.unwrap().is_empty());
    assert!(matches!(
        store.find_contact_by_id("bob", &created.id).await,
        Err(AddressBookError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_update_contact_persists_names_only() {
    let store = create_store();
    create_user(&store, "alice").await;
    let created = store.create_contact("alice", &contact("Ann", "Lee")).await.unwrap();

    let mut changed = created.clone();
    changed.first_name = "Anne".into();
    changed.last_name = "Leigh".into();
    store.update_contact("alice", &changed).await.unwrap();

    let fetched = store.find_contact_by_id("alice", &created.id).await.unwrap();
    assert_eq!(fetched.first_name, "Anne");
    assert_eq!(fetched.last_name, "Leigh");
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.email, created.email);
    assert_eq!(fetched.phone, created.phone);
}

#[tokio::test]
async fn test_update_contact_keeps_position() {
    let store = create_store();
    create_user(&store, "alice").await;
    let first = store.create_contact("alice", &contact("A", "1")).await.unwrap();
    let second = store.create_contact("alice", &contact("B", "2")).await.unwrap();

    let mut changed = first.clone();
    changed.phone = "555-9999".into();
    store.update_contact("alice", &changed).await.unwrap();

    let all = store.find_all_contacts("alice").await.unwrap();
    assert_eq!(all, vec![changed, second]);
}

#[tokio::test]
async fn test_update_with_invalid_id() {
    let store = create_store();
    create_user(&store, "alice").await;

    let mut bad = contact("Ann", "Lee");
    bad.id = "not-an-object-id".into();
    let result = store.update_contact("alice", &bad).await;
    assert!(matches!(result, Err(AddressBookError::InvalidId(_))));
}

#[tokio::test]
async fn test_update_absent_contact_is_noop() {
    let store = create_store();
    create_user(&store, "alice").await;
    let existing = store.create_contact("alice", &contact("Ann", "Lee")).await.unwrap();

    let mut ghost = contact("Ghost", "Contact");
    ghost.id = "65a000000000000000000001".into();
    store.update_contact("alice", &ghost).await.unwrap();

    let all = store.find_all_contacts("alice").await.unwrap();
    assert_eq!(all, vec![existing]);
}

#[tokio::test]
async fn test_delete_contact_then_find_is_not_found() {
    let store = create_store();
    create_user(&store, "alice").await;
    let created = store.create_contact("alice", &contact("Ann", "Lee")).await.unwrap();

    store.delete_contact("alice", &created.id).await.unwrap();

    assert!(matches!(
        store.find_contact_by_id("alice", &created.id).await,
        Err(AddressBookError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_absent_contact_is_noop() {
    let store = create_store();
    create_user(&store, "alice").await;
    let existing = store.create_contact("alice", &contact("Ann", "Lee")).await.unwrap();

    store
        .delete_contact("alice", "65a000000000000000000001")
        .await
        .unwrap();
    store.delete_contact("alice", "garbage").await.unwrap();

    assert_eq!(store.find_all_contacts("alice").await.unwrap(), vec![existing]);
}

#[tokio::test]
async fn test_contact_ops_on_unknown_user() {
    let store = create_store();

    assert!(matches!(
        store.create_contact("ghost", &contact("Ann", "Lee")).await,
        Err(AddressBookError::NotFound(_))
    ));
    assert!(matches!(
        store.find_all_contacts("ghost").await,
        Err(AddressBookError::NotFound(_))
    ));
    assert!(matches!(
        store.delete_contact("ghost", "65a000000000000000000001").await,
        Err(AddressBookError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_find_contact_with_invalid_id_is_not_found() {
    let store = create_store();
    create_user(&store, "alice").await;

    assert!(matches!(
        store.find_contact_by_id("alice", "xyz").await,
        Err(AddressBookError::NotFound(_))
    ));
}

/// Concurrent writers to one user's collection never lose an acknowledged write
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_lose_no_updates() {
    let store = Arc::new(create_store());
    create_user(&store, "alice").await;

    let mut handles = Vec::new();
    for i in 0..32 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .create_contact("alice", &contact(&format!("C{i}"), "X"))
                .await
        }));
    }

    let mut acknowledged = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(c) => acknowledged.push(c.id),
            Err(AddressBookError::Conflict(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    let stored: HashSet<String> = store
        .find_all_contacts("alice")
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();

    assert_eq!(stored.len(), acknowledged.len());
    assert!(acknowledged.iter().all(|id| stored.contains(id)));
}
