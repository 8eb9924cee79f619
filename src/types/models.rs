//! Domain models shared by the store, the access gate and the routes

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A registered account and its private contact collection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    /// Store-assigned identifier (hex), present once persisted
    pub id: String,
    pub username: String,
    /// Digest produced by the credential hasher, never the plaintext
    pub password_digest: String,
    /// Contacts in insertion order
    pub contacts: Vec<Contact>,
}

/// One address book entry, owned by exactly one user
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Contact {
    /// Assigned by the store on creation, unique within the owner's collection
    pub id: String,
    #[serde(alias = "first_name")]
    pub first_name: String,
    #[serde(alias = "last_name")]
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// Username + plaintext password, used for registration and login only.
///
/// The password is wiped from memory when the value is dropped.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_accepts_both_field_styles() {
        let camel: Contact =
            serde_json::from_str(r#"{"firstName":"A","lastName":"B","email":"a@b.com","phone":"1"}"#)
                .unwrap();
        let snake: Contact = serde_json::from_str(
            r#"{"first_name":"A","last_name":"B","email":"a@b.com","phone":"1"}"#,
        )
        .unwrap();

        assert_eq!(camel, snake);
        assert_eq!(camel.id, "");
        assert_eq!(camel.first_name, "A");
    }

    #[test]
    fn test_contact_serializes_camel_case() {
        let contact = Contact {
            id: "abc".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "555".into(),
        };
        let json = serde_json::to_value(&contact).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["lastName"], "Lovelace");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("alice", "pw1");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("alice"));
        assert!(!printed.contains("pw1"));
    }
}
