//! Contact routes
//!
//! Every handler here runs behind the access gate and receives the resolved
//! [`AuthSession`]; contacts are always read and written under the session's
//! own username.

use hyper::StatusCode;
use tracing::{error, info};

use crate::auth::AuthSession;
use crate::routes::csv::{decode_contacts, encode_contacts};
use crate::routes::response::{csv_response, error_response, json_response, parse_json, HttpResponse};
use crate::store::UserStore;
use crate::types::{AddressBookError, Contact, Result};

const EXPORT_FILENAME: &str = "contacts.csv";

/// GET /contacts
pub async fn list(store: &dyn UserStore, session: &AuthSession) -> Result<HttpResponse> {
    let contacts = store.find_all_contacts(&session.user.username).await?;
    Ok(json_response(StatusCode::OK, &contacts))
}

/// GET /contacts/export
pub async fn export(store: &dyn UserStore, session: &AuthSession) -> Result<HttpResponse> {
    let contacts = store.find_all_contacts(&session.user.username).await?;
    csv_response(EXPORT_FILENAME, encode_contacts(&contacts)?)
}

/// GET /contacts/{id}
pub async fn find(store: &dyn UserStore, session: &AuthSession, id: &str) -> Result<HttpResponse> {
    let contact = store.find_contact_by_id(&session.user.username, id).await?;
    Ok(json_response(StatusCode::OK, &contact))
}

/// POST /contacts
///
/// Any id in the body is ignored; the store assigns a fresh one.
pub async fn create(store: &dyn UserStore, session: &AuthSession, body: &[u8]) -> Result<HttpResponse> {
    let contact: Contact = parse_json(body)?;
    let created = store.create_contact(&session.user.username, &contact).await?;
    Ok(json_response(StatusCode::OK, &created))
}

/// POST /contacts/import
///
/// Records are created one by one. The first failure stops the batch; contacts
/// created before it are kept.
pub async fn import(store: &dyn UserStore, session: &AuthSession, body: &[u8]) -> Result<HttpResponse> {
    let records = decode_contacts(body)?;
    let total = records.len();
    let username = &session.user.username;

    let mut created = Vec::with_capacity(total);
    for record in &records {
        match store.create_contact(username, record).await {
            Ok(contact) => created.push(contact),
            Err(e) => {
                error!(
                    "Import for {} stopped at record {} of {}: {}",
                    username,
                    created.len() + 1,
                    total,
                    e
                );
                return Ok(error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &format!("import aborted after {} of {} contacts", created.len(), total),
                ));
            }
        }
    }

    info!("Imported {} contacts for {}", created.len(), username);
    Ok(json_response(StatusCode::OK, &created))
}

/// POST /contacts/{id}
///
/// The path id names the contact; a body that names a different one is
/// rejected.
pub async fn update(
    store: &dyn UserStore,
    session: &AuthSession,
    id: &str,
    body: &[u8],
) -> Result<HttpResponse> {
    let mut contact: Contact = parse_json(body)?;

    if !contact.id.is_empty() && contact.id != id {
        return Err(AddressBookError::Validation(format!(
            "body id '{}' does not match path id '{}'",
            contact.id, id
        )));
    }
    contact.id = id.to_string();

    store.update_contact(&session.user.username, &contact).await?;
    Ok(json_response(StatusCode::OK, &contact))
}

/// DELETE /contacts/{id}
pub async fn delete(store: &dyn UserStore, session: &AuthSession, id: &str) -> Result<HttpResponse> {
    store.delete_contact(&session.user.username, id).await?;
    Ok(json_response(
        StatusCode::OK,
        &serde_json::json!({ "result": "success" }),
    ))
}
