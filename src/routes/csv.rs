//! CSV codec for contact import and export
//!
//! Columns: `id,first_name,last_name,email,phone`. Import matches columns by
//! header name, so order is free and missing columns read as empty.

use serde::{Deserialize, Serialize};

use crate::types::{AddressBookError, Contact, Result};

/// Header row written on export
pub const CSV_HEADERS: [&str; 5] = ["id", "first_name", "last_name", "email", "phone"];

/// One CSV row
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ContactRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl From<&Contact> for ContactRecord {
    fn from(contact: &Contact) -> Self {
        Self {
            id: contact.id.clone(),
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
        }
    }
}

impl From<ContactRecord> for Contact {
    fn from(record: ContactRecord) -> Self {
        Self {
            id: record.id,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            phone: record.phone,
        }
    }
}

/// Render contacts as CSV, header row included even when empty
pub fn encode_contacts(contacts: &[Contact]) -> Result<String> {
    let csv_err = |e: csv::Error| AddressBookError::Internal(format!("CSV encoding failed: {}", e));

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADERS).map_err(csv_err)?;
    for contact in contacts {
        writer.serialize(ContactRecord::from(contact)).map_err(csv_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AddressBookError::Internal(format!("CSV encoding failed: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|e| AddressBookError::Internal(format!("CSV encoding failed: {}", e)))
}

/// Parse an uploaded CSV document into contacts
///
/// The first row must be a header row. Any unreadable record fails the whole
/// document with `Validation`.
pub fn decode_contacts(body: &[u8]) -> Result<Vec<Contact>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body);

    reader
        .deserialize::<ContactRecord>()
        .enumerate()
        .map(|(i, record)| {
            record.map(Contact::from).map_err(|e| {
                AddressBookError::Validation(format!("invalid CSV record {}: {}", i + 1, e))
            })
        })
        .collect()
}
