//! Catalog record types.
//!
//! The catalog is a generic record store keyed by collection name. Each
//! record is an envelope of system fields (`_id`, `_createdDate`,
//! `_updatedDate`) around free-form JSON content; typed entities serialize
//! into that content with camelCase field names, the CMS collection layout
//! the log's data is published in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{error::StorageError, id::generate_prefixed_id};

/// A unique, stable identifier for a catalog record.
///
/// Treat the value as opaque; the collection prefix is a generation detail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: &str) -> Self {
        RecordId(id.to_string())
    }

    pub fn new_random(prefix: &str) -> Self {
        RecordId(generate_prefixed_id(prefix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Check that this id was generated with the given collection prefix.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        crate::id::validate_prefixed_id(&self.0, prefix)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A typed entity stored in a named catalog collection.
pub trait CollectionItem: Serialize + DeserializeOwned {
    /// Logical collection name.
    const COLLECTION: &'static str;
    /// Prefix for generated record ids.
    const ID_PREFIX: &'static str;
}

/// Storage envelope around one catalog record.
///
/// Serializes to the CMS wire layout: system fields first, entity fields
/// flattened alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "_id")]
    pub id: RecordId,
    #[serde(rename = "_createdDate")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "_updatedDate")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: serde_json::Value,
}

/// One page of results from a collection listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// A typed view of a stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub item: T,
}

impl<T: CollectionItem> Stored<T> {
    /// Decode a record's fields into the typed entity.
    pub fn from_record(record: Record) -> Result<Self, StorageError> {
        let item = serde_json::from_value(record.fields)
            .map_err(|e| StorageError::Malformed(e.to_string()))?;

        Ok(Self {
            id: record.id,
            created_at: record.created_at,
            updated_at: record.updated_at,
            item,
        })
    }
}

/// A book in the owner's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub is_must_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub micro_review: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_read: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
}

impl CollectionItem for Book {
    const COLLECTION: &'static str = "books";
    const ID_PREFIX: &'static str = "bk";
}

/// A visitor comment, optionally attached to one book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_id: Option<RecordId>,
    pub visitor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitor_email: Option<String>,
    pub comment_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    pub comment_date: DateTime<Utc>,
}

impl CollectionItem for Comment {
    const COLLECTION: &'static str = "comments";
    const ID_PREFIX: &'static str = "cmt";
}

/// A thematic shelf the books are grouped under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThematicCategory {
    pub category_key: String,
    pub category_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i64>,
}

impl CollectionItem for ThematicCategory {
    const COLLECTION: &'static str = "categories";
    const ID_PREFIX: &'static str = "cat";
}
