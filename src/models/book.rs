//! Book model and related types

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Circulation status of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Available,
    Borrowed,
    Reserved,
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BookStatus::Available => "available",
            BookStatus::Borrowed => "borrowed",
            BookStatus::Reserved => "reserved",
        };
        write!(f, "{}", label)
    }
}

/// Catalog entry as served by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Category id (the API serializes the relation as its primary key)
    pub category: i64,
    #[serde(rename = "ISBN")]
    pub isbn: String,
    pub status: BookStatus,
    #[serde(default)]
    pub description: Option<String>,
}

/// Create/update request body for `POST /books/` and `PUT /books/:id/`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BookPayload {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    pub category: i64,
    #[serde(rename = "ISBN")]
    #[validate(length(min = 10, max = 13, message = "ISBN must be 10 to 13 characters"))]
    pub isbn: String,
    pub status: BookStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
