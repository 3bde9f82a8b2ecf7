//! Borrow record model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::book::Book;

/// Borrower identity attached for admin/librarian readers only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorrowerInfo {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// One loan of a book, from borrow date through optional return and fine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorrowRecord {
    pub id: i64,
    /// Borrowing user's id
    pub user: i64,
    /// Embedded book summary
    pub book: Book,
    #[serde(default)]
    pub user_info: Option<BorrowerInfo>,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub return_date: Option<DateTime<Utc>>,
    /// Server-computed fine, displayed read-only
    #[serde(default)]
    pub fine_amount: Decimal,
    #[serde(default)]
    pub fine_paid: bool,
}

impl BorrowRecord {
    /// A record is active until the book comes back.
    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }

    /// Overdue means still active and past due at `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && self.due_date < now
    }
}

/// Create request body for `POST /borrow-records/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBorrow {
    pub book_id: i64,
    pub due_date: DateTime<Utc>,
}

/// Email request body for `POST /borrow-records/:id/send_email/`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BorrowerEmail {
    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

/// Plain `{message}` acknowledgements from record actions
#[derive(Debug, Clone, Deserialize)]
pub struct ActionMessage {
    pub message: String,
}
