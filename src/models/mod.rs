//! Wire models for the library API

pub mod book;
pub mod borrow;
pub mod category;
pub mod user;

pub use book::{Book, BookPayload, BookStatus};
pub use borrow::{ActionMessage, BorrowRecord, BorrowerEmail, BorrowerInfo, CreateBorrow};
pub use category::{Category, CreateCategory};
pub use user::{Credentials, RegisterUser, Role, TokenPair, UserProfile};
