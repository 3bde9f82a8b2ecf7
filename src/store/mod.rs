//! Client state store: one authoritative slice per resource.

pub mod book_detail;
pub mod books;
pub mod borrows;
pub mod categories;
pub mod users;

pub use book_detail::BookDetailSlice;
pub use books::BooksSlice;
pub use borrows::BorrowsSlice;
pub use categories::CategoriesSlice;
pub use users::UsersSlice;

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::api::{Api, HttpClient};
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::session::{FileSessionStore, SessionSlice, SessionStore};

/// View-lifetime scope for in-flight requests.
///
/// A slice action captures the current token at dispatch; a settlement whose
/// token was cancelled in the meantime is dropped without mutating state, so
/// unmounted views cannot write into orphaned slices.
pub(crate) struct Scope {
    token: RwLock<CancellationToken>,
}

impl Scope {
    pub(crate) fn new() -> Self {
        Self {
            token: RwLock::new(CancellationToken::new()),
        }
    }

    pub(crate) async fn current(&self) -> CancellationToken {
        self.token.read().await.clone()
    }

    /// Start a fresh scope (view mounted); earlier tokens stay cancelled.
    pub(crate) async fn bind(&self) -> CancellationToken {
        let fresh = CancellationToken::new();
        *self.token.write().await = fresh.clone();
        fresh
    }

    /// Cancel the active scope (view unmounted).
    pub(crate) async fn cancel(&self) {
        self.token.read().await.cancel();
    }
}

/// All slices plus the session, wired to one API client and one session
/// store. The view layer's only data source.
pub struct Store {
    pub session: SessionSlice,
    pub books: BooksSlice,
    pub book_detail: BookDetailSlice,
    pub borrows: BorrowsSlice,
    pub categories: CategoriesSlice,
    pub users: UsersSlice,
}

impl Store {
    pub fn new(api: Arc<dyn Api>, storage: Arc<dyn SessionStore>) -> Self {
        Self {
            session: SessionSlice::new(api.clone(), storage),
            books: BooksSlice::new(api.clone()),
            book_detail: BookDetailSlice::new(api.clone()),
            borrows: BorrowsSlice::new(api.clone()),
            categories: CategoriesSlice::new(api.clone()),
            users: UsersSlice::new(api),
        }
    }

    /// Build the production store: file-backed session storage and a reqwest
    /// client bound to the configured base URL.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let storage: Arc<dyn SessionStore> =
            Arc::new(FileSessionStore::open(&config.session.storage_path)?);
        let api: Arc<dyn Api> = Arc::new(HttpClient::new(&config.api.base_url, storage.clone())?);
        Ok(Self::new(api, storage))
    }
}
