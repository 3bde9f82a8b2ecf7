//! Book catalog slice

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::api::Api;
use crate::error::{AppError, AppResult};
use crate::models::book::{Book, BookPayload};

use super::Scope;

#[derive(Debug, Clone, Default)]
pub struct BooksState {
    pub books: Vec<Book>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct BooksSlice {
    api: Arc<dyn Api>,
    state: RwLock<BooksState>,
    scope: Scope,
}

impl BooksSlice {
    pub fn new(api: Arc<dyn Api>) -> Self {
        Self {
            api,
            state: RwLock::new(BooksState::default()),
            scope: Scope::new(),
        }
    }

    pub async fn state(&self) -> BooksState {
        self.state.read().await.clone()
    }

    pub async fn bind_scope(&self) -> CancellationToken {
        self.scope.bind().await
    }

    pub async fn cancel_scope(&self) {
        self.scope.cancel().await
    }

    /// Replace the whole collection with the server's; no merge, no diffing.
    pub async fn fetch_all(&self) -> AppResult<()> {
        let scope = self.scope.current().await;
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = self
            .api
            .get("/books/")
            .await
            .and_then(|v| serde_json::from_value::<Vec<Book>>(v).map_err(AppError::decode));

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(books) => {
                state.books = books;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    /// Server-side search by title, author or ISBN. An empty term falls back
    /// to the plain listing.
    pub async fn search(&self, term: &str) -> AppResult<()> {
        if term.is_empty() {
            return self.fetch_all().await;
        }
        let scope = self.scope.current().await;
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let query = [("search".to_string(), term.to_string())];
        let result = self
            .api
            .get_query("/books/", &query)
            .await
            .and_then(|v| serde_json::from_value::<Vec<Book>>(v).map_err(AppError::decode));

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(books) => {
                state.books = books;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    /// Append the server-returned entity; the collection is not refetched.
    pub async fn create(&self, payload: &BookPayload) -> AppResult<()> {
        payload.validate()?;
        let body = serde_json::to_value(payload).map_err(AppError::decode)?;
        let scope = self.scope.current().await;
        self.state.write().await.loading = true;

        let result = self
            .api
            .post("/books/", Some(body))
            .await
            .and_then(|v| serde_json::from_value::<Book>(v).map_err(AppError::decode));

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(book) => {
                state.books.push(book);
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    /// Replace the entity in place by id; a miss is a silent no-op.
    pub async fn update(&self, id: i64, payload: &BookPayload) -> AppResult<()> {
        payload.validate()?;
        let body = serde_json::to_value(payload).map_err(AppError::decode)?;
        let scope = self.scope.current().await;
        self.state.write().await.loading = true;

        let result = self
            .api
            .put(&format!("/books/{}/", id), body)
            .await
            .and_then(|v| serde_json::from_value::<Book>(v).map_err(AppError::decode));

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(book) => {
                if let Some(slot) = state.books.iter_mut().find(|b| b.id == book.id) {
                    *slot = book;
                }
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    /// Remove after server confirmation only; nothing optimistic.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let scope = self.scope.current().await;
        self.state.write().await.loading = true;

        let result = self.api.delete(&format!("/books/{}/", id)).await;

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(_) => {
                state.books.retain(|b| b.id != id);
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockApi;
    use crate::models::book::BookStatus;
    use serde_json::json;

    fn book_json(id: i64, title: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": title,
            "author": "Frank Herbert",
            "category": 1,
            "ISBN": "9780441172719",
            "status": "available"
        })
    }

    fn payload(title: &str) -> BookPayload {
        BookPayload {
            title: title.to_string(),
            author: "Frank Herbert".to_string(),
            category: 1,
            isbn: "9780441172719".to_string(),
            status: BookStatus::Available,
            description: None,
        }
    }

    async fn seeded_slice(api: MockApi) -> BooksSlice {
        let slice = BooksSlice::new(Arc::new(api));
        slice.fetch_all().await.unwrap();
        slice
    }

    fn listing_api() -> MockApi {
        let mut api = MockApi::new();
        api.expect_get()
            .withf(|path| path == "/books/")
            .returning(|_| Ok(json!([book_json(1, "Dune"), book_json(2, "Hyperion")])));
        api
    }

    #[tokio::test]
    async fn fetch_all_replaces_collection() {
        let slice = seeded_slice(listing_api()).await;
        let state = slice.state().await;
        assert_eq!(state.books.len(), 2);
        assert!(!state.loading);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn fetch_failure_keeps_previous_collection() {
        let mut api = MockApi::new();
        api.expect_get()
            .withf(|path| path == "/books/")
            .times(1)
            .returning(|_| Ok(json!([book_json(1, "Dune"), book_json(2, "Hyperion")])));
        api.expect_get()
            .withf(|path| path == "/books/")
            .returning(|_| {
                Err(AppError::Http {
                    status: 500,
                    message: "Internal Server Error".to_string(),
                })
            });
        let slice = BooksSlice::new(Arc::new(api));
        slice.fetch_all().await.unwrap();
        assert!(slice.fetch_all().await.is_err());

        let state = slice.state().await;
        assert_eq!(state.books.len(), 2);
        assert_eq!(state.error.as_deref(), Some("Internal Server Error"));
    }

    #[tokio::test]
    async fn create_appends_server_entity() {
        let mut api = listing_api();
        api.expect_post()
            .withf(|path, _| path == "/books/")
            .returning(|_, _| Ok(book_json(3, "Foundation")));

        let slice = seeded_slice(api).await;
        slice.create(&payload("Foundation")).await.unwrap();

        let state = slice.state().await;
        assert_eq!(state.books.len(), 3);
        assert!(state.books.iter().any(|b| b.id == 3));
    }

    #[tokio::test]
    async fn create_failure_leaves_collection_unchanged() {
        let mut api = listing_api();
        api.expect_post().returning(|_, _| {
            Err(AppError::Http {
                status: 400,
                message: "book with this ISBN already exists.".to_string(),
            })
        });

        let slice = seeded_slice(api).await;
        assert!(slice.create(&payload("Foundation")).await.is_err());

        let state = slice.state().await;
        assert_eq!(state.books.len(), 2);
        assert!(state.error.is_some());
    }

    #[tokio::test]
    async fn update_replaces_matching_entity_in_place() {
        let mut api = listing_api();
        api.expect_put()
            .withf(|path, _| path == "/books/2/")
            .returning(|_, _| Ok(book_json(2, "Hyperion (revised)")));

        let slice = seeded_slice(api).await;
        slice.update(2, &payload("Hyperion (revised)")).await.unwrap();

        let state = slice.state().await;
        assert_eq!(state.books.len(), 2);
        assert_eq!(state.books[1].title, "Hyperion (revised)");
    }

    #[tokio::test]
    async fn update_of_absent_id_is_a_silent_no_op() {
        let mut api = listing_api();
        api.expect_put()
            .returning(|_, _| Ok(book_json(99, "Ghost")));

        let slice = seeded_slice(api).await;
        slice.update(99, &payload("Ghost")).await.unwrap();

        let state = slice.state().await;
        assert_eq!(state.books.len(), 2);
        assert!(!state.books.iter().any(|b| b.id == 99));
    }

    #[tokio::test]
    async fn delete_removes_exactly_the_given_id() {
        let mut api = listing_api();
        api.expect_delete()
            .withf(|path| path == "/books/1/")
            .returning(|_| Ok(serde_json::Value::Null));

        let slice = seeded_slice(api).await;
        slice.delete(1).await.unwrap();

        let state = slice.state().await;
        assert_eq!(state.books.len(), 1);
        assert_eq!(state.books[0].id, 2);
    }

    #[tokio::test]
    async fn empty_search_term_hits_the_plain_listing() {
        // listing_api only expects the unqualified path; a query call would panic
        let slice = BooksSlice::new(Arc::new(listing_api()));
        slice.search("").await.unwrap();
        assert_eq!(slice.state().await.books.len(), 2);
    }

    #[tokio::test]
    async fn search_sends_the_term_as_query() {
        let mut api = MockApi::new();
        api.expect_get_query()
            .withf(|path, query| {
                path == "/books/" && *query == [("search".to_string(), "dune".to_string())]
            })
            .returning(|_, _| Ok(json!([book_json(1, "Dune")])));

        let slice = BooksSlice::new(Arc::new(api));
        slice.search("dune").await.unwrap();
        assert_eq!(slice.state().await.books.len(), 1);
    }

    #[tokio::test]
    async fn cancelled_scope_drops_the_settlement() {
        let slice = BooksSlice::new(Arc::new(listing_api()));
        slice.bind_scope().await;
        slice.cancel_scope().await;
        slice.fetch_all().await.unwrap();

        // The response arrived but the scope was gone: nothing was written
        assert!(slice.state().await.books.is_empty());
    }
}
