//! Single-book detail slice, independent of the catalog collection

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::api::Api;
use crate::error::{AppError, AppResult};
use crate::models::book::Book;

use super::Scope;

#[derive(Debug, Clone, Default)]
pub struct BookDetailState {
    pub book: Option<Book>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct BookDetailSlice {
    api: Arc<dyn Api>,
    state: RwLock<BookDetailState>,
    scope: Scope,
}

impl BookDetailSlice {
    pub fn new(api: Arc<dyn Api>) -> Self {
        Self {
            api,
            state: RwLock::new(BookDetailState::default()),
            scope: Scope::new(),
        }
    }

    pub async fn state(&self) -> BookDetailState {
        self.state.read().await.clone()
    }

    pub async fn bind_scope(&self) -> CancellationToken {
        self.scope.bind().await
    }

    pub async fn cancel_scope(&self) {
        self.scope.cancel().await
    }

    pub async fn fetch(&self, id: i64) -> AppResult<()> {
        let scope = self.scope.current().await;
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = self
            .api
            .get(&format!("/books/{}/", id))
            .await
            .and_then(|v| serde_json::from_value::<Book>(v).map_err(AppError::decode));

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(book) => {
                state.book = Some(book);
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }
}
