//! Category slice, the single authoritative copy every screen consumes

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::api::Api;
use crate::error::{AppError, AppResult};
use crate::models::category::{Category, CreateCategory};

use super::Scope;

#[derive(Debug, Clone, Default)]
pub struct CategoriesState {
    pub categories: Vec<Category>,
    pub loading: bool,
    pub error: Option<String>,
    /// Set after a successful create, cleared explicitly by the view
    pub success: bool,
}

pub struct CategoriesSlice {
    api: Arc<dyn Api>,
    state: RwLock<CategoriesState>,
    scope: Scope,
}

impl CategoriesSlice {
    pub fn new(api: Arc<dyn Api>) -> Self {
        Self {
            api,
            state: RwLock::new(CategoriesState::default()),
            scope: Scope::new(),
        }
    }

    pub async fn state(&self) -> CategoriesState {
        self.state.read().await.clone()
    }

    pub async fn bind_scope(&self) -> CancellationToken {
        self.scope.bind().await
    }

    pub async fn cancel_scope(&self) {
        self.scope.cancel().await
    }

    pub async fn fetch_all(&self) -> AppResult<()> {
        let scope = self.scope.current().await;
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = self
            .api
            .get("/categories/")
            .await
            .and_then(|v| serde_json::from_value::<Vec<Category>>(v).map_err(AppError::decode));

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(categories) => {
                state.categories = categories;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    pub async fn create(&self, data: &CreateCategory) -> AppResult<()> {
        data.validate()?;
        let body = serde_json::to_value(data).map_err(AppError::decode)?;
        let scope = self.scope.current().await;
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
            state.success = false;
        }

        let result = self
            .api
            .post("/categories/", Some(body))
            .await
            .and_then(|v| serde_json::from_value::<Category>(v).map_err(AppError::decode));

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(category) => {
                state.categories.push(category);
                state.success = true;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                state.success = false;
                Err(e)
            }
        }
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let scope = self.scope.current().await;

        let result = self.api.delete(&format!("/categories/{}/", id)).await;

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        match result {
            Ok(_) => {
                state.categories.retain(|c| c.id != id);
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

    pub async fn clear_success(&self) {
        self.state.write().await.success = false;
    }
}
