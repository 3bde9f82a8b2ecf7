//! User administration slice (admin screens)

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::api::Api;
use crate::error::{AppError, AppResult};
use crate::models::user::UserProfile;

use super::Scope;

#[derive(Debug, Clone, Default)]
pub struct UsersState {
    pub users: Vec<UserProfile>,
    /// Single-user detail, independent of the listing
    pub details: Option<UserProfile>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct UsersSlice {
    api: Arc<dyn Api>,
    state: RwLock<UsersState>,
    scope: Scope,
}

impl UsersSlice {
    pub fn new(api: Arc<dyn Api>) -> Self {
        Self {
            api,
            state: RwLock::new(UsersState::default()),
            scope: Scope::new(),
        }
    }

    pub async fn state(&self) -> UsersState {
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
            .get("/users/")
            .await
            .and_then(|v| serde_json::from_value::<Vec<UserProfile>>(v).map_err(AppError::decode));

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(users) => {
                state.users = users;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    pub async fn fetch_details(&self, id: i64) -> AppResult<()> {
        let scope = self.scope.current().await;
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = self
            .api
            .get(&format!("/users/{}/", id))
            .await
            .and_then(|v| serde_json::from_value::<UserProfile>(v).map_err(AppError::decode));

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(user) => {
                state.details = Some(user);
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let scope = self.scope.current().await;

        let result = self.api.delete(&format!("/users/{}/", id)).await;

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        match result {
            Ok(_) => {
                state.users.retain(|u| u.id != id);
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    pub async fn clear_details(&self) {
        self.state.write().await.details = None;
    }
}
