//! Session state machine: anonymous -> authenticating -> authenticated ->
//! profile-loaded, back to anonymous on logout.

pub mod storage;

pub use storage::{FileSessionStore, MemorySessionStore, SessionStore};

use std::sync::Arc;

use serde_json::to_value;
use tokio::sync::RwLock;
use validator::Validate;

use crate::api::Api;
use crate::error::{AppError, AppResult};
use crate::models::user::{Credentials, RegisterUser, Role, TokenPair, UserProfile};

/// Authentication state mirrored by the view layer.
///
/// Invariant: `is_authenticated == access_token.is_some()`. `user` may be
/// `None` while authenticated; the profile is fetched separately.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub access_token: Option<String>,
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
    pub loading: bool,
    pub error: Option<String>,
}

/// The part of the session the authorization guard consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub is_authenticated: bool,
    pub role: Option<Role>,
}

/// Holds the token, profile and auth status; actions settle last-write-wins
/// with no mutual exclusion between concurrent attempts.
pub struct SessionSlice {
    api: Arc<dyn Api>,
    storage: Arc<dyn SessionStore>,
    state: RwLock<SessionState>,
}

impl SessionSlice {
    /// Restore the session from persisted storage.
    pub fn new(api: Arc<dyn Api>, storage: Arc<dyn SessionStore>) -> Self {
        let access_token = storage.access_token();
        let state = SessionState {
            is_authenticated: access_token.is_some(),
            access_token,
            ..SessionState::default()
        };
        Self {
            api,
            storage,
            state: RwLock::new(state),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            is_authenticated: state.is_authenticated,
            role: state.user.as_ref().map(|u| u.role),
        }
    }

    /// Exchange credentials for a token pair and persist it.
    pub async fn login(&self, credentials: &Credentials) -> AppResult<()> {
        let body = to_value(credentials).map_err(AppError::decode)?;
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = self
            .api
            .post("/api/token/", Some(body))
            .await
            .and_then(|v| serde_json::from_value::<TokenPair>(v).map_err(AppError::decode));

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(pair) => {
                if let Err(e) = self.storage.set_tokens(&pair.access, &pair.refresh) {
                    state.error = Some(e.message());
                    return Err(e);
                }
                state.access_token = Some(pair.access);
                state.is_authenticated = true;
                state.error = None;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    /// Create an account. Validation errors are field-keyed and never reach
    /// the network; success does not authenticate, the caller navigates to
    /// login afterwards.
    pub async fn register(&self, data: &RegisterUser) -> AppResult<()> {
        data.validate()?;
        let body = to_value(data).map_err(AppError::decode)?;
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = self.api.post("/users/", Some(body)).await;

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(_) => {
                state.error = None;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    /// Populate the profile. Failure sets the error but does not revoke
    /// authentication.
    pub async fn fetch_current_user(&self) -> AppResult<()> {
        {
            let mut state = self.state.write().await;
            state.loading = true;
        }

        let result = self
            .api
            .get("/users/me/")
            .await
            .and_then(|v| serde_json::from_value::<UserProfile>(v).map_err(AppError::decode));

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(profile) => {
                state.user = Some(profile);
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    /// Drop the session: no network call, tokens and fields cleared together.
    pub async fn logout(&self) -> AppResult<()> {
        {
            let mut state = self.state.write().await;
            state.access_token = None;
            state.user = None;
            state.is_authenticated = false;
        }
        self.storage.clear()
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }
}
