//! reqwest-backed implementation of the `Api` seam

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::Value;

use crate::error::{AppError, AppResult, FALLBACK_MESSAGE};
use crate::session::storage::SessionStore;

use super::Api;

/// HTTP client bound to one base URL and one session context.
///
/// The session store is injected explicitly; the client reads the current
/// access token from it on every outgoing request and never writes it.
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
}

impl HttpClient {
    pub fn new(base_url: &str, session: Arc<dyn SessionStore>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach `Authorization: Bearer <token>` when a token is present.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn dispatch(&self, request: RequestBuilder) -> AppResult<Value> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;
        unwrap_response(response).await
    }
}

#[async_trait]
impl Api for HttpClient {
    async fn get(&self, path: &str) -> AppResult<Value> {
        self.dispatch(self.http.get(self.url(path))).await
    }

    async fn get_query(&self, path: &str, query: &[(String, String)]) -> AppResult<Value> {
        self.dispatch(self.http.get(self.url(path)).query(query)).await
    }

    async fn post(&self, path: &str, body: Option<Value>) -> AppResult<Value> {
        let mut request = self.http.post(self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        self.dispatch(request).await
    }

    async fn put(&self, path: &str, body: Value) -> AppResult<Value> {
        self.dispatch(self.http.put(self.url(path)).json(&body)).await
    }

    async fn delete(&self, path: &str) -> AppResult<Value> {
        self.dispatch(self.http.delete(self.url(path))).await
    }
}

/// Resolve with the parsed body, or reject with one normalized error.
async fn unwrap_response(response: Response) -> AppResult<Value> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| AppError::Transport(e.to_string()))?;

    if status.is_success() {
        // DELETE and some actions answer 204 with an empty body
        if text.is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(&text).map_err(AppError::decode);
    }

    let body: Option<Value> = serde_json::from_str(&text).ok();
    let message = normalize_message(status, body.as_ref());
    tracing::warn!(status = status.as_u16(), "API error: {}", message);
    Err(AppError::Http {
        status: status.as_u16(),
        message,
    })
}

/// Pick the error message by priority: body `detail` field, body `message`
/// field, body `error` field, HTTP status reason, generic fallback.
fn normalize_message(status: StatusCode, body: Option<&Value>) -> String {
    body.and_then(|b| {
        b.get("detail")
            .and_then(Value::as_str)
            .or_else(|| b.get("message").and_then(Value::as_str))
            .or_else(|| b.get("error").and_then(Value::as_str))
    })
    .map(str::to_owned)
    .or_else(|| status.canonical_reason().map(str::to_owned))
    .unwrap_or_else(|| FALLBACK_MESSAGE.to_owned())
}
