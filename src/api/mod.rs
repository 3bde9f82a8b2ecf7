//! HTTP boundary: the `Api` seam and its reqwest implementation

mod client;

pub use client::HttpClient;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppResult;

/// Outbound request surface consumed by the state slices.
///
/// Paths are relative to the configured base URL. Implementations resolve
/// with the parsed response body (no envelope) and reject with a single
/// normalized `AppError`. Exactly one attempt per call: no retry, no
/// timeout, no cancellation below this seam.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Api: Send + Sync {
    async fn get(&self, path: &str) -> AppResult<Value>;

    /// GET with query parameters appended URL-encoded.
    async fn get_query(&self, path: &str, query: &[(String, String)]) -> AppResult<Value>;

    async fn post(&self, path: &str, body: Option<Value>) -> AppResult<Value>;

    async fn put(&self, path: &str, body: Value) -> AppResult<Value>;

    async fn delete(&self, path: &str) -> AppResult<Value>;
}
