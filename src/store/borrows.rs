//! Borrow record slice: loan lifecycle, fines and borrower email

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::api::Api;
use crate::error::{AppError, AppResult};
use crate::models::borrow::{ActionMessage, BorrowRecord, BorrowerEmail, CreateBorrow};

use super::Scope;

#[derive(Debug, Clone, Default)]
pub struct BorrowsState {
    pub records: Vec<BorrowRecord>,
    /// Outstanding fines, the librarian/admin fine screen's listing
    pub unpaid: Vec<BorrowRecord>,
    pub loading: bool,
    pub error: Option<String>,
    pub success_message: Option<String>,
}

pub struct BorrowsSlice {
    api: Arc<dyn Api>,
    state: RwLock<BorrowsState>,
    scope: Scope,
}

impl BorrowsSlice {
    pub fn new(api: Arc<dyn Api>) -> Self {
        Self {
            api,
            state: RwLock::new(BorrowsState::default()),
            scope: Scope::new(),
        }
    }

    pub async fn state(&self) -> BorrowsState {
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
            .get("/borrow-records")
            .await
            .and_then(|v| serde_json::from_value::<Vec<BorrowRecord>>(v).map_err(AppError::decode));

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(records) => {
                state.records = records;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    pub async fn create(&self, data: &CreateBorrow) -> AppResult<()> {
        let body = serde_json::to_value(data).map_err(AppError::decode)?;
        let scope = self.scope.current().await;
        self.state.write().await.loading = true;

        let result = self
            .api
            .post("/borrow-records/", Some(body))
            .await
            .and_then(|v| serde_json::from_value::<BorrowRecord>(v).map_err(AppError::decode));

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(record) => {
                state.records.push(record);
                state.success_message = Some("Borrow record created successfully".to_string());
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    /// Mark the loan returned, then re-read the record so `return_date` and
    /// the fine reflect the server's authoritative values.
    pub async fn return_book(&self, id: i64) -> AppResult<()> {
        let scope = self.scope.current().await;
        self.state.write().await.loading = true;

        let result = self.settle_record_action(id, "return_book").await;

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok((message, record)) => {
                if let Some(slot) = state.records.iter_mut().find(|r| r.id == record.id) {
                    *slot = record;
                }
                state.success_message = Some(message.message);
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    /// Email the borrower; no state mutation beyond the transient message.
    pub async fn send_email(&self, id: i64, email: &BorrowerEmail) -> AppResult<()> {
        email.validate()?;
        let body = serde_json::to_value(email).map_err(AppError::decode)?;
        let scope = self.scope.current().await;

        let result = self
            .api
            .post(&format!("/borrow-records/{}/send_email/", id), Some(body))
            .await
            .and_then(|v| serde_json::from_value::<ActionMessage>(v).map_err(AppError::decode));

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        match result {
            Ok(message) => {
                state.success_message = Some(message.message);
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
        self.state.write().await.loading = true;

        let result = self.api.delete(&format!("/borrow-records/{}/", id)).await;

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(_) => {
                state.records.retain(|r| r.id != id);
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    /// Load outstanding fines into the dedicated listing.
    pub async fn fetch_unpaid_fines(&self) -> AppResult<()> {
        let scope = self.scope.current().await;
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = self
            .api
            .get("/borrow-records/unpaid_fines/")
            .await
            .and_then(|v| serde_json::from_value::<Vec<BorrowRecord>>(v).map_err(AppError::decode));

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(records) => {
                state.unpaid = records;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    /// Settle a fine manually, then re-read the record; a settled fine also
    /// leaves the unpaid listing.
    pub async fn mark_fine_paid(&self, id: i64) -> AppResult<()> {
        let scope = self.scope.current().await;
        self.state.write().await.loading = true;

        let result = self.settle_record_action(id, "mark_fine_paid").await;

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok((message, record)) => {
                if let Some(slot) = state.records.iter_mut().find(|r| r.id == record.id) {
                    *slot = record;
                }
                state.unpaid.retain(|r| r.id != id);
                state.success_message = Some(message.message);
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.message());
                Err(e)
            }
        }
    }

    /// Trigger overdue notifications; the server reports how many went out.
    pub async fn check_due_books(&self) -> AppResult<()> {
        let scope = self.scope.current().await;

        let result = self
            .api
            .get("/borrow-records/check_due_books/")
            .await
            .and_then(|v| serde_json::from_value::<ActionMessage>(v).map_err(AppError::decode));

        if scope.is_cancelled() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        match result {
            Ok(message) => {
                state.success_message = Some(message.message);
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
        self.state.write().await.success_message = None;
    }

    /// POST a record action, then fetch the authoritative record back.
    async fn settle_record_action(
        &self,
        id: i64,
        action: &str,
    ) -> AppResult<(ActionMessage, BorrowRecord)> {
        let message = self
            .api
            .post(&format!("/borrow-records/{}/{}/", id, action), None)
            .await
            .and_then(|v| serde_json::from_value::<ActionMessage>(v).map_err(AppError::decode))?;
        let record = self
            .api
            .get(&format!("/borrow-records/{}/", id))
            .await
            .and_then(|v| serde_json::from_value::<BorrowRecord>(v).map_err(AppError::decode))?;
        Ok((message, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockApi;
    use serde_json::json;

    fn record_json(id: i64, return_date: Option<&str>) -> serde_json::Value {
        json!({
            "id": id,
            "user": 7,
            "book": {
                "id": 3,
                "title": "Dune",
                "author": "Frank Herbert",
                "category": 1,
                "ISBN": "9780441172719",
                "status": "borrowed"
            },
            "user_info": {"id": 7, "username": "alice", "email": "alice@example.org"},
            "borrow_date": "2025-01-01T12:00:00Z",
            "due_date": "2025-01-15T12:00:00Z",
            "return_date": return_date,
            "fine_amount": "0.00",
            "fine_paid": false
        })
    }

    fn listing_api() -> MockApi {
        let mut api = MockApi::new();
        api.expect_get()
            .withf(|path| path == "/borrow-records")
            .returning(|_| Ok(json!([record_json(42, None), record_json(43, None)])));
        api
    }

    #[tokio::test]
    async fn fetch_all_replaces_records() {
        let slice = BorrowsSlice::new(Arc::new(listing_api()));
        slice.fetch_all().await.unwrap();
        assert_eq!(slice.state().await.records.len(), 2);
    }

    #[tokio::test]
    async fn return_book_rederives_the_record_from_the_server() {
        let mut api = listing_api();
        api.expect_post()
            .withf(|path, _| path == "/borrow-records/42/return_book/")
            .returning(|_, _| Ok(json!({"message": "Book returned successfully"})));
        api.expect_get()
            .withf(|path| path == "/borrow-records/42/")
            .returning(|_| Ok(record_json(42, Some("2025-01-20T09:30:00Z"))));

        let slice = BorrowsSlice::new(Arc::new(api));
        slice.fetch_all().await.unwrap();
        slice.return_book(42).await.unwrap();

        let state = slice.state().await;
        let returned = state.records.iter().find(|r| r.id == 42).unwrap();
        assert!(returned.return_date.is_some());
        // The server's timestamp, not a client-side "now"
        assert_eq!(
            returned.return_date.unwrap().to_rfc3339(),
            "2025-01-20T09:30:00+00:00"
        );
        let other = state.records.iter().find(|r| r.id == 43).unwrap();
        assert!(other.return_date.is_none());
        assert_eq!(
            state.success_message.as_deref(),
            Some("Book returned successfully")
        );
    }

    #[tokio::test]
    async fn create_appends_and_sets_success_message() {
        let mut api = listing_api();
        api.expect_post()
            .withf(|path, _| path == "/borrow-records/")
            .returning(|_, _| Ok(record_json(44, None)));

        let slice = BorrowsSlice::new(Arc::new(api));
        slice.fetch_all().await.unwrap();
        let data = CreateBorrow {
            book_id: 3,
            due_date: "2025-02-01T12:00:00Z".parse().unwrap(),
        };
        slice.create(&data).await.unwrap();

        let state = slice.state().await;
        assert_eq!(state.records.len(), 3);
        assert!(state.success_message.is_some());
    }

    #[tokio::test]
    async fn delete_removes_exactly_the_given_record() {
        let mut api = listing_api();
        api.expect_delete()
            .withf(|path| path == "/borrow-records/42/")
            .returning(|_| Ok(serde_json::Value::Null));

        let slice = BorrowsSlice::new(Arc::new(api));
        slice.fetch_all().await.unwrap();
        slice.delete(42).await.unwrap();

        let state = slice.state().await;
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.records[0].id, 43);
    }

    #[tokio::test]
    async fn send_email_only_sets_the_transient_message() {
        let mut api = listing_api();
        api.expect_post()
            .withf(|path, _| path == "/borrow-records/42/send_email/")
            .returning(|_, _| Ok(json!({"message": "Email sent successfully."})));

        let slice = BorrowsSlice::new(Arc::new(api));
        slice.fetch_all().await.unwrap();
        let email = BorrowerEmail {
            subject: "Overdue".to_string(),
            message: "Please return Dune".to_string(),
        };
        slice.send_email(42, &email).await.unwrap();

        let state = slice.state().await;
        assert_eq!(state.records.len(), 2);
        assert_eq!(state.success_message.as_deref(), Some("Email sent successfully."));
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn empty_email_subject_never_reaches_the_network() {
        let slice = BorrowsSlice::new(Arc::new(MockApi::new()));
        let email = BorrowerEmail {
            subject: String::new(),
            message: "body".to_string(),
        };
        let err = slice.send_email(42, &email).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn mark_fine_paid_drops_the_record_from_the_unpaid_listing() {
        let mut api = MockApi::new();
        api.expect_get()
            .withf(|path| path == "/borrow-records/unpaid_fines/")
            .returning(|_| Ok(json!([record_json(42, Some("2025-01-20T09:30:00Z"))])));
        api.expect_post()
            .withf(|path, _| path == "/borrow-records/42/mark_fine_paid/")
            .returning(|_, _| Ok(json!({"message": "Fine of 50.00 for Dune marked as paid"})));
        api.expect_get()
            .withf(|path| path == "/borrow-records/42/")
            .returning(|_| Ok(record_json(42, Some("2025-01-20T09:30:00Z"))));

        let slice = BorrowsSlice::new(Arc::new(api));
        slice.fetch_unpaid_fines().await.unwrap();
        assert_eq!(slice.state().await.unpaid.len(), 1);

        slice.mark_fine_paid(42).await.unwrap();
        let state = slice.state().await;
        assert!(state.unpaid.is_empty());
        assert!(state.success_message.is_some());
    }

    #[tokio::test]
    async fn failed_fetch_leaves_previous_records_and_sets_error() {
        let mut api = MockApi::new();
        api.expect_get()
            .withf(|path| path == "/borrow-records")
            .times(1)
            .returning(|_| Ok(json!([record_json(42, None)])));
        api.expect_get()
            .withf(|path| path == "/borrow-records")
            .returning(|_| {
                Err(AppError::Http {
                    status: 502,
                    message: "Bad Gateway".to_string(),
                })
            });

        let slice = BorrowsSlice::new(Arc::new(api));
        slice.fetch_all().await.unwrap();
        assert!(slice.fetch_all().await.is_err());

        let state = slice.state().await;
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.error.as_deref(), Some("Bad Gateway"));
    }
}
