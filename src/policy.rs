//! Top-level response-handling policy owned by the view layer.
//!
//! The HTTP adapter stays a pure I/O boundary; deciding to navigate on a
//! server error happens here.

use url::form_urlencoded;

use crate::error::AppError;

pub const ERROR_ROUTE: &str = "/error";
pub const LOGIN_ROUTE: &str = "/login";

/// Route to the error page for any server-reported status >= 400, carrying
/// the status and URL-encoded message as query parameters. `None` for every
/// other failure kind; those stay inline in slice state.
pub fn error_route(error: &AppError) -> Option<String> {
    match error {
        AppError::Http { status, message } if *status >= 400 => {
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair("status", &status.to_string())
                .append_pair("message", message)
                .finish();
            Some(format!("{}?{}", ERROR_ROUTE, query))
        }
        _ => None,
    }
}
