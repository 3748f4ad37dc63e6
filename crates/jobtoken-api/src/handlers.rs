//! Request handlers.

pub mod admin;
pub mod analytics;
pub mod applications;
pub mod auth;
pub mod health;
pub mod jobs;
pub mod wallet;

pub use health::*;

use serde::Serialize;

use crate::error::ApiError;

/// `{"success": true}` with an optional message.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

/// A present, non-blank string field, or a 400 with `message`.
pub(crate) fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(message))
}
