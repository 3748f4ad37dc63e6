//! Account email handlers.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::error;

use crate::error::ApiResult;
use crate::handlers::{required, SuccessResponse};
use crate::state::AppState;

const APPLICATION_CONFIRMATION: &str = "application_confirmation";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendVerificationRequest {
    #[serde(default)]
    pub email: Option<String>,
    /// `application_confirmation` sends the application receipt instead.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
}

/// Send a verification magic link, or an application confirmation.
pub async fn resend_verification(
    State(state): State<AppState>,
    Json(request): Json<ResendVerificationRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let email = required(&request.email, "Email is required")?;

    if request.kind.as_deref() == Some(APPLICATION_CONFIRMATION) {
        state
            .notifier
            .send_application_confirmation(email, request.job_id.as_deref())
            .await
            .inspect_err(|e| error!(error = %e, "Confirmation email error"))?;
        return Ok(Json(SuccessResponse::ok()));
    }

    state
        .notifier
        .send_verification(email, &state.config.magic_link_redirect())
        .await
        .inspect_err(|e| error!(error = %e, "Verification email error"))?;

    Ok(Json(SuccessResponse::with_message("Verification email sent")))
}
