//! Application handlers: applying, status changes and the seeker and
//! employer views of applications.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use jobtoken_models::ApplicationStatus;
use jobtoken_store::SeekerApplication;

use crate::error::{ApiError, ApiResult};
use crate::handlers::wallet::UserQuery;
use crate::handlers::{required, SuccessResponse};
use crate::state::AppState;

const EXPIRED_WALLET_MESSAGE: &str = "Your tokens have expired. Please top up to reactivate.";
const MISSING_STATUS_FIELDS: &str = "Missing applicationId or status";

// =============================================================================
// Status updates
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub application_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Record an employer's decision and email the applicant about shortlists
/// and rejections.
pub async fn update_status(
    State(state): State<AppState>,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let application_id = required(&request.application_id, MISSING_STATUS_FIELDS)?;
    required(&request.status, MISSING_STATUS_FIELDS)?;
    // Stored and matched untrimmed
    let status = request.status.as_deref().unwrap_or_default();
    let notes = request.notes.as_deref();

    let application = state
        .applications()
        .update_status(application_id, status, notes)
        .await
        .inspect_err(|e| error!(application_id = %application_id, error = %e, "Status update error"))?;

    state
        .notifier
        .notify_status_change(&application, status, notes)
        .await?;

    Ok(Json(SuccessResponse::ok()))
}

// =============================================================================
// Applying
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Address for the confirmation email; none is sent when absent.
    #[serde(default)]
    pub email: Option<String>,
}

/// Spend tokens on a job application through the store procedure.
pub async fn apply(
    State(state): State<AppState>,
    Json(request): Json<ApplyRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let job_id = required(&request.job_id, "jobId is required")?;
    let user_id = required(&request.user_id, "userId is required")?;

    // Not atomic with the procedure; the store remains the authority.
    if let Some(wallet) = state.wallets().find_by_user(user_id).await? {
        if wallet.is_expired() {
            return Err(ApiError::bad_request(EXPIRED_WALLET_MESSAGE));
        }
    }

    let outcome = state.store.apply_to_job(job_id, user_id).await?;
    if !outcome.success {
        return Err(ApiError::bad_request(
            outcome.error.unwrap_or_else(|| "Failed to apply".to_string()),
        ));
    }

    if let Some(email) = request.email.filter(|e| !e.trim().is_empty()) {
        let notifier = state.notifier.clone();
        let job_id = job_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = notifier
                .send_application_confirmation(&email, Some(&job_id))
                .await
            {
                warn!(job_id = %job_id, error = %e, "Application confirmation email failed");
            }
        });
    }

    Ok(Json(SuccessResponse::ok()))
}

// =============================================================================
// Seeker views
// =============================================================================

pub async fn seeker_applications(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Vec<SeekerApplication>>> {
    let user_id = required(&query.user_id, "userId is required")?;
    Ok(Json(state.applications().for_user(user_id).await?))
}

#[derive(Debug, Serialize)]
pub struct SeekerStats {
    pub applications: u64,
    /// Tokens spent on applications
    pub spent: i64,
}

pub async fn seeker_stats(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<SeekerStats>> {
    let user_id = required(&query.user_id, "userId is required")?;

    let applications = state.applications().count_for_user(user_id).await?;

    let spent = match state.wallets().find_by_user(user_id).await? {
        Some(wallet) => state
            .transactions()
            .deductions_for_wallet(&wallet.id)
            .await?
            .into_iter()
            .map(i64::abs)
            .sum(),
        None => 0,
    };

    Ok(Json(SeekerStats {
        applications,
        spent,
    }))
}

// =============================================================================
// Employer views
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerQuery {
    #[serde(default)]
    pub employer_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmployerApplicationRow {
    pub id: String,
    pub status: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub job_title: Option<String>,
    pub applicant_name: Option<String>,
    pub applicant_email: Option<String>,
}

/// Every application to the employer's jobs, newest first.
pub async fn employer_applications(
    State(state): State<AppState>,
    Query(query): Query<EmployerQuery>,
) -> ApiResult<Json<Vec<EmployerApplicationRow>>> {
    let employer_id = required(&query.employer_id, "employerId is required")?;

    let rows = state
        .applications()
        .for_employer(employer_id)
        .await?
        .into_iter()
        .map(|row| {
            let job_title = row.job_title().map(str::to_string);
            let status = row
                .application
                .status
                .clone()
                .unwrap_or_else(|| ApplicationStatus::Pending.to_string());
            let (applicant_name, applicant_email) = row
                .applicant
                .map(|a| (a.full_name, a.email))
                .unwrap_or_default();

            EmployerApplicationRow {
                id: row.application.id,
                status,
                notes: row.application.notes.unwrap_or_default(),
                created_at: row.application.created_at,
                job_title,
                applicant_name,
                applicant_email,
            }
        })
        .collect();

    Ok(Json(rows))
}

#[derive(Debug, Serialize)]
pub struct ApplicantRow {
    pub id: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub async fn job_applicants(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Vec<ApplicantRow>>> {
    let applicants = state.applications().applicants_for_job(&job_id).await?;
    info!(job_id = %job_id, count = applicants.len(), "Listed applicants");

    let rows = applicants
        .into_iter()
        .map(|row| {
            let applicant = row.applicant.unwrap_or_default();
            ApplicantRow {
                id: applicant.id,
                full_name: applicant.full_name,
                email: applicant.email,
                created_at: row.created_at,
            }
        })
        .collect();

    Ok(Json(rows))
}
