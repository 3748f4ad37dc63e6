//! Job posting handlers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use jobtoken_models::{Job, NewJob};

use crate::error::ApiResult;
use crate::handlers::applications::EmployerQuery;
use crate::handlers::required;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListQuery {
    #[serde(default)]
    pub job_type: Option<String>,
}

/// All postings newest first.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> ApiResult<Json<Vec<Job>>> {
    let job_type = query
        .job_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    Ok(Json(state.jobs().list(job_type).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    #[serde(default)]
    pub posted_by: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub token_cost: Option<i64>,
}

pub async fn create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> ApiResult<(StatusCode, Json<Job>)> {
    let posted_by = required(&request.posted_by, "postedBy is required")?;

    let new_job = NewJob::new(
        posted_by,
        &request.title,
        &request.description,
        &request.job_type,
        request.token_cost,
    )?;

    let job = state.jobs().create(&new_job).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

#[derive(Debug, Serialize)]
pub struct EmployerJob {
    #[serde(flatten)]
    pub job: Job,
    pub applications_count: u64,
}

/// The employer's postings with how many applications each received.
pub async fn employer_jobs(
    State(state): State<AppState>,
    Query(query): Query<EmployerQuery>,
) -> ApiResult<Json<Vec<EmployerJob>>> {
    let employer_id = required(&query.employer_id, "employerId is required")?;

    let jobs = state
        .jobs()
        .list_for_employer(employer_id)
        .await?
        .into_iter()
        .map(|row| {
            let applications_count = row.application_count();
            EmployerJob {
                job: row.job,
                applications_count,
            }
        })
        .collect();

    Ok(Json(jobs))
}
