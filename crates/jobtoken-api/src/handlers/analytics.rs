//! Admin dashboard figures, report and CSV export.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use jobtoken_models::{Role, TransactionType};

use crate::error::ApiResult;
use crate::services::analytics::{self, ChartPoint};
use crate::services::export::{self, FINANCIAL_LOG_FILENAME};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_revenue: i64,
    pub active_seekers: u64,
    pub registered_employers: u64,
    pub total_applications: u64,
}

/// Headline counts, each from an exact-count head query.
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let transactions = state.transactions();
    let profiles = state.profiles();
    let applications = state.applications();

    let (topups, seekers, employers, total_applications) = tokio::try_join!(
        transactions.count_by_type(TransactionType::Topup),
        profiles.count_by_role(Role::Seeker),
        profiles.count_by_role(Role::Employer),
        applications.count_all(),
    )?;

    Ok(Json(StatsResponse {
        total_revenue: analytics::total_revenue(topups),
        active_seekers: seekers,
        registered_employers: employers,
        total_applications,
    }))
}

#[derive(Debug, Serialize)]
pub struct AdvancedStatsResponse {
    pub token_liability: i64,
    pub revenue_per_category: BTreeMap<String, i64>,
    pub avg_time_to_hire: String,
}

pub async fn advanced_stats(
    State(state): State<AppState>,
) -> ApiResult<Json<AdvancedStatsResponse>> {
    let wallets = state.wallets();
    let jobs = state.jobs();
    let applications = state.applications();

    let (token_liability, categories, intervals) = tokio::try_join!(
        wallets.total_liability(),
        jobs.category_application_counts(),
        applications.shortlisted_intervals(),
    )?;

    Ok(Json(AdvancedStatsResponse {
        token_liability,
        revenue_per_category: analytics::revenue_per_category(&categories),
        avg_time_to_hire: analytics::average_days_to_hire(&intervals),
    }))
}

/// Rows of the store's report view, or the same figures computed per job
/// when the view can't be queried.
pub async fn analytics_report(State(state): State<AppState>) -> ApiResult<Response> {
    let jobs = state.jobs();

    match jobs.analytics_view().await {
        Ok(rows) => Ok(Json(rows).into_response()),
        Err(e) => {
            warn!(error = %e, "Analytics report view unavailable, computing from jobs");
            let report = analytics::report_from_jobs(jobs.report_rows().await?);
            Ok(Json(report).into_response())
        }
    }
}

/// Applications and top-up revenue for each of the last seven UTC days.
pub async fn chart_data(State(state): State<AppState>) -> ApiResult<Json<Vec<ChartPoint>>> {
    let today = Utc::now().date_naive();
    let since = analytics::chart_window_start(today);

    let applications = state.applications();
    let transactions = state.transactions();
    let (applied, topups) = tokio::try_join!(
        applications.created_since(since),
        transactions.created_since(TransactionType::Topup, since),
    )?;

    Ok(Json(analytics::chart_series(today, &applied, &topups)))
}

/// The last 30 days of the ledger as a CSV download.
pub async fn export_csv(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let now = Utc::now();
    let rows = state
        .transactions()
        .since_with_owner(export::export_window_start(now))
        .await?;

    let body = export::render_financial_log(&rows, now)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", FINANCIAL_LOG_FILENAME),
            ),
        ],
        body,
    ))
}
