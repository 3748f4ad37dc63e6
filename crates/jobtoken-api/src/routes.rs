//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::auth::require_admin;
use crate::handlers::admin::{admin_jobs, admin_transactions, delete_job, global_search, grant_tokens};
use crate::handlers::analytics::{advanced_stats, analytics_report, chart_data, export_csv, stats};
use crate::handlers::applications::{
    apply, employer_applications, job_applicants, seeker_applications, seeker_stats, update_status,
};
use crate::handlers::auth::resend_verification;
use crate::handlers::jobs::{create_job, employer_jobs, list_jobs};
use crate::handlers::wallet::{get_wallet, topup, wallet_transactions};
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    ClientRateLimiter,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let account_routes = Router::new()
        .route("/auth/resend-verification", post(resend_verification))
        .route("/topup", post(topup))
        .route("/wallet", get(get_wallet))
        .route("/wallet/transactions", get(wallet_transactions));

    let job_routes = Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/apply", post(apply))
        .route("/applications/update-status", post(update_status))
        .route("/seeker/applications", get(seeker_applications))
        .route("/seeker/stats", get(seeker_stats))
        .route("/employer/jobs", get(employer_jobs))
        .route("/employer/jobs/:job_id/applicants", get(job_applicants))
        .route("/employer/applications", get(employer_applications));

    // Guarded by require_admin once a JWT secret is configured
    let admin_routes = Router::new()
        .route("/jobs", get(admin_jobs))
        .route("/jobs/delete", post(delete_job))
        .route("/tokens/grant", post(grant_tokens))
        .route("/transactions", get(admin_transactions))
        .route("/global-search", get(global_search))
        // Dashboard
        .route("/stats", get(stats))
        .route("/advanced-stats", get(advanced_stats))
        .route("/analytics-report", get(analytics_report))
        .route("/chart-data", get(chart_data))
        .route("/export-csv", get(export_csv))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let rate_limiter = ClientRateLimiter::new(state.config.rate_limit_rps);

    let api_routes = Router::new()
        .merge(account_routes)
        .merge(job_routes)
        .nest("/admin", admin_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
