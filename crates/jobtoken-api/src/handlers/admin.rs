//! Admin portal handlers: job moderation, token grants, listings and search.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use jobtoken_models::Profile;
use jobtoken_store::{JobWithPoster, TransactionWithOwner};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::handlers::{required, SuccessResponse};
use crate::state::AppState;

const RECENT_TRANSACTIONS_LIMIT: u32 = 50;
const SEARCH_RESULT_LIMIT: u32 = 5;
const MIN_SEARCH_LEN: usize = 3;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteJobRequest {
    #[serde(default)]
    pub job_id: Option<String>,
}

pub async fn delete_job(
    State(state): State<AppState>,
    actor: Option<AuthUser>,
    Json(request): Json<DeleteJobRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let job_id = required(&request.job_id, "jobId is required")?;

    state.jobs().delete(job_id).await?;

    info!(
        job_id = %job_id,
        actor = actor.as_ref().map(|a| a.uid.as_str()).unwrap_or("anonymous"),
        "Admin deleted job"
    );
    Ok(Json(SuccessResponse::ok()))
}

#[derive(Debug, Deserialize)]
pub struct GrantTokensRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
}

/// Whole-number amounts, as a JSON number or a numeric string.
fn parse_amount(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Credit (or debit, for negative amounts) a user's wallet by email.
pub async fn grant_tokens(
    State(state): State<AppState>,
    actor: Option<AuthUser>,
    Json(request): Json<GrantTokensRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let email = required(&request.email, "Email is required")?;

    let amount = parse_amount(request.amount.as_ref())
        .filter(|amount| *amount != 0)
        .ok_or_else(|| ApiError::bad_request("Amount must be a non-zero whole number"))?;

    let wallet = state
        .wallet_service
        .grant(email, amount)
        .await
        .inspect_err(|e| error!(email = %email, amount, error = %e, "Token grant failed"))?;

    info!(
        email = %email,
        amount,
        balance = wallet.token_balance,
        actor = actor.as_ref().map(|a| a.uid.as_str()).unwrap_or("anonymous"),
        "Admin granted tokens"
    );
    Ok(Json(SuccessResponse::ok()))
}

pub async fn admin_jobs(State(state): State<AppState>) -> ApiResult<Json<Vec<JobWithPoster>>> {
    Ok(Json(state.jobs().list_with_poster().await?))
}

pub async fn admin_transactions(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<TransactionWithOwner>>> {
    let rows = state
        .transactions()
        .recent_with_owner(RECENT_TRANSACTIONS_LIMIT)
        .await?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct SearchResults {
    pub transactions: Vec<TransactionWithOwner>,
    pub profiles: Vec<Profile>,
}

/// Match ledger references and profile emails containing the query.
pub async fn global_search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResults>> {
    let needle = query.query.as_deref().map(str::trim).unwrap_or_default();
    if needle.chars().count() < MIN_SEARCH_LEN {
        return Ok(Json(SearchResults::default()));
    }

    let transactions = state.transactions();
    let profiles = state.profiles();
    let (transactions, profiles) = tokio::try_join!(
        transactions.search_reference(needle, SEARCH_RESULT_LIMIT),
        profiles.search_by_email(needle, SEARCH_RESULT_LIMIT),
    )?;

    Ok(Json(SearchResults {
        transactions,
        profiles,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(Some(&json!(10))), Some(10));
        assert_eq!(parse_amount(Some(&json!(-3))), Some(-3));
        assert_eq!(parse_amount(Some(&json!("25"))), Some(25));
        assert_eq!(parse_amount(Some(&json!(2.5))), None);
        assert_eq!(parse_amount(Some(&json!("ten"))), None);
        assert_eq!(parse_amount(Some(&json!(null))), None);
        assert_eq!(parse_amount(None), None);
    }
}
