//! Wallet handlers.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jobtoken_models::{Transaction, Wallet};

use crate::error::{ApiError, ApiResult};
use crate::handlers::required;
use crate::state::AppState;

/// Ledger rows shown in the wallet history.
const RECENT_TRANSACTIONS_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopupRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopupResponse {
    pub success: bool,
    pub new_balance: i64,
}

/// Credit a top-up bundle after the simulated payment.
pub async fn topup(
    State(state): State<AppState>,
    Json(request): Json<TopupRequest>,
) -> ApiResult<Json<TopupResponse>> {
    let user_id = required(&request.user_id, "userId is required")?;

    let wallet = state.wallet_service.topup(user_id).await?;

    Ok(Json(TopupResponse {
        success: true,
        new_balance: wallet.token_balance,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WalletResponse {
    pub token_balance: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub expired: bool,
}

async fn user_wallet(state: &AppState, query: &UserQuery) -> ApiResult<Wallet> {
    let user_id = required(&query.user_id, "userId is required")?;
    state
        .wallets()
        .find_by_user(user_id)
        .await?
        .ok_or_else(|| ApiError::internal("Wallet not found"))
}

pub async fn get_wallet(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<WalletResponse>> {
    let wallet = user_wallet(&state, &query).await?;

    Ok(Json(WalletResponse {
        token_balance: wallet.token_balance,
        expires_at: wallet.expires_at,
        expired: wallet.is_expired(),
    }))
}

/// Most recent ledger rows for the user's wallet.
pub async fn wallet_transactions(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let wallet = user_wallet(&state, &query).await?;

    let transactions = state
        .transactions()
        .recent_for_wallet(&wallet.id, RECENT_TRANSACTIONS_LIMIT)
        .await?;

    Ok(Json(transactions))
}
