//! Transaction ledger repository.
//!
//! The ledger is append-only: this repository inserts and reads, never
//! updates or deletes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use jobtoken_models::{NewTransaction, Transaction, TransactionType};

use crate::client::StoreClient;
use crate::error::{StoreError, StoreResult};
use crate::query::Query;

const TABLE: &str = "transactions";
const COLUMNS: &str = "id,wallet_id,tokens_added,type,reference_id,created_at";
const WITH_OWNER: &str =
    "id,wallet_id,tokens_added,type,reference_id,created_at,wallet:wallet_id(profiles:user_id(email))";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerEmail {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerWallet {
    #[serde(default)]
    pub profiles: Option<OwnerEmail>,
}

/// A ledger row with the email of the wallet's owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionWithOwner {
    #[serde(flatten)]
    pub transaction: Transaction,
    #[serde(default)]
    pub wallet: Option<OwnerWallet>,
}

impl TransactionWithOwner {
    pub fn owner_email(&self) -> Option<&str> {
        self.wallet
            .as_ref()
            .and_then(|w| w.profiles.as_ref())
            .and_then(|p| p.email.as_deref())
    }
}

#[derive(Deserialize)]
struct CreatedAtRow {
    created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct TokensRow {
    tokens_added: i64,
}

/// Repository for `transactions` rows.
pub struct TransactionRepository {
    client: StoreClient,
}

impl TransactionRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Append a ledger row.
    pub async fn insert(&self, transaction: &NewTransaction) -> StoreResult<Transaction> {
        let rows: Vec<Transaction> = self.client.insert(TABLE, transaction).await?;
        let created = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::InvalidResponse("insert returned no transaction".into()))?;

        info!(
            wallet_id = %created.wallet_id,
            reference_id = created.reference_id.as_deref().unwrap_or(""),
            tokens = created.tokens_added,
            kind = %created.kind,
            "Recorded transaction"
        );
        Ok(created)
    }

    pub async fn count_by_type(&self, kind: TransactionType) -> StoreResult<u64> {
        let query = Query::new().select("id").eq("type", kind);
        self.client.count(TABLE, &query).await
    }

    /// Timestamps of `kind` rows created at or after `since`.
    pub async fn created_since(
        &self,
        kind: TransactionType,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<DateTime<Utc>>> {
        let query = Query::new()
            .select("created_at")
            .eq("type", kind)
            .since("created_at", since);
        let rows: Vec<CreatedAtRow> = self.client.select(TABLE, &query).await?;
        Ok(rows.into_iter().map(|r| r.created_at).collect())
    }

    /// Rows created at or after `since`, newest first, with owner email.
    pub async fn since_with_owner(
        &self,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<TransactionWithOwner>> {
        let query = Query::new()
            .select(WITH_OWNER)
            .since("created_at", since)
            .order_desc("created_at");
        self.client.select(TABLE, &query).await
    }

    /// Rows whose reference id contains `needle`, case-insensitively.
    pub async fn search_reference(
        &self,
        needle: &str,
        limit: u32,
    ) -> StoreResult<Vec<TransactionWithOwner>> {
        let query = Query::new()
            .select(WITH_OWNER)
            .ilike_contains("reference_id", needle)
            .limit(limit);
        self.client.select(TABLE, &query).await
    }

    pub async fn recent_with_owner(&self, limit: u32) -> StoreResult<Vec<TransactionWithOwner>> {
        let query = Query::new()
            .select(WITH_OWNER)
            .order_desc("created_at")
            .limit(limit);
        self.client.select(TABLE, &query).await
    }

    pub async fn recent_for_wallet(
        &self,
        wallet_id: &str,
        limit: u32,
    ) -> StoreResult<Vec<Transaction>> {
        let query = Query::new()
            .select(COLUMNS)
            .eq("wallet_id", wallet_id)
            .order_desc("created_at")
            .limit(limit);
        self.client.select(TABLE, &query).await
    }

    /// Signed token amounts of a wallet's deductions.
    pub async fn deductions_for_wallet(&self, wallet_id: &str) -> StoreResult<Vec<i64>> {
        let query = Query::new()
            .select("tokens_added")
            .eq("wallet_id", wallet_id)
            .eq("type", TransactionType::Deduction);
        let rows: Vec<TokensRow> = self.client.select(TABLE, &query).await?;
        Ok(rows.into_iter().map(|r| r.tokens_added).collect())
    }
}
