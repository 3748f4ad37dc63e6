//! Wallet repository.
//!
//! Balance writes are compare-and-set: the update only matches when the
//! stored balance still equals the value the caller read.

use serde::Deserialize;
use tracing::debug;

use jobtoken_models::{Wallet, WalletCredit};

use crate::client::StoreClient;
use crate::error::{StoreError, StoreResult};
use crate::query::Query;

const TABLE: &str = "wallets";
const COLUMNS: &str = "id,user_id,token_balance,expires_at";

#[derive(Deserialize)]
struct BalanceRow {
    token_balance: i64,
}

/// Repository for `wallets` rows.
pub struct WalletRepository {
    client: StoreClient,
}

impl WalletRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// The wallet owned by `user_id`, if any.
    pub async fn find_by_user(&self, user_id: &str) -> StoreResult<Option<Wallet>> {
        let query = Query::new().select(COLUMNS).eq("user_id", user_id);
        self.client.select_one(TABLE, &query).await
    }

    pub async fn get(&self, wallet_id: &str) -> StoreResult<Option<Wallet>> {
        let query = Query::new().select(COLUMNS).eq("id", wallet_id);
        self.client.select_one(TABLE, &query).await
    }

    /// Write `credit` only if the balance is still `expected_balance`.
    ///
    /// Returns `PreconditionFailed` when another writer got there first.
    pub async fn compare_and_set(
        &self,
        wallet_id: &str,
        expected_balance: i64,
        credit: &WalletCredit,
    ) -> StoreResult<Wallet> {
        let query = Query::new()
            .select(COLUMNS)
            .eq("id", wallet_id)
            .eq("token_balance", expected_balance);

        let rows: Vec<Wallet> = self.client.update(TABLE, &query, credit).await?;

        match rows.into_iter().next() {
            Some(wallet) => {
                debug!(
                    wallet_id = %wallet_id,
                    from = expected_balance,
                    to = wallet.token_balance,
                    "Wallet balance updated"
                );
                Ok(wallet)
            }
            None => Err(StoreError::PreconditionFailed(format!(
                "wallet {} balance changed from {}",
                wallet_id, expected_balance
            ))),
        }
    }

    /// Every wallet balance.
    pub async fn balances(&self) -> StoreResult<Vec<i64>> {
        let rows: Vec<BalanceRow> = self
            .client
            .select(TABLE, &Query::new().select("token_balance"))
            .await?;
        Ok(rows.into_iter().map(|r| r.token_balance).collect())
    }

    /// Outstanding tokens across all wallets.
    pub async fn total_liability(&self) -> StoreResult<i64> {
        Ok(self.balances().await?.into_iter().sum())
    }
}
