//! Wallet crediting: top-ups and admin grants.
//!
//! Balance writes are compare-and-set on the balance that was read. A lost
//! race re-reads the wallet and reapplies the change.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use tracing::{debug, error, info, warn};

use jobtoken_models::{ModelResult, NewTransaction, TransactionType, Wallet, WalletCredit};
use jobtoken_store::{ProfileRepository, StoreClient, TransactionRepository, WalletRepository};

use crate::error::{ApiError, ApiResult};

// =============================================================================
// Constants
// =============================================================================

/// Maximum attempts for a compare-and-set balance write.
const MAX_BALANCE_UPDATE_RETRIES: u32 = 5;

/// Base delay for linear backoff between attempts (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 50;

/// Tokens credited to wallets, labelled by transaction type.
const TOKENS_CREDITED_TOTAL: &str = "wallet_tokens_credited_total";

// =============================================================================
// Wallet Service
// =============================================================================

#[derive(Clone)]
pub struct WalletService {
    store: Arc<StoreClient>,
    topup_delay: Duration,
}

impl WalletService {
    pub fn new(store: Arc<StoreClient>, topup_delay: Duration) -> Self {
        Self { store, topup_delay }
    }

    fn wallets(&self) -> WalletRepository {
        WalletRepository::new(StoreClient::clone(&self.store))
    }

    fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(StoreClient::clone(&self.store))
    }

    /// Credit one top-up bundle to the user's wallet and restart its validity.
    ///
    /// The ledger row is written first, then the simulated payment delay,
    /// then the balance. A failure after the ledger write leaves the row in
    /// place and logs its reference id.
    pub async fn topup(&self, user_id: &str) -> ApiResult<Wallet> {
        let wallet = self
            .wallets()
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| ApiError::internal("Wallet not found"))?;

        let entry = NewTransaction::topup(&wallet.id);
        self.transactions().insert(&entry).await.map_err(|e| {
            error!(wallet_id = %wallet.id, error = %e, "Transaction insert error");
            ApiError::internal(format!("Failed to record transaction: {}", e))
        })?;

        // Stands in for the payment provider's confirmation callback.
        if !self.topup_delay.is_zero() {
            tokio::time::sleep(self.topup_delay).await;
        }

        let updated = self
            .apply_credit(wallet, |w| Ok(w.topped_up(Utc::now())))
            .await
            .map_err(|e| {
                error!(
                    user_id = %user_id,
                    reference_id = %entry.reference_id,
                    error = %e,
                    "Top-up recorded but balance update failed"
                );
                e
            })?;

        record_credit(TransactionType::Topup, entry.tokens_added);
        info!(
            user_id = %user_id,
            reference_id = %entry.reference_id,
            balance = updated.token_balance,
            "Wallet topped up"
        );

        Ok(updated)
    }

    /// Add `amount` tokens (negative to debit) to the wallet of the user
    /// with `email`, then log one admin grant.
    pub async fn grant(&self, email: &str, amount: i64) -> ApiResult<Wallet> {
        let profile = ProfileRepository::new(StoreClient::clone(&self.store))
            .find_by_email(email)
            .await?
            .ok_or_else(|| ApiError::internal("User not found"))?;

        let wallet = self
            .wallets()
            .find_by_user(&profile.id)
            .await?
            .ok_or_else(|| ApiError::internal("Wallet not found"))?;

        let updated = self.apply_credit(wallet, |w| w.granted(amount)).await?;

        let entry = NewTransaction::admin_grant(&updated.id, amount);
        self.transactions().insert(&entry).await.map_err(|e| {
            error!(
                wallet_id = %updated.id,
                reference_id = %entry.reference_id,
                amount,
                error = %e,
                "Admin grant transaction error"
            );
            ApiError::internal(format!("Failed to log admin transaction: {}", e))
        })?;

        record_credit(TransactionType::AdminGrant, amount);
        info!(
            email = %email,
            amount,
            reference_id = %entry.reference_id,
            balance = updated.token_balance,
            "Admin grant applied"
        );

        Ok(updated)
    }

    /// Write `change(wallet)` guarded by the balance it was computed from.
    async fn apply_credit<F>(&self, mut wallet: Wallet, change: F) -> ApiResult<Wallet>
    where
        F: Fn(&Wallet) -> ModelResult<WalletCredit>,
    {
        let wallets = self.wallets();

        for attempt in 0..MAX_BALANCE_UPDATE_RETRIES {
            let credit = change(&wallet)?;

            match wallets
                .compare_and_set(&wallet.id, wallet.token_balance, &credit)
                .await
            {
                Ok(updated) => return Ok(updated),
                Err(e) if e.is_precondition_failed() => {
                    debug!(
                        wallet_id = %wallet.id,
                        attempt = attempt + 1,
                        "Balance changed underneath us, retrying"
                    );
                    let delay = Duration::from_millis(RETRY_BASE_DELAY_MS * (attempt as u64 + 1));
                    tokio::time::sleep(delay).await;

                    wallet = wallets
                        .get(&wallet.id)
                        .await?
                        .ok_or_else(|| ApiError::internal("Wallet not found"))?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(
            wallet_id = %wallet.id,
            retries = MAX_BALANCE_UPDATE_RETRIES,
            "Balance update failed after retries"
        );
        Err(ApiError::internal(
            "Failed to update wallet due to concurrent updates. Please try again.",
        ))
    }
}

fn record_credit(kind: TransactionType, tokens: i64) {
    if tokens > 0 {
        counter!(TOKENS_CREDITED_TOTAL, "kind" => kind.as_str()).increment(tokens as u64);
    }
}
