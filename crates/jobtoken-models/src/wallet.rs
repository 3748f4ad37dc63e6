//! Token wallets.
//!
//! Every user owns exactly one wallet. The balance is only ever changed by a
//! top-up, an admin grant, or the store-side apply procedure; each change is
//! mirrored by a row in the transaction ledger.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::pricing::{TOPUP_TOKENS, WALLET_VALIDITY_DAYS};

/// Wallet row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: String,
    pub user_id: String,
    pub token_balance: i64,
    /// Null until the first top-up.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// New balance (and optionally new expiry) to write back to a wallet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletCredit {
    pub token_balance: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Wallet {
    /// Whether the tokens in this wallet have lapsed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at < now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Credit for a completed top-up: fixed bundle, expiry reset from `now`.
    pub fn topped_up(&self, now: DateTime<Utc>) -> WalletCredit {
        WalletCredit {
            token_balance: self.token_balance + TOPUP_TOKENS,
            expires_at: Some(now + Duration::days(WALLET_VALIDITY_DAYS)),
        }
    }

    /// Credit for a manual admin adjustment. Expiry is left untouched.
    pub fn granted(&self, amount: i64) -> ModelResult<WalletCredit> {
        if amount == 0 {
            return Err(ModelError::Invalid("Amount must be non-zero".to_string()));
        }
        let token_balance = self
            .token_balance
            .checked_add(amount)
            .ok_or_else(|| ModelError::Invalid("Amount out of range".to_string()))?;
        if token_balance < 0 {
            return Err(ModelError::NegativeBalance {
                balance: self.token_balance,
                amount,
            });
        }
        Ok(WalletCredit {
            token_balance,
            expires_at: None,
        })
    }
}
