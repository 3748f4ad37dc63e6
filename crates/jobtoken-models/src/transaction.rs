//! Append-only token ledger.
//!
//! Rows are inserted by top-ups, admin grants and the apply procedure and are
//! never updated afterwards.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ModelError;
use crate::pricing::TOPUP_TOKENS;

/// Kind of balance-affecting event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Paid top-up bundle
    Topup,
    /// Manual admin adjustment
    AdminGrant,
    /// Tokens spent on an application
    Deduction,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Topup => "topup",
            Self::AdminGrant => "admin_grant",
            Self::Deduction => "deduction",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "topup" => Ok(Self::Topup),
            "admin_grant" => Ok(Self::AdminGrant),
            "deduction" => Ok(Self::Deduction),
            _ => Err(ModelError::UnknownTransactionType(s.to_string())),
        }
    }
}

/// Ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub wallet_id: String,
    pub tokens_added: i64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub reference_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a ledger row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTransaction {
    pub wallet_id: String,
    pub tokens_added: i64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub reference_id: String,
}

impl NewTransaction {
    /// Ledger row for a completed top-up bundle.
    pub fn topup(wallet_id: impl Into<String>) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            tokens_added: TOPUP_TOKENS,
            kind: TransactionType::Topup,
            reference_id: reference_id("MPESA", 8),
        }
    }

    /// Ledger row for a manual admin adjustment.
    pub fn admin_grant(wallet_id: impl Into<String>, amount: i64) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            tokens_added: amount,
            kind: TransactionType::AdminGrant,
            reference_id: reference_id("ADMIN", 6),
        }
    }
}

/// Random uppercase reference such as `MPESA-3F9A0C1B`.
fn reference_id(prefix: &str, len: usize) -> String {
    let random = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{}-{}", prefix, &random[..len])
}
