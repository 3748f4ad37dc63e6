//! Token pricing constants.
//!
//! A top-up bundle is 5 tokens for Ksh 100, so one token is worth Ksh 20.

/// Tokens credited by a single top-up.
pub const TOPUP_TOKENS: i64 = 5;

/// Price of one top-up bundle in Ksh.
pub const KSH_PER_TOPUP: i64 = 100;

/// Value of one token in Ksh.
pub const KSH_PER_TOKEN: i64 = KSH_PER_TOPUP / TOPUP_TOKENS;

/// Days a wallet stays active after a top-up.
pub const WALLET_VALIDITY_DAYS: i64 = 30;

/// Default token cost of a new job posting.
pub const DEFAULT_JOB_TOKEN_COST: i64 = 1;
