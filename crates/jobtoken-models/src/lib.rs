//! Shared data models for the JobToken backend.
//!
//! This crate provides Serde-serializable types for:
//! - Profiles and roles
//! - Token wallets, top-up and grant rules
//! - Job postings and applications
//! - The append-only transaction ledger

pub mod application;
pub mod error;
pub mod job;
pub mod pricing;
pub mod profile;
pub mod transaction;
pub mod wallet;

// Re-export common types
pub use application::{Application, ApplicationStatus};
pub use error::{ModelError, ModelResult};
pub use job::{Job, NewJob};
pub use profile::{Profile, Role};
pub use transaction::{NewTransaction, Transaction, TransactionType};
pub use wallet::{Wallet, WalletCredit};
