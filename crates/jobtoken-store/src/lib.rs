//! Client for the hosted data store.
//!
//! This crate provides:
//! - A PostgREST client with service-role authentication
//! - A small query builder for filters, ordering and embedded selects
//! - Typed repositories for profiles, wallets, jobs, applications and the ledger
//! - The `apply_to_job` remote procedure
//! - Magic-link generation through the auth admin API

pub mod applications;
pub mod auth_admin;
pub mod client;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod profiles;
pub mod query;
pub mod rpc;
pub mod transactions;
pub mod wallets;


pub use applications::{
    ApplicantRef, ApplicationRepository, ApplicationWithParties, HireInterval, JobApplicant,
    JobTitleRef, SeekerApplication,
};
pub use client::{StoreClient, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use jobs::{
    EmbeddedCount, JobCategoryCount, JobReportSource, JobRepository, JobWithApplicationCount,
    JobWithPoster, PosterRef,
};
pub use profiles::ProfileRepository;
pub use query::Query;
pub use rpc::ApplyOutcome;
pub use transactions::{TransactionRepository, TransactionWithOwner};
pub use wallets::WalletRepository;
