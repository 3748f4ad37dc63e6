//! Axum HTTP API server for the JobToken job board.
//!
//! This crate provides:
//! - Wallet top-ups and admin token grants with optimistic balance updates
//! - Application status changes with applicant email notifications
//! - Admin dashboard statistics, reports and the financial log export
//! - Rate limiting, security headers and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{Notifier, WalletService};
pub use state::AppState;
