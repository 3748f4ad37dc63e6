//! Transactional email for JobToken.
//!
//! This crate provides:
//! - HTML templates for verification, application confirmation and
//!   application outcome notices
//! - A client for the Resend HTTP API

pub mod client;
pub mod error;
pub mod templates;

pub use client::{MailClient, MailConfig};
pub use error::{MailError, MailResult};
pub use templates::{
    ApplicationConfirmation, EmailTemplate, RejectedNotice, Sender, ShortlistedNotice,
    VerificationEmail,
};
