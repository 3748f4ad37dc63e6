//! Business logic services.

pub mod analytics;
pub mod export;
pub mod notifications;
pub mod wallet;

pub use notifications::Notifier;
pub use wallet::WalletService;
