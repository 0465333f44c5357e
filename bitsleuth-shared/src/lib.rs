//! # BitSleuth Shared Library
//!
//! Shared types, utilities, and business logic used by the BitSleuth API
//! server and the payment confirmation worker.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, invoices, payments, audit log)
//! - `auth`: Password hashing and JWT session tokens
//! - `db`: Connection pool and migration runner
//! - `chain`: Blockchain gateway client (TronGrid)
//! - `notify`: Best-effort outbound notifications (Telegram, email stub)

pub mod auth;
pub mod chain;
pub mod db;
pub mod models;
pub mod notify;

/// Current version of the BitSleuth shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
