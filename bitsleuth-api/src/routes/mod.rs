/// API route handlers
///
/// Each submodule owns one slice of the HTTP surface:
/// - `health` - liveness and API banner
/// - `auth` - registration, login, email verification, profile
/// - `invoices` - invoice creation and lookup
/// - `payments` - manual payment submission and the gateway webhook
/// - `scan` - on-chain address balance checks
/// - `admin` - dashboard stats and listings
pub mod admin;
pub mod auth;
pub mod health;
pub mod invoices;
pub mod payments;
pub mod scan;
