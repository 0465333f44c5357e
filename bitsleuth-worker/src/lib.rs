//! # BitSleuth Worker Library
//!
//! The payment confirmation engine: a single long-lived poller that brings
//! every pending payment to a terminal state without double-granting
//! access.
//!
//! ## Modules
//!
//! - `config`: Worker configuration from environment
//! - `poller`: The poll loop (fetch height, scan pending payments, update
//!   confirmations, trigger settlement)
//! - `settlement`: Confirmation math and the transactional access grant

pub mod config;
pub mod poller;
pub mod settlement;
