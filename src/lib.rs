//! Marketplace settlement: coupon evaluation and application, per-item
//! commission, monthly store payouts with an approval workflow, store
//! moderation and an audited stock ledger.
//!
//! The crate is laid out in layers: `domain` holds the types and the
//! storage ports, `application` the services, `infrastructure` the port
//! implementations and `interfaces` the HTTP API and CSV batch runner.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
pub mod logging;
