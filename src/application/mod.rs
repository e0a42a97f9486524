//! Use cases orchestrating the domain over the storage ports.
//!
//! Services hold no state of their own beyond `Arc` handles to the ports;
//! every consistency guarantee comes from the conditional writes the ports
//! expose.

pub mod bulk;
pub mod commission;
pub mod context;
pub mod coupons;
pub mod orders;
pub mod payouts;
pub mod stock;
pub mod stores;

pub use context::AppContext;
