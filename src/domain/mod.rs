//! Domain layer: marketplace entities, value objects and the storage ports
//! the application services are written against.

pub mod cart;
pub mod commission;
pub mod coupon;
pub mod identity;
pub mod money;
pub mod order;
pub mod payout;
pub mod ports;
pub mod stock;
pub mod store;
