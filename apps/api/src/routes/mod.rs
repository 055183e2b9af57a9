//! HTTP route handlers.

pub mod contacts;
pub mod health;
pub mod products;
pub mod transactions;
