//! `shopd-cart` — shopping carts, stock reservation, and cart expiry.
//!
//! All cart mutation goes through the [`CartEngine`]; it serializes
//! operations per customer and keeps every cart line backed by a matching
//! stock reservation in the ledger. The [`CartExpiryScheduler`] returns
//! reserved stock to the pool when a session goes idle.

pub mod cart;
pub mod engine;
pub mod expiry;

pub use cart::{Cart, CartLine, Purchase};
pub use engine::CartEngine;
pub use expiry::{CartExpiryScheduler, CART_IDLE_TIMEOUT};
