//! `shopd-catalog` — article metadata and the stock ledger.
//!
//! The [`Catalog`] owns immutable article descriptions (name, price, package
//! size); the [`StockLedger`] is the single source of truth for per-article
//! available quantity. Stock is never mutated anywhere else.

pub mod article;
pub mod ledger;
pub mod register;

pub use article::Article;
pub use ledger::StockLedger;
pub use register::Catalog;
