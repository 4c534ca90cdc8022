//! `shopd-core` — shared domain primitives.
//!
//! This crate contains **pure domain** types (ids, actor identity, the error
//! model); no infrastructure concerns.

pub mod actor;
pub mod error;
pub mod id;

pub use actor::Actor;
pub use error::{ShopError, ShopResult};
pub use id::{ArticleId, CustomerId, EmployeeId};
