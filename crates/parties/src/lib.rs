//! `shopd-parties` — customer and employee registers.

pub mod directory;
pub mod person;

pub use directory::{Login, PartyDirectory};
pub use person::{Customer, Employee};
