//! `shopd-persist` — flat-file snapshots of the catalog and the party
//! registers.
//!
//! Persistence here is deliberately simple: whole-register JSON snapshots,
//! written to a temp file and renamed into place. Callers snapshot the
//! in-memory state first and write afterwards, so no lock is held across
//! I/O. There are no transactional guarantees across a crash.

pub mod snapshot;
pub mod store;

pub use snapshot::ArticleSnapshot;
pub use store::SnapshotStore;
