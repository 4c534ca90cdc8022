//! `shopd-events` — stock-movement log and history reconstruction.
//!
//! Movements are held in memory until flushed to an append-only text file,
//! one line per movement, chronological. The [`HistoryReconstructor`] replays
//! that file backward from the current live stock to recover the closing
//! stock level of each of the last 30 days.

pub mod history;
pub mod log;
pub mod movement;

pub use history::{DayStock, HistoryReconstructor, HISTORY_DAYS};
pub use log::EventLog;
pub use movement::StockMovement;
