//! 30-day stock-history reconstruction.
//!
//! The movement log only stores deltas. To answer "what was the stock level
//! at the close of each of the last 30 days" the reconstructor walks the
//! per-day net deltas **backward** from today's live count: a day's closing
//! level is the running balance before that day's delta is peeled off, and
//! peeling it off yields the prior day's closing level.

use std::sync::Arc;

use chrono::{Days, NaiveDate, NaiveDateTime};

use shopd_core::{ArticleId, ShopResult};

use crate::log::EventLog;
use crate::movement::StockMovement;

/// Length of the reconstructed series: the 30 days ending yesterday.
pub const HISTORY_DAYS: usize = 30;

/// One day of reconstructed history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayStock {
    pub date: NaiveDate,
    /// Stock level at the close of `date`.
    pub stock_at_close: i64,
}

#[derive(Debug, Clone)]
pub struct HistoryReconstructor {
    log: Arc<EventLog>,
}

impl HistoryReconstructor {
    pub fn new(log: Arc<EventLog>) -> Self {
        Self { log }
    }

    /// Reconstruct the closing stock of `article` for each of the 30 days
    /// ending yesterday, oldest first.
    ///
    /// `live_stock` is the article's current level; `now` is the clock this
    /// call reasons against (today itself is excluded from the series, but
    /// today's logged and still-queued movements are folded into the running
    /// balance so yesterday's close comes out right).
    ///
    /// One malformed log line fails the whole call with a parse error; no
    /// partial series is returned.
    pub fn history(
        &self,
        article: ArticleId,
        live_stock: i64,
        now: NaiveDateTime,
    ) -> ShopResult<Vec<DayStock>> {
        let today = now.date();
        let yesterday = today - Days::new(1);

        // Per-day net deltas within the window, oldest first, calendar gaps
        // filled with zero days.
        let mut days: Vec<(NaiveDate, i64)> = Vec::new();
        let mut today_delta = 0i64;

        for line in self.log.read_lines()? {
            let movement = StockMovement::parse_line(&line)?;
            if movement.article != article || !movement.within_window(now) {
                continue;
            }
            let date = movement.at.date();
            if date >= today {
                today_delta += movement.delta;
                continue;
            }
            match days.last_mut() {
                Some((last, sum)) if *last == date => *sum += movement.delta,
                Some(&mut (last, _)) => {
                    let mut gap = last + Days::new(1);
                    while gap < date {
                        days.push((gap, 0));
                        gap = gap + Days::new(1);
                    }
                    days.push((date, movement.delta));
                }
                None => days.push((date, movement.delta)),
            }
        }

        // Pad from the last logged day through yesterday.
        match days.last() {
            Some(&(last, _)) => {
                let mut gap = last + Days::new(1);
                while gap <= yesterday {
                    days.push((gap, 0));
                    gap = gap + Days::new(1);
                }
            }
            None => days.push((yesterday, 0)),
        }

        // Back-fill pre-history so the series is exactly 30 days long, even
        // for articles younger than the window or freshly pruned logs.
        while days.len() < HISTORY_DAYS {
            let first = days[0].0;
            days.insert(0, (first - Days::new(1), 0));
        }
        if days.len() > HISTORY_DAYS {
            let cut = days.len() - HISTORY_DAYS;
            days.drain(..cut);
        }

        // Today's activity is not part of the series but separates the live
        // count from yesterday's close.
        let queued_today = self.log.pending_delta_on(article, today);
        let mut running = live_stock - today_delta - queued_today;

        let mut series = vec![
            DayStock {
                date: yesterday,
                stock_at_close: 0,
            };
            HISTORY_DAYS
        ];
        for (slot, &(date, delta)) in series.iter_mut().zip(days.iter()).rev() {
            *slot = DayStock {
                date,
                stock_at_close: running,
            };
            running -= delta;
        }

        Ok(series)
    }
}
