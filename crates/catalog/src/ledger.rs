//! Per-article available-quantity counters.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use shopd_core::{ArticleId, ShopError, ShopResult};

use crate::article::Article;

/// Single source of truth for available stock.
///
/// Each article gets its own counter behind its own mutex, so reservations
/// for unrelated articles never contend. The outer map is only locked to
/// look up or add/remove counters, never across a read-modify-write.
#[derive(Debug, Default)]
pub struct StockLedger {
    levels: RwLock<HashMap<ArticleId, Arc<Mutex<i64>>>>,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking stock for a new article. The initial level must be
    /// non-negative and, for bulk articles, a whole number of packages.
    pub fn track(&self, article: &Article, initial: i64) -> ShopResult<()> {
        article.check_package_multiple(initial)?;
        let mut levels = self.levels.write().unwrap();
        if levels.contains_key(&article.id()) {
            return Err(ShopError::ArticleExists(article.id()));
        }
        levels.insert(article.id(), Arc::new(Mutex::new(initial.max(0))));
        Ok(())
    }

    /// Stop tracking an article (catalog removal). Returns the last level.
    pub fn forget(&self, article: ArticleId) -> Option<i64> {
        let slot = self.levels.write().unwrap().remove(&article)?;
        Some(*slot.lock().unwrap())
    }

    /// Current available quantity.
    pub fn level(&self, article: ArticleId) -> ShopResult<i64> {
        let slot = self.slot(article)?;
        let level = *slot.lock().unwrap();
        Ok(level)
    }

    /// Take `quantity` units out of the pool for a cart line.
    ///
    /// Fails without changing anything if `quantity` is not positive, if
    /// fewer than `quantity` units are available, or if a bulk article's
    /// package rule is violated. A negative quantity must never reach the
    /// subtraction below: it would mint stock.
    pub fn reserve(&self, article: &Article, quantity: i64) -> ShopResult<()> {
        if quantity <= 0 {
            return Err(ShopError::InvalidQuantity(quantity));
        }
        article.check_package_multiple(quantity)?;
        let slot = self.slot(article.id())?;
        let mut level = slot.lock().unwrap();
        if *level < quantity {
            return Err(ShopError::InsufficientStock {
                article: article.id(),
                requested: quantity,
                available: *level,
            });
        }
        *level -= quantity;
        Ok(())
    }

    /// Return `quantity` previously reserved units to the pool.
    ///
    /// There is deliberately no upper bound: the ledger does not remember a
    /// baseline to check against, matching the cart semantics where every
    /// release mirrors an earlier successful reserve.
    pub fn release(&self, article: &Article, quantity: i64) -> ShopResult<()> {
        if quantity <= 0 {
            return Err(ShopError::InvalidQuantity(quantity));
        }
        article.check_package_multiple(quantity)?;
        let slot = self.slot(article.id())?;
        *slot.lock().unwrap() += quantity;
        Ok(())
    }

    /// Apply a signed delta directly (manual restock or write-off).
    /// Returns the new level.
    pub fn adjust(&self, article: &Article, delta: i64) -> ShopResult<i64> {
        article.check_package_multiple(delta)?;
        let slot = self.slot(article.id())?;
        let mut level = slot.lock().unwrap();
        let next = *level + delta;
        if next < 0 {
            return Err(ShopError::InsufficientStock {
                article: article.id(),
                requested: -delta,
                available: *level,
            });
        }
        *level = next;
        Ok(next)
    }

    fn slot(&self, article: ArticleId) -> ShopResult<Arc<Mutex<i64>>> {
        self.levels
            .read()
            .unwrap()
            .get(&article)
            .cloned()
            .ok_or(ShopError::ArticleNotFound(article))
    }
}
