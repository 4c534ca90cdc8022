//! The cart engine: every cart mutation for every customer funnels through
//! here, and nowhere else touches reserved stock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::Local;
use tracing::debug;

use shopd_catalog::{Article, Catalog, StockLedger};
use shopd_core::{ArticleId, CustomerId, ShopError, ShopResult};
use shopd_events::{EventLog, StockMovement};

use crate::cart::{Cart, CartLine, Purchase};

/// Mediator for all cart mutations.
///
/// Each customer's cart sits behind its own mutex, held for the whole
/// operation including the ledger read-modify-write, so operations on one
/// customer are linearizable while different customers proceed in parallel.
/// Cross-customer races on the same article are settled by the ledger's
/// per-article counter lock.
#[derive(Debug)]
pub struct CartEngine {
    catalog: Arc<Catalog>,
    ledger: Arc<StockLedger>,
    log: Arc<EventLog>,
    carts: RwLock<HashMap<CustomerId, Arc<Mutex<Cart>>>>,
}

impl CartEngine {
    pub fn new(catalog: Arc<Catalog>, ledger: Arc<StockLedger>, log: Arc<EventLog>) -> Self {
        Self {
            catalog,
            ledger,
            log,
            carts: RwLock::new(HashMap::new()),
        }
    }

    /// Put `quantity` more units of an article into the cart, reserving them
    /// from the ledger. If a line already exists this raises its quantity;
    /// on any failure the cart and the ledger are left unchanged.
    pub fn add_or_increase(
        &self,
        customer: CustomerId,
        article: ArticleId,
        quantity: i64,
    ) -> ShopResult<()> {
        if quantity <= 0 {
            return Err(ShopError::InvalidQuantity(quantity));
        }
        let article = self.catalog.get(article)?;
        let slot = self.cart_slot(customer);
        let mut cart = slot.lock().unwrap();

        match cart.quantity_of(article.id()) {
            Some(current) => self.apply_quantity(&mut cart, &article, current + quantity),
            None => {
                self.ledger.reserve(&article, quantity)?;
                cart.push(CartLine { article, quantity });
                Ok(())
            }
        }
    }

    /// Set an existing line to an absolute quantity, reserving or releasing
    /// the difference. Setting 0 removes the line. Fails with
    /// [`ShopError::ArticleNotInCart`] if there is no line for the article.
    pub fn set_quantity(
        &self,
        customer: CustomerId,
        article: ArticleId,
        quantity: i64,
    ) -> ShopResult<()> {
        if quantity < 0 {
            return Err(ShopError::InvalidQuantity(quantity));
        }
        let article = self.catalog.get(article)?;
        let slot = self.cart_slot(customer);
        let mut cart = slot.lock().unwrap();
        self.apply_quantity(&mut cart, &article, quantity)
    }

    /// Remove a line entirely, releasing its whole reservation.
    pub fn remove(&self, customer: CustomerId, article: ArticleId) -> ShopResult<()> {
        let slot = self.cart_slot(customer);
        let mut cart = slot.lock().unwrap();
        let line = cart
            .drop_line(article)
            .ok_or(ShopError::ArticleNotInCart(article))?;
        self.ledger.release(&line.article, line.quantity)?;
        Ok(())
    }

    /// Turn the cart into a purchase: the reserved stock is consumed for
    /// good, one sale movement per line is recorded, and the emptied-out
    /// snapshot is returned for invoicing.
    pub fn checkout(&self, customer: CustomerId) -> ShopResult<Purchase> {
        let slot = self.cart_slot(customer);
        let mut cart = slot.lock().unwrap();
        if cart.is_empty() {
            return Err(ShopError::EmptyCart);
        }
        let at = Local::now().naive_local();
        let lines = cart.take_lines();
        for line in &lines {
            // A line can outlive its article (removal purges the log for
            // that id); logging the sale would re-seed the purged history.
            if self.catalog.get(line.article.id()).is_err() {
                continue;
            }
            self.log.record(StockMovement::sale(
                at,
                customer,
                line.article.id(),
                line.quantity,
            ));
        }
        debug!(%customer, lines = lines.len(), "checkout completed");
        Ok(Purchase {
            customer,
            at,
            lines,
        })
    }

    /// Release every reservation and clear the cart. Emptying an empty cart
    /// is a no-op; this is what the expiry timer calls.
    ///
    /// The cart is cleared even if a release fails (e.g. the article was
    /// removed from the ledger in the meantime); the first failure is
    /// reported after all lines have been handled.
    pub fn empty(&self, customer: CustomerId) -> ShopResult<()> {
        let slot = self.cart_slot(customer);
        let mut cart = slot.lock().unwrap();
        let mut first_failure = None;
        for line in cart.take_lines() {
            if let Err(err) = self.ledger.release(&line.article, line.quantity) {
                first_failure.get_or_insert(err);
            }
        }
        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Current cart contents, for display.
    pub fn lines(&self, customer: CustomerId) -> Vec<CartLine> {
        self.cart_slot(customer).lock().unwrap().lines().to_vec()
    }

    pub fn is_empty(&self, customer: CustomerId) -> bool {
        self.cart_slot(customer).lock().unwrap().is_empty()
    }

    /// Per-customer cart slot, created on first use. The registry lock is
    /// never held while a cart is locked.
    fn cart_slot(&self, customer: CustomerId) -> Arc<Mutex<Cart>> {
        if let Some(slot) = self.carts.read().unwrap().get(&customer) {
            return Arc::clone(slot);
        }
        let mut carts = self.carts.write().unwrap();
        Arc::clone(carts.entry(customer).or_default())
    }

    /// Quantity change against an existing line; the caller holds the cart
    /// lock. No partial application: a failed reserve leaves the old
    /// quantity standing.
    fn apply_quantity(
        &self,
        cart: &mut Cart,
        article: &Arc<Article>,
        quantity: i64,
    ) -> ShopResult<()> {
        let current = cart
            .quantity_of(article.id())
            .ok_or(ShopError::ArticleNotInCart(article.id()))?;

        if quantity > current {
            self.ledger.reserve(article, quantity - current)?;
        } else if quantity < current {
            self.ledger.release(article, current - quantity)?;
        } else {
            return Ok(());
        }

        if quantity == 0 {
            cart.drop_line(article.id());
        } else if let Some(line) = cart.line_mut(article.id()) {
            line.quantity = quantity;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shopd_catalog::Article;

    fn engine_with(
        articles: &[(Article, i64)],
    ) -> (Arc<CartEngine>, Arc<StockLedger>, Arc<EventLog>) {
        let catalog = Arc::new(Catalog::new());
        let ledger = Arc::new(StockLedger::new());
        // The engine only queues movements; nothing in these tests flushes,
        // so the log file itself is never created.
        let log = Arc::new(EventLog::new(std::env::temp_dir().join("shopd-engine-test.log")));
        for (article, stock) in articles {
            ledger.track(article, *stock).unwrap();
            catalog.insert(article.clone()).unwrap();
        }
        (
            Arc::new(CartEngine::new(catalog, Arc::clone(&ledger), Arc::clone(&log))),
            ledger,
            log,
        )
    }

    fn plain(id: u32) -> Article {
        Article::new(ArticleId(id), format!("article-{id}"), 150)
    }

    const C1: CustomerId = CustomerId(1);
    const C2: CustomerId = CustomerId(2);
    const A: ArticleId = ArticleId(10);

    #[test]
    fn reserve_increase_checkout_scenario() {
        let (engine, ledger, log) = engine_with(&[(plain(10), 10)]);

        engine.add_or_increase(C1, A, 4).unwrap();
        assert_eq!(ledger.level(A).unwrap(), 6);
        assert_eq!(engine.lines(C1)[0].quantity, 4);

        engine.set_quantity(C1, A, 7).unwrap();
        assert_eq!(ledger.level(A).unwrap(), 3);
        assert_eq!(engine.lines(C1)[0].quantity, 7);

        let purchase = engine.checkout(C1).unwrap();
        assert_eq!(ledger.level(A).unwrap(), 3, "checkout consumes, not releases");
        assert!(engine.is_empty(C1));
        assert_eq!(purchase.lines.len(), 1);
        assert_eq!(purchase.lines[0].quantity, 7);
        assert_eq!(purchase.total_cents(), 7 * 150);

        // Exactly one sale movement of -7 was queued for the log.
        assert_eq!(log.pending_delta_on(A, purchase.at.date()), -7);
    }

    #[test]
    fn add_twice_merges_into_one_line() {
        let (engine, ledger, _log) = engine_with(&[(plain(10), 10)]);
        engine.add_or_increase(C1, A, 2).unwrap();
        engine.add_or_increase(C1, A, 3).unwrap();
        assert_eq!(engine.lines(C1).len(), 1);
        assert_eq!(engine.lines(C1)[0].quantity, 5);
        assert_eq!(ledger.level(A).unwrap(), 5);
    }

    #[test]
    fn failed_increase_leaves_quantity_unchanged() {
        let (engine, ledger, _log) = engine_with(&[(plain(10), 10)]);
        engine.add_or_increase(C1, A, 4).unwrap();
        assert!(matches!(
            engine.set_quantity(C1, A, 11),
            Err(ShopError::InsufficientStock { .. })
        ));
        assert_eq!(engine.lines(C1)[0].quantity, 4);
        assert_eq!(ledger.level(A).unwrap(), 6);
    }

    #[test]
    fn non_positive_quantities_never_touch_stock() {
        let (engine, ledger, _log) = engine_with(&[(plain(10), 10)]);

        for quantity in [0, -3] {
            assert!(matches!(
                engine.add_or_increase(C1, A, quantity),
                Err(ShopError::InvalidQuantity(q)) if q == quantity
            ));
        }
        assert!(engine.is_empty(C1));
        assert_eq!(ledger.level(A).unwrap(), 10);

        // A negative absolute quantity must not release anything either.
        engine.add_or_increase(C1, A, 4).unwrap();
        assert!(matches!(
            engine.set_quantity(C1, A, -2),
            Err(ShopError::InvalidQuantity(-2))
        ));
        assert_eq!(engine.lines(C1)[0].quantity, 4);
        assert_eq!(ledger.level(A).unwrap(), 6);
    }

    #[test]
    fn set_quantity_without_line_fails() {
        let (engine, ledger, _log) = engine_with(&[(plain(10), 10)]);
        assert!(matches!(
            engine.set_quantity(C1, A, 3),
            Err(ShopError::ArticleNotInCart(_))
        ));
        assert_eq!(ledger.level(A).unwrap(), 10);
        assert!(engine.is_empty(C1));
    }

    #[test]
    fn set_zero_removes_the_line() {
        let (engine, ledger, _log) = engine_with(&[(plain(10), 10)]);
        engine.add_or_increase(C1, A, 4).unwrap();
        engine.set_quantity(C1, A, 0).unwrap();
        assert!(engine.is_empty(C1));
        assert_eq!(ledger.level(A).unwrap(), 10);
    }

    #[test]
    fn remove_releases_the_full_reservation() {
        let (engine, ledger, _log) = engine_with(&[(plain(10), 10)]);
        engine.add_or_increase(C1, A, 6).unwrap();
        engine.remove(C1, A).unwrap();
        assert_eq!(ledger.level(A).unwrap(), 10);
        assert!(matches!(
            engine.remove(C1, A),
            Err(ShopError::ArticleNotInCart(_))
        ));
    }

    #[test]
    fn empty_is_idempotent() {
        let (engine, ledger, _log) = engine_with(&[(plain(10), 10)]);
        engine.add_or_increase(C1, A, 5).unwrap();
        engine.empty(C1).unwrap();
        assert_eq!(ledger.level(A).unwrap(), 10);
        engine.empty(C1).unwrap();
        assert_eq!(ledger.level(A).unwrap(), 10);
    }

    #[test]
    fn checkout_logs_nothing_for_a_removed_article() {
        let catalog = Arc::new(Catalog::new());
        let ledger = Arc::new(StockLedger::new());
        let log = Arc::new(EventLog::new(
            std::env::temp_dir().join("shopd-engine-removed-test.log"),
        ));
        let article = plain(10);
        ledger.track(&article, 10).unwrap();
        catalog.insert(article).unwrap();
        let engine = CartEngine::new(
            Arc::clone(&catalog),
            Arc::clone(&ledger),
            Arc::clone(&log),
        );

        engine.add_or_increase(C1, A, 4).unwrap();
        catalog.remove(A).unwrap();
        ledger.forget(A);

        // The purchase still carries the priced line, but the log stays
        // clean for whoever reuses the article number later.
        let purchase = engine.checkout(C1).unwrap();
        assert_eq!(purchase.lines[0].quantity, 4);
        assert_eq!(purchase.total_cents(), 4 * 150);
        assert_eq!(log.pending_delta_on(A, purchase.at.date()), 0);
    }

    #[test]
    fn checkout_of_empty_cart_fails() {
        let (engine, _, _) = engine_with(&[(plain(10), 10)]);
        assert!(matches!(engine.checkout(C1), Err(ShopError::EmptyCart)));
    }

    #[test]
    fn bulk_rule_is_enforced_in_the_cart() {
        let bulk = Article::bulk(ArticleId(20), "crate", 1099, 6);
        let (engine, ledger, _log) = engine_with(&[(bulk, 48)]);
        let b = ArticleId(20);

        assert!(matches!(
            engine.add_or_increase(C1, b, 4),
            Err(ShopError::InvalidPackageMultiple { .. })
        ));
        engine.add_or_increase(C1, b, 6).unwrap();
        assert_eq!(ledger.level(b).unwrap(), 42);
    }

    #[test]
    fn customers_race_for_the_last_units_without_oversell() {
        let (engine, ledger, _log) = engine_with(&[(plain(10), 10)]);

        let mut won = 0;
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let engine = Arc::clone(&engine);
                    scope.spawn(move || {
                        engine
                            .add_or_increase(CustomerId(100 + i), A, 4)
                            .is_ok()
                    })
                })
                .collect();
            for handle in handles {
                if handle.join().unwrap() {
                    won += 1;
                }
            }
        });

        assert_eq!(won, 2, "10 units allow exactly two reservations of 4");
        assert_eq!(ledger.level(A).unwrap(), 2);

        // Conservation across all carts.
        for i in 0..8 {
            engine.empty(CustomerId(100 + i)).unwrap();
        }
        assert_eq!(ledger.level(A).unwrap(), 10);
    }

    #[test]
    fn independent_customers_do_not_disturb_each_other() {
        let (engine, ledger, _log) = engine_with(&[(plain(10), 10)]);
        engine.add_or_increase(C1, A, 3).unwrap();
        engine.add_or_increase(C2, A, 2).unwrap();
        assert_eq!(ledger.level(A).unwrap(), 5);

        engine.empty(C1).unwrap();
        assert_eq!(ledger.level(A).unwrap(), 8);
        assert_eq!(engine.lines(C2)[0].quantity, 2);
    }

    proptest! {
        /// Conservation: after any mutation sequence without a checkout,
        /// ledger level plus cart holdings equals the initial stock, and
        /// `empty` restores the initial level exactly.
        #[test]
        fn empty_restores_initial_stock(ops in prop::collection::vec((0u8..3, 0i64..6), 1..24)) {
            let (engine, ledger, _log) = engine_with(&[(plain(10), 20)]);
            for (op, quantity) in ops {
                match op {
                    0 if quantity > 0 => {
                        let _ = engine.add_or_increase(C1, A, quantity);
                    }
                    1 => {
                        let _ = engine.set_quantity(C1, A, quantity);
                    }
                    _ => {
                        let _ = engine.remove(C1, A);
                    }
                }
            }
            let held: i64 = engine.lines(C1).iter().map(|l| l.quantity).sum();
            prop_assert_eq!(ledger.level(A).unwrap() + held, 20);

            engine.empty(C1).unwrap();
            prop_assert_eq!(ledger.level(A).unwrap(), 20);
        }
    }
}
