//! The shop facade: one shared object wiring catalog, ledger, parties,
//! carts, event log and snapshots together. Sessions only ever talk to
//! this type.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use tracing::{info, warn};

use shopd_cart::{CartEngine, CartExpiryScheduler, Purchase};
use shopd_catalog::{Article, Catalog, StockLedger};
use shopd_core::{ArticleId, CustomerId, EmployeeId, ShopError, ShopResult};
use shopd_events::{DayStock, EventLog, HistoryReconstructor, StockMovement};
use shopd_parties::{Customer, Employee, Login, PartyDirectory};
use shopd_persist::{ArticleSnapshot, SnapshotStore};

const EVENT_LOG_FILE: &str = "events.log";

pub struct Shop {
    catalog: Arc<Catalog>,
    ledger: Arc<StockLedger>,
    parties: Arc<PartyDirectory>,
    events: Arc<EventLog>,
    history: HistoryReconstructor,
    cart: Arc<CartEngine>,
    expiry: CartExpiryScheduler,
    store: SnapshotStore,
}

impl Shop {
    /// Load the shop from its data directory, or start empty on first run.
    ///
    /// An empty employee register gets a default `admin`/`admin` account,
    /// otherwise nobody could ever manage the shop.
    pub fn open(data_dir: impl Into<PathBuf>) -> ShopResult<Arc<Self>> {
        let dir: PathBuf = data_dir.into();
        let store = SnapshotStore::new(&dir);

        let catalog = Arc::new(Catalog::new());
        let ledger = Arc::new(StockLedger::new());
        for snap in store.load_articles()? {
            let stored = catalog.insert(snap.article)?;
            ledger.track(&stored, snap.stock)?;
        }

        let parties = Arc::new(PartyDirectory::new());
        for customer in store.load_customers()? {
            parties.add_customer(customer)?;
        }
        let employees = store.load_employees()?;
        if employees.is_empty() {
            warn!("no employees on record; seeding default admin/admin account");
            parties.add_employee(Employee {
                id: EmployeeId(1),
                username: "admin".into(),
                password: "admin".into(),
                name: "Admin".into(),
            })?;
        }
        for employee in employees {
            parties.add_employee(employee)?;
        }

        let events = Arc::new(EventLog::new(dir.join(EVENT_LOG_FILE)));
        let cart = Arc::new(CartEngine::new(
            Arc::clone(&catalog),
            Arc::clone(&ledger),
            Arc::clone(&events),
        ));

        info!(
            articles = catalog.len(),
            customers = parties.customers().len(),
            employees = parties.employees().len(),
            dir = %dir.display(),
            "shop data loaded"
        );

        Ok(Arc::new(Self {
            history: HistoryReconstructor::new(Arc::clone(&events)),
            expiry: CartExpiryScheduler::new(Arc::clone(&cart)),
            catalog,
            ledger,
            parties,
            events,
            cart,
            store,
        }))
    }

    pub fn login(&self, username: &str, password: &str) -> Option<Login> {
        self.parties.login(username, password)
    }

    pub fn cart(&self) -> &CartEngine {
        &self.cart
    }

    pub fn expiry(&self) -> &CartExpiryScheduler {
        &self.expiry
    }

    // -- catalog ---------------------------------------------------------

    /// Add an article and put its opening stock in the ledger. Opening
    /// stock is logged as an inbound movement by `employee`.
    pub fn new_article(
        &self,
        employee: EmployeeId,
        id: ArticleId,
        name: String,
        price_cents: u64,
        package_size: Option<i64>,
        initial_stock: i64,
    ) -> ShopResult<Arc<Article>> {
        if initial_stock < 0 {
            return Err(ShopError::InvalidQuantity(initial_stock));
        }
        if let Some(size) = package_size {
            if size < 2 {
                return Err(ShopError::InvalidPackageSize(size));
            }
        }
        let article = match package_size {
            Some(size) => Article::bulk(id, name, price_cents, size),
            None => Article::new(id, name, price_cents),
        };
        article.check_package_multiple(initial_stock)?;

        let stored = self.catalog.insert(article)?;
        if let Err(err) = self.ledger.track(&stored, initial_stock) {
            let _ = self.catalog.remove(id);
            return Err(err);
        }
        if initial_stock > 0 {
            self.events.record(StockMovement::adjustment(
                Local::now().naive_local(),
                employee,
                id,
                initial_stock,
            ));
        }
        Ok(stored)
    }

    /// Restock (positive delta) or write off (negative delta) an article.
    /// Returns the new level.
    pub fn adjust_stock(
        &self,
        employee: EmployeeId,
        id: ArticleId,
        delta: i64,
    ) -> ShopResult<i64> {
        let article = self.catalog.get(id)?;
        let level = self.ledger.adjust(&article, delta)?;
        self.events.record(StockMovement::adjustment(
            Local::now().naive_local(),
            employee,
            id,
            delta,
        ));
        Ok(level)
    }

    /// Drop an article from catalog and ledger and purge its movement
    /// history, so the log never refers to articles that no longer exist.
    pub fn remove_article(&self, id: ArticleId) -> ShopResult<Arc<Article>> {
        let removed = self.catalog.remove(id)?;
        self.ledger.forget(id);
        self.events.purge_article(id)?;
        Ok(removed)
    }

    pub fn articles(&self, by_name: bool) -> Vec<Arc<Article>> {
        if by_name {
            self.catalog.sorted_by_name()
        } else {
            self.catalog.sorted_by_id()
        }
    }

    pub fn search(&self, needle: &str) -> Vec<Arc<Article>> {
        self.catalog.search_by_name(needle)
    }

    pub fn stock_level(&self, id: ArticleId) -> ShopResult<i64> {
        self.ledger.level(id)
    }

    // -- parties ---------------------------------------------------------

    pub fn new_customer(&self, customer: Customer) -> ShopResult<Arc<Customer>> {
        self.parties.add_customer(customer)
    }

    pub fn new_employee(&self, employee: Employee) -> ShopResult<Arc<Employee>> {
        self.parties.add_employee(employee)
    }

    /// Remove a customer account; any cart they still hold is emptied
    /// first so the reserved stock returns to the pool.
    pub fn remove_customer(&self, id: CustomerId) -> ShopResult<Arc<Customer>> {
        let removed = self.parties.remove_customer(id)?;
        self.expiry.cancel(id);
        if let Err(err) = self.cart.empty(id) {
            warn!(customer = %id, error = %err, "emptying removed customer's cart failed");
        }
        Ok(removed)
    }

    pub fn remove_employee(&self, id: EmployeeId) -> ShopResult<Arc<Employee>> {
        self.parties.remove_employee(id)
    }

    pub fn customers(&self) -> Vec<Arc<Customer>> {
        self.parties.customers()
    }

    pub fn employees(&self) -> Vec<Arc<Employee>> {
        self.parties.employees()
    }

    // -- carts and trade -------------------------------------------------

    pub fn empty_cart(&self, customer: CustomerId) -> ShopResult<()> {
        self.expiry.cancel(customer);
        self.cart.empty(customer)
    }

    /// Buy the cart's contents. The sale movements land in the event log
    /// and the catalog snapshot is rewritten so a crash right after the
    /// purchase cannot resurrect sold stock.
    pub fn checkout(&self, customer: CustomerId) -> ShopResult<Purchase> {
        self.expiry.cancel(customer);
        let purchase = self.cart.checkout(customer)?;
        self.events.flush()?;
        self.save_articles()?;
        Ok(purchase)
    }

    /// Closing stock of `article` for each of the last 30 days, oldest
    /// first, reconstructed backward from the live level.
    pub fn article_history(&self, article: ArticleId) -> ShopResult<Vec<DayStock>> {
        // Queued movements can predate today (recorded just before
        // midnight); flush first so the file scan sees them.
        self.events.flush()?;
        let live = self.ledger.level(article)?;
        self.history
            .history(article, live, Local::now().naive_local())
    }

    /// The raw movement log, flushed first so queued movements show up.
    pub fn log_lines(&self) -> ShopResult<Vec<String>> {
        self.events.flush()?;
        self.events.read_lines()
    }

    // -- persistence -----------------------------------------------------

    /// Write all registers and the event log to disk.
    pub fn persist_all(&self) -> ShopResult<()> {
        self.save_articles()?;
        let customers: Vec<Customer> =
            self.customers().iter().map(|c| (**c).clone()).collect();
        self.store.save_customers(&customers)?;
        let employees: Vec<Employee> =
            self.employees().iter().map(|e| (**e).clone()).collect();
        self.store.save_employees(&employees)?;
        self.events.flush()
    }

    fn save_articles(&self) -> ShopResult<()> {
        let snaps = self
            .catalog
            .sorted_by_id()
            .into_iter()
            .map(|article| {
                let stock = self.ledger.level(article.id())?;
                Ok(ArticleSnapshot {
                    article: (*article).clone(),
                    stock,
                })
            })
            .collect::<ShopResult<Vec<_>>>()?;
        self.store.save_articles(&snaps)
    }
}
