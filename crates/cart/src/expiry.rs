//! Idle-cart expiry.
//!
//! A customer's reservations must not outlive their interest: after 15
//! minutes without any client activity, the cart is emptied and its stock
//! returned to the pool.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use shopd_core::CustomerId;

use crate::engine::CartEngine;

/// Idle period after which a logged-in customer's cart is emptied.
pub const CART_IDLE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// One cancellable delayed task per logged-in customer.
///
/// Re-arming is atomic: under the map lock the previous handle is aborted
/// and replaced, so at most one timer can ever fire per customer. A fire
/// that races an explicit checkout is harmless because emptying an
/// already-empty cart is a no-op.
#[derive(Debug)]
pub struct CartExpiryScheduler {
    engine: Arc<CartEngine>,
    idle: Duration,
    pending: Mutex<HashMap<CustomerId, JoinHandle<()>>>,
}

impl CartExpiryScheduler {
    pub fn new(engine: Arc<CartEngine>) -> Self {
        Self::with_timeout(engine, CART_IDLE_TIMEOUT)
    }

    pub fn with_timeout(engine: Arc<CartEngine>, idle: Duration) -> Self {
        Self {
            engine,
            idle,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Note activity from a logged-in customer: cancel any pending timer
    /// and, if the cart currently holds anything, arm a fresh one.
    ///
    /// Every request counts as activity, including pure browsing; any
    /// interaction keeps the cart alive.
    pub fn on_activity(&self, customer: CustomerId) {
        let mut pending = self.pending.lock().unwrap();
        if let Some(handle) = pending.remove(&customer) {
            handle.abort();
        }
        if self.engine.is_empty(customer) {
            return;
        }

        let engine = Arc::clone(&self.engine);
        let idle = self.idle;
        pending.insert(
            customer,
            tokio::spawn(async move {
                tokio::time::sleep(idle).await;
                match engine.empty(customer) {
                    Ok(()) => info!(%customer, "idle cart expired; reserved stock returned"),
                    // The expiry path must never take a session down.
                    Err(err) => warn!(%customer, error = %err, "emptying expired cart failed"),
                }
            }),
        );
    }

    /// Drop the pending timer, if any. Called on checkout and explicit
    /// empty so the cart is not emptied twice.
    pub fn cancel(&self, customer: CustomerId) {
        if let Some(handle) = self.pending.lock().unwrap().remove(&customer) {
            handle.abort();
        }
    }
}
