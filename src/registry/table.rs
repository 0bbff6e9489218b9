/*!
 * Reset Slot Table
 * Single-lock slot table with a lazily-started shared subscription
 */

use crate::core::errors::RegistryError;
use crate::core::types::{RegistryResult, SlotId};
use crate::cycle::Collector;
use crate::notify::CycleNotifier;
use ahash::RandomState;
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};
use std::thread;

/// Zero-argument reset action
pub type ResetFn = Box<dyn Fn() + Send>;

struct Shared {
    notifier: CycleNotifier,
}

#[derive(Default)]
struct Table {
    slots: HashMap<SlotId, ResetFn, RandomState>,
    shared: Option<Shared>,
}

/// Registry multiplexing one cycle subscription across many reset slots.
///
/// One shared subscription amortizes the engine's cost over arbitrarily many
/// "clear this after every cycle" registrations. The slot table and the
/// shared subscription are one unit behind a single mutex: a dispatch pass
/// either fully precedes or fully follows any register/unregister.
///
/// Reset actions run on the dispatch thread with the table locked. They must
/// be idempotent, side-effect-light (the point is to cheaply null out a
/// reference, not to do real work), and must not call back into the
/// registry. No ordering is guaranteed across distinct slots within one
/// pass. A panicking action is fatal to dispatch and is not caught.
pub struct ResetRegistry {
    collector: Arc<Collector>,
    table: Arc<Mutex<Table>>,
}

impl ResetRegistry {
    pub fn new(collector: Arc<Collector>) -> Self {
        Self {
            collector,
            table: Arc::new(Mutex::new(Table::default())),
        }
    }

    /// Process-wide registry over the global collector, created on first use.
    pub fn global() -> &'static ResetRegistry {
        static GLOBAL: OnceLock<ResetRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| ResetRegistry::new(Arc::clone(Collector::global())))
    }

    /// Register `reset` under `id`.
    ///
    /// The first slot lazily creates the shared subscription and its
    /// dispatch thread; every completed cycle then invokes all registered
    /// actions.
    pub fn register<F>(&self, id: impl Into<SlotId>, reset: F) -> RegistryResult<()>
    where
        F: Fn() + Send + 'static,
    {
        let id = id.into();
        if id.is_empty() {
            return Err(RegistryError::InvalidIdentity);
        }

        let mut table = self.table.lock();
        if table.slots.contains_key(&id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        if table.slots.is_empty() {
            table.shared = Some(self.start_dispatch());
        }
        table.slots.insert(id, Box::new(reset));
        debug!("Registered reset slot ({} active)", table.slots.len());
        Ok(())
    }

    /// Remove the slot under `id`.
    ///
    /// Removing the last slot closes the shared subscription; the dispatch
    /// thread observes end-of-stream and exits.
    pub fn unregister(&self, id: impl Into<SlotId>) -> RegistryResult<()> {
        let id = id.into();
        if id.is_empty() {
            return Err(RegistryError::InvalidIdentity);
        }

        let mut table = self.table.lock();
        if table.slots.remove(&id).is_none() {
            return Err(RegistryError::NotRegistered(id));
        }
        if table.slots.is_empty() {
            if let Some(shared) = table.shared.take() {
                shared.notifier.close();
                info!("Reset registry subscription torn down");
            }
        }
        debug!("Unregistered reset slot ({} active)", table.slots.len());
        Ok(())
    }

    /// Number of registered slots.
    pub fn len(&self) -> usize {
        self.table.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().slots.is_empty()
    }

    /// Whether the shared subscription currently exists.
    pub fn has_active_subscription(&self) -> bool {
        self.table.lock().shared.is_some()
    }

    fn start_dispatch(&self) -> Shared {
        let notifier = self.collector.subscribe();
        let signal = notifier.signal().clone();
        let table = Arc::downgrade(&self.table);
        thread::spawn(move || dispatch_loop(signal, table));
        info!("Reset registry subscription started");
        Shared { notifier }
    }
}

/// Dispatch loop: one pass over the slot table per received token.
fn dispatch_loop(signal: flume::Receiver<()>, table: Weak<Mutex<Table>>) {
    for () in signal.iter() {
        let Some(table) = table.upgrade() else {
            break;
        };
        let table = table.lock();
        for reset in table.slots.values() {
            reset();
        }
    }
    debug!("Reset dispatch exiting: subscription closed");
}
