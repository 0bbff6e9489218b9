/*!
 * Cycle Hooks
 * Single-shot hooks fired once per completed reclamation cycle
 */

use parking_lot::Mutex;
use std::mem;

/// A single-shot hook armed for the next completed cycle.
///
/// Sentinels are ephemeral: the board owns one from arming until the next
/// cycle fires it, and firing consumes it. An indefinite per-cycle stream is
/// built by re-arming a fresh sentinel from inside the hook itself (see
/// `notify::after_cycle`).
pub(crate) struct Sentinel {
    hook: Box<dyn FnOnce() + Send>,
}

impl Sentinel {
    pub(crate) fn new<F>(hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            hook: Box::new(hook),
        }
    }

    fn fire(self) {
        (self.hook)()
    }
}

/// Board of armed sentinels, shared between arming callers and the dispatch
/// worker.
#[derive(Default)]
pub(crate) struct HookBoard {
    armed: Mutex<Vec<Sentinel>>,
}

impl HookBoard {
    /// Arm a sentinel for the next completed cycle.
    pub(crate) fn arm(&self, sentinel: Sentinel) {
        self.armed.lock().push(sentinel);
    }

    /// Number of sentinels currently armed.
    pub(crate) fn armed_count(&self) -> usize {
        self.armed.lock().len()
    }

    /// Fire every sentinel armed before this call, in arming order.
    ///
    /// The batch is swapped out under the lock and fired with the lock
    /// released so hooks can re-arm onto the same board; re-armed sentinels
    /// land in the next cycle's batch.
    pub(crate) fn fire_batch(&self) -> usize {
        let batch = mem::take(&mut *self.armed.lock());
        let fired = batch.len();
        for sentinel in batch {
            sentinel.fire();
        }
        fired
    }
}
