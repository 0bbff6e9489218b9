/*!
 * Reclamation Collector
 * Process-wide cycle driver with heap accounting and hook dispatch
 */

use super::hooks::{HookBoard, Sentinel};
use crate::core::limits::MIN_CYCLE_INTERVAL;
use crate::core::types::{CycleId, Size};
use log::{debug, info};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

/// Why a reclamation cycle was forced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CycleReason {
    /// Requested by application code
    Manual,
    /// Heap gauge crossed the supervisor's soft bound
    Threshold,
    /// Heap gauge crossed the supervisor's hard bound
    Pressure,
}

/// Statistics for one completed cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CycleStats {
    pub cycle: CycleId,
    pub reason: CycleReason,
    pub heap_used: Size,
    pub armed_hooks: usize,
}

/// Process-wide reclamation coordinator.
///
/// A `Collector` owns no memory itself: consumers holding speculative
/// allocations (caches, pools, buffers) subscribe for cycle notifications
/// and shed on their own schedule. [`collect`](Collector::collect) announces
/// that a cycle completed; armed hooks then fire on the collector's dispatch
/// worker thread, never on the calling thread.
///
/// There is no guarantee a cycle ever runs: a process that never calls
/// `collect` (directly or through the supervisor) emits zero notifications.
pub struct Collector {
    board: Arc<HookBoard>,
    /// Wakes the dispatch worker; one token per completed cycle
    cycle_tx: flume::Sender<CycleId>,
    /// Cycles announced so far
    epoch: AtomicU64,
    /// Cycles whose hook batch has fully fired (worker-side)
    completed: Arc<AtomicU64>,
    /// Bytes reported held by participating consumers
    heap_used: AtomicUsize,
    last_cycle: Mutex<Instant>,
    min_interval: Duration,
}

impl Collector {
    pub fn new() -> Arc<Self> {
        Self::with_min_interval(MIN_CYCLE_INTERVAL)
    }

    /// Create a collector with a custom threshold-cycle cooldown (useful for
    /// testing).
    pub fn with_min_interval(min_interval: Duration) -> Arc<Self> {
        let board = Arc::new(HookBoard::default());
        let (cycle_tx, cycle_rx) = flume::unbounded();
        let completed = Arc::new(AtomicU64::new(0));

        let worker_board = Arc::clone(&board);
        let worker_completed = Arc::clone(&completed);
        thread::spawn(move || dispatch_loop(cycle_rx, worker_board, worker_completed));

        info!(
            "Collector initialized ({}ms threshold cooldown)",
            min_interval.as_millis()
        );
        Arc::new(Self {
            board,
            cycle_tx,
            epoch: AtomicU64::new(0),
            completed,
            heap_used: AtomicUsize::new(0),
            last_cycle: Mutex::new(Instant::now()),
            min_interval,
        })
    }

    /// Process-wide default collector, created on first use.
    pub fn global() -> &'static Arc<Collector> {
        static GLOBAL: OnceLock<Arc<Collector>> = OnceLock::new();
        GLOBAL.get_or_init(Collector::new)
    }

    /// Complete one reclamation cycle.
    ///
    /// Non-blocking: the cycle is handed to the dispatch worker and every
    /// sentinel armed at this point fires there, in arming order.
    pub fn collect(&self, reason: CycleReason) -> CycleStats {
        let cycle = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        *self.last_cycle.lock() = Instant::now();

        let stats = CycleStats {
            cycle,
            reason,
            heap_used: self.heap_used(),
            armed_hooks: self.board.armed_count(),
        };

        // The worker is gone only during teardown; the cycle still counts
        let _ = self.cycle_tx.send(cycle);

        debug!(
            "Cycle {} completed ({:?}): {} bytes held, {} hooks armed",
            stats.cycle, stats.reason, stats.heap_used, stats.armed_hooks
        );
        stats
    }

    /// Arm a single-shot hook for the next completed cycle.
    ///
    /// The hook runs on the dispatch worker and must not panic; an unwinding
    /// hook is fatal to hook delivery process-wide.
    pub fn arm<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.board.arm(Sentinel::new(hook));
    }

    pub(crate) fn board(&self) -> &Arc<HookBoard> {
        &self.board
    }

    /// Cycles announced so far.
    pub fn cycles(&self) -> CycleId {
        self.epoch.load(Ordering::Acquire)
    }

    /// Cycles whose hook batch has fully fired.
    pub fn completed_cycles(&self) -> CycleId {
        self.completed.load(Ordering::Acquire)
    }

    /// Report bytes newly held by a participating consumer.
    pub fn record_alloc(&self, bytes: Size) {
        self.heap_used.fetch_add(bytes, Ordering::AcqRel);
    }

    /// Report bytes released by a participating consumer.
    pub fn record_free(&self, bytes: Size) {
        let _ = self
            .heap_used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |held| {
                Some(held.saturating_sub(bytes))
            });
    }

    /// Bytes currently reported held by participating consumers.
    pub fn heap_used(&self) -> Size {
        self.heap_used.load(Ordering::Acquire)
    }

    /// Whether the threshold-cycle cooldown has elapsed.
    pub fn should_collect(&self) -> bool {
        self.last_cycle.lock().elapsed() >= self.min_interval
    }
}

/// Worker loop: fires each queued cycle's hook batch in order.
///
/// Exits when the collector is dropped (the cycle channel disconnects);
/// sentinels still armed at that point are dropped unfired.
fn dispatch_loop(
    cycle_rx: flume::Receiver<CycleId>,
    board: Arc<HookBoard>,
    completed: Arc<AtomicU64>,
) {
    for cycle in cycle_rx.iter() {
        let fired = board.fire_batch();
        // Concurrent collect() callers may enqueue ids out of order; the
        // completed epoch only ever moves forward
        completed.fetch_max(cycle, Ordering::AcqRel);
        if fired > 0 {
            debug!("Cycle {}: fired {} hooks", cycle, fired);
        }
    }
    debug!("Dispatch worker exiting: collector dropped");
}
