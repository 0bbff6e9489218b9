/*!
 * Rearm Engine
 * Converts the single-shot cycle hook into an indefinite per-cycle stream
 */

use crate::cycle::{Collector, HookBoard, Sentinel};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Stops a stream armed with [`after_cycle`].
///
/// Dropping the guard does NOT stop the stream: like the underlying hook
/// primitive, the stream keeps firing until `stop` is called or the owning
/// collector is dropped. [`CycleNotifier`](crate::notify::CycleNotifier) is
/// the safe wrapper with teardown tied to the handle's lifetime.
#[must_use = "dropping the guard without calling stop() leaves the stream armed"]
pub struct StopGuard {
    stop: Arc<AtomicBool>,
}

impl StopGuard {
    /// Stop the stream.
    ///
    /// Idempotent and safe to call concurrently with a firing hook: no new
    /// invocation of the action begins after this returns, though one
    /// already in flight may still complete.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}

/// Invoke `action` once per completed reclamation cycle until the returned
/// guard is stopped.
///
/// This is the low-level interface. The action runs on the collector's
/// dispatch worker: it must not panic (an unwinding hook is fatal to hook
/// delivery process-wide) and should avoid allocating much beyond what its
/// own work requires. Blocking work belongs on a thread the action wakes,
/// not in the action itself.
pub fn after_cycle<F>(collector: &Collector, action: F) -> StopGuard
where
    F: Fn() + Send + Sync + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    arm(
        Arc::downgrade(collector.board()),
        Arc::clone(&stop),
        Arc::new(action),
    );
    StopGuard { stop }
}

/// Arm one sentinel that re-arms its successor before invoking the action.
fn arm(board: Weak<HookBoard>, stop: Arc<AtomicBool>, action: Arc<dyn Fn() + Send + Sync>) {
    let Some(live) = board.upgrade() else {
        // Collector gone: the stream ends with it
        return;
    };
    live.arm(Sentinel::new(move || {
        // Stop flag first: a stopped stream must never re-arm, so the
        // sentinel chain is reclaimed permanently
        if stop.load(Ordering::Acquire) {
            return;
        }
        // Re-arm before invoking: the next cycle must find a sentinel armed
        // even while the action is still running
        arm(board.clone(), Arc::clone(&stop), Arc::clone(&action));
        action();
    }));
}
