/*!
 * Cycle Notifier
 * Coalescing single-slot notification channel over the rearm engine
 */

use super::rearm::{after_cycle, StopGuard};
use crate::core::limits::SIGNAL_QUEUE_CAPACITY;
use crate::cycle::Collector;
use arc_swap::ArcSwapOption;
use log::debug;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const ARMED: u8 = 0;
const STOPPING: u8 = 1;
const STOPPED: u8 = 2;

/// One subscription to completed-cycle notifications.
///
/// The signal queue holds at most one unread token: a burst of cycles while
/// the consumer is away coalesces into a single pending notification, so
/// receivers learn "at least one cycle happened since the last receive",
/// never how many. The push into the queue never blocks and never backs up.
///
/// The subscription stops when [`close`](CycleNotifier::close) is called or
/// when the notifier is dropped, whichever happens first; after that the
/// signal reports end-of-stream and no further token is ever delivered.
pub struct CycleNotifier {
    rx: flume::Receiver<()>,
    tx_slot: Arc<ArcSwapOption<flume::Sender<()>>>,
    state: Arc<AtomicU8>,
    engine: StopGuard,
}

impl Collector {
    /// Subscribe to completed-cycle notifications.
    ///
    /// Each subscription is independent: use dedicated subscriptions to
    /// listen in multiple receivers at the same time.
    pub fn subscribe(&self) -> CycleNotifier {
        CycleNotifier::new(self)
    }
}

impl CycleNotifier {
    pub(crate) fn new(collector: &Collector) -> Self {
        let (tx, rx) = flume::bounded(SIGNAL_QUEUE_CAPACITY);
        let tx_slot = Arc::new(ArcSwapOption::from_pointee(tx));
        let state = Arc::new(AtomicU8::new(ARMED));

        let hook_slot = Arc::clone(&tx_slot);
        let hook_state = Arc::clone(&state);
        let engine = after_cycle(collector, move || {
            // Stop flag first: a stopped subscription sinks all firings
            if hook_state.load(Ordering::Acquire) != ARMED {
                return;
            }
            if let Some(tx) = hook_slot.load_full() {
                // Full queue: coalesced. Disconnected: benign close race.
                let _ = tx.try_send(());
            }
        });

        Self {
            rx,
            tx_slot,
            state,
            engine,
        }
    }

    /// Receiver carrying one token per undrained notification.
    ///
    /// `recv` blocks until the next token or end-of-stream; `recv_async`
    /// awaits the same without a runtime dependency. `Ok(())` means at least
    /// one cycle completed since the last receive; `Err` means the
    /// subscription is closed and fully drained. There is no built-in
    /// timeout: `recv_timeout` is the consumer's own timer.
    pub fn signal(&self) -> &flume::Receiver<()> {
        &self.rx
    }

    /// Stop the subscription and release waiting receivers.
    ///
    /// Idempotent, and safe to call concurrently from several threads or
    /// alongside the engine's own firing: the winner of the state transition
    /// stops the engine, closes the queue, and drains any pending token so
    /// every subsequent receive observes end-of-stream.
    pub fn close(&self) {
        if self
            .state
            .compare_exchange(ARMED, STOPPING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        self.engine.stop();
        // Swap out the producer side; the queue closes once in-flight loads
        // of the sender drop
        self.tx_slot.store(None);
        // A token pushed just before the swap must not be observed after
        // close returns
        while self.rx.try_recv().is_ok() {}
        self.state.store(STOPPED, Ordering::Release);
        debug!("Cycle subscription closed");
    }

    pub fn is_closed(&self) -> bool {
        self.state.load(Ordering::Acquire) != ARMED
    }
}

impl Drop for CycleNotifier {
    /// Implicit teardown for subscribers that forget to close explicitly.
    ///
    /// A safety net, not the primary path: callers that own their notifier
    /// should close it themselves.
    fn drop(&mut self) {
        self.close();
    }
}
