/*!
 * Heap Supervisor
 * Polls the heap gauge and forces cycles when the band is crossed
 */

use super::band::HeapBand;
use crate::core::limits::SUPERVISOR_POLL_INTERVAL;
use crate::cycle::{Collector, CycleReason};
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Independent memory-policy component: watches the collector's heap gauge
/// on a fixed interval and forces reclamation cycles when the configured
/// band is crossed.
///
/// Above the hard bound a pressure cycle is forced on every tick; above the
/// soft bound a threshold cycle is forced once the collector's cooldown
/// allows. The supervisor consumes no notification interface itself.
pub struct Supervisor {
    band: Arc<RwLock<HeapBand>>,
    shutdown_tx: flume::Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl Supervisor {
    /// Spawn a supervisor polling `collector` every `interval`.
    pub fn spawn(collector: Arc<Collector>, band: HeapBand, interval: Duration) -> Self {
        let band = Arc::new(RwLock::new(band));
        let (shutdown_tx, shutdown_rx) = flume::bounded(1);

        let poll_band = Arc::clone(&band);
        let worker = thread::spawn(move || poll_loop(collector, poll_band, shutdown_rx, interval));

        info!("Heap supervisor started ({}ms interval)", interval.as_millis());
        Self {
            band,
            shutdown_tx,
            worker: Some(worker),
        }
    }

    /// Spawn with the band from `MEMSHED_HEAP_BAND` and the default
    /// interval.
    pub fn spawn_from_env(collector: Arc<Collector>) -> Self {
        Self::spawn(collector, HeapBand::from_env(), SUPERVISOR_POLL_INTERVAL)
    }

    /// Current band.
    pub fn band(&self) -> HeapBand {
        *self.band.read()
    }

    /// Replace the band; takes effect on the next tick.
    pub fn set_band(&self, band: HeapBand) {
        *self.band.write() = band;
        debug!("Heap band set to {}", band);
    }

    /// Stop the poll loop and wait for it to exit. Idempotent.
    pub fn shutdown(&mut self) {
        let _ = self.shutdown_tx.try_send(());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Heap supervisor worker panicked");
            }
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn poll_loop(
    collector: Arc<Collector>,
    band: Arc<RwLock<HeapBand>>,
    shutdown_rx: flume::Receiver<()>,
    interval: Duration,
) {
    loop {
        match shutdown_rx.recv_timeout(interval) {
            Ok(()) | Err(flume::RecvTimeoutError::Disconnected) => break,
            Err(flume::RecvTimeoutError::Timeout) => {}
        }

        let band = *band.read();
        if band.is_unbounded() {
            continue;
        }
        let used = collector.heap_used();

        if let Some(hi) = band.hi {
            if used > hi {
                warn!(
                    "Heap gauge {} over hard bound {}: forcing pressure cycle",
                    used, hi
                );
                collector.collect(CycleReason::Pressure);
                continue;
            }
        }
        if let Some(lo) = band.lo {
            if used > lo && collector.should_collect() {
                debug!(
                    "Heap gauge {} over soft bound {}: forcing threshold cycle",
                    used, lo
                );
                collector.collect(CycleReason::Threshold);
            }
        }
    }
    debug!("Heap supervisor exiting");
}
