/*!
 * Pointer Watch
 * Typed reset slots over atomic nullable pointers
 */

use super::table::ResetRegistry;
use crate::core::types::{RegistryResult, SlotId};
use arc_swap::ArcSwapOption;
use std::fmt::Write;
use std::sync::Arc;

impl ResetRegistry {
    /// Register `slot` to be cleared (`store(None)`) after every completed
    /// cycle.
    ///
    /// The registry holds the pointer weakly and never keeps its target
    /// alive: a watched slot may be dropped by its owner, after which the
    /// reset action degrades to a no-op until [`unwatch`](Self::unwatch)
    /// removes it.
    pub fn watch<T>(&self, slot: &Arc<ArcSwapOption<T>>) -> RegistryResult<()>
    where
        T: Send + Sync + 'static,
    {
        let target = Arc::downgrade(slot);
        self.register(pointer_id(slot), move || {
            if let Some(live) = target.upgrade() {
                live.store(None);
            }
        })
    }

    /// Stop clearing `slot`.
    pub fn unwatch<T>(&self, slot: &Arc<ArcSwapOption<T>>) -> RegistryResult<()>
    where
        T: Send + Sync + 'static,
    {
        self.unregister(pointer_id(slot))
    }
}

/// Identity of a watched pointer: its heap address, stable for the lifetime
/// of the `Arc` and short enough to stay inline.
fn pointer_id<T>(slot: &Arc<ArcSwapOption<T>>) -> SlotId {
    let mut id = SlotId::new();
    let _ = write!(id, "ptr:{:#x}", Arc::as_ptr(slot) as usize);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::RegistryError;
    use crate::cycle::{Collector, CycleReason};
    use std::time::{Duration, Instant};

    fn eventually(check: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !check() {
            assert!(Instant::now() < deadline, "condition never held");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_watched_pointer_cleared_after_cycle() {
        let collector = Collector::with_min_interval(Duration::ZERO);
        let registry = ResetRegistry::new(Arc::clone(&collector));

        let slot: Arc<ArcSwapOption<Vec<u8>>> =
            Arc::new(ArcSwapOption::from_pointee(vec![0u8; 1024]));
        registry.watch(&slot).unwrap();
        assert!(slot.load().is_some());

        collector.collect(CycleReason::Manual);
        eventually(|| slot.load().is_none());

        registry.unwatch(&slot).unwrap();
    }

    #[test]
    fn test_watch_is_weak() {
        let collector = Collector::with_min_interval(Duration::ZERO);
        let registry = ResetRegistry::new(Arc::clone(&collector));

        let slot: Arc<ArcSwapOption<String>> =
            Arc::new(ArcSwapOption::from_pointee("cached".to_string()));
        registry.watch(&slot).unwrap();

        let id_still_registered = registry.len() == 1;
        drop(slot);
        assert!(id_still_registered);

        // The dropped slot's action degrades to a no-op; the pass must not
        // panic or hang
        collector.collect(CycleReason::Manual);
        eventually(|| collector.completed_cycles() >= 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_double_watch_rejected() {
        let collector = Collector::with_min_interval(Duration::ZERO);
        let registry = ResetRegistry::new(collector);

        let slot: Arc<ArcSwapOption<u64>> = Arc::new(ArcSwapOption::from_pointee(7));
        registry.watch(&slot).unwrap();
        assert!(matches!(
            registry.watch(&slot),
            Err(RegistryError::AlreadyRegistered(_))
        ));
        registry.unwatch(&slot).unwrap();
        assert!(matches!(
            registry.unwatch(&slot),
            Err(RegistryError::NotRegistered(_))
        ));
    }
}
