/*!
 * Pointer Reset Registry
 * Process-wide fanout of cycle notifications to reset slots
 */

mod pointer;
mod table;

pub use table::{ResetFn, ResetRegistry};

use crate::core::types::{RegistryResult, SlotId};
use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// Register a reset action with the global registry.
pub fn register<F>(id: impl Into<SlotId>, reset: F) -> RegistryResult<()>
where
    F: Fn() + Send + 'static,
{
    ResetRegistry::global().register(id, reset)
}

/// Remove a reset action from the global registry.
pub fn unregister(id: impl Into<SlotId>) -> RegistryResult<()> {
    ResetRegistry::global().unregister(id)
}

/// Watch `slot` on the global registry: it is cleared after every cycle.
pub fn watch<T>(slot: &Arc<ArcSwapOption<T>>) -> RegistryResult<()>
where
    T: Send + Sync + 'static,
{
    ResetRegistry::global().watch(slot)
}

/// Stop watching `slot` on the global registry.
pub fn unwatch<T>(slot: &Arc<ArcSwapOption<T>>) -> RegistryResult<()>
where
    T: Send + Sync + 'static,
{
    ResetRegistry::global().unwatch(slot)
}
