/*!
 * memshed
 * Cooperative memory reclamation for long-running processes
 *
 * Consumers holding speculative memory (caches, pools, buffers) subscribe
 * for reclamation-cycle notifications and shed when convenient, instead of
 * imposing a hard capacity limit. Cycles are driven by application code or
 * by the heap-band supervisor; there is no guarantee a cycle ever runs.
 */

pub mod core;
pub mod cycle;
pub mod notify;
pub mod registry;
pub mod supervisor;
pub mod writer;

// Re-exports
pub use crate::core::{CycleId, RegistryError, RegistryResult, Size, SlotId};
pub use cycle::{Collector, CycleReason, CycleStats};
pub use notify::{after_cycle, CycleNotifier, StopGuard};
pub use registry::{register, unregister, unwatch, watch, ResetRegistry};
pub use supervisor::{HeapBand, Supervisor};
pub use writer::BufferingWriter;
