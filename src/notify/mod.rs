/*!
 * Cycle Notifications
 * Self-re-arming engine and coalescing subscriber channel
 */

mod notifier;
mod rearm;

pub use notifier::CycleNotifier;
pub use rearm::{after_cycle, StopGuard};
