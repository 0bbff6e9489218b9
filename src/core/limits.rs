/*!
 * Limits and Constants
 *
 * Centralized location for crate-wide capacities, intervals, and thresholds.
 * All values include rationale comments explaining WHY they exist.
 */

use std::time::Duration;

/// Capacity of a subscriber's signal queue (1 token)
/// One unread token is enough: consumers only learn "at least one cycle
/// happened since the last receive", never how many
pub const SIGNAL_QUEUE_CAPACITY: usize = 1;

/// Default heap supervisor poll interval (250ms)
/// Frequent enough to catch pressure ramps, cheap enough to idle on
pub const SUPERVISOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Minimum time between threshold-forced cycles (5 seconds)
/// Keeps a heap gauge hovering just above the soft bound from forcing
/// back-to-back cycles
pub const MIN_CYCLE_INTERVAL: Duration = Duration::from_secs(5);

/// Environment variable holding the heap band as `"<low>:<high>"`
pub const HEAP_BAND_ENV: &str = "MEMSHED_HEAP_BAND";
