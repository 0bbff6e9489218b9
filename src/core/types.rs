/*!
 * Core Types
 * Common types used across the crate
 */

use smartstring::alias::String as SmartString;

/// Identifier of a reclamation cycle (monotonic, first cycle is 1)
pub type CycleId = u64;

/// Size type for memory accounting
pub type Size = usize;

/// Registry slot identity
///
/// Inline-optimized: identities up to 23 bytes (the common case for
/// address-derived ids) are stored without heap allocation.
pub type SlotId = SmartString;

/// Common result type for registry operations
pub type RegistryResult<T> = Result<T, super::errors::RegistryError>;
