/*!
 * Error Types
 * Registry error taxonomy with thiserror and serde support
 */

use super::types::SlotId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Registry errors
///
/// Every variant is a caller error reported synchronously to the offending
/// call; the notification path itself carries no payload and therefore no
/// error channel. A failed call leaves the slot table unchanged.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum RegistryError {
    #[error("Slot identity is empty")]
    InvalidIdentity,

    #[error("Slot {0} is already registered")]
    AlreadyRegistered(SlotId),

    #[error("Slot {0} is not registered")]
    NotRegistered(SlotId),
}
