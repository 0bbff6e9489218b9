/*!
 * Heap Band
 * `"<low>:<high>"` heap budget configuration
 */

use crate::core::limits::HEAP_BAND_ENV;
use crate::core::types::Size;
use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

/// Heap budget band.
///
/// `lo` is the soft bound: gauge readings above it force a threshold cycle
/// once the cooldown allows. `hi` is the hard bound: readings above it force
/// a pressure cycle immediately. An unbounded side never triggers.
///
/// # Examples
///
/// ```
/// use memshed::HeapBand;
///
/// let band = HeapBand::parse("1048576:4194304");
/// assert_eq!(band.lo, Some(1048576));
/// assert_eq!(band.hi, Some(4194304));
///
/// // A bare number is both bounds; an empty side is unbounded
/// assert_eq!(HeapBand::parse("4096"), HeapBand { lo: Some(4096), hi: Some(4096) });
/// assert_eq!(HeapBand::parse(":4096"), HeapBand { lo: None, hi: Some(4096) });
/// assert_eq!(HeapBand::parse("not a band"), HeapBand::UNBOUNDED);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeapBand {
    pub lo: Option<Size>,
    pub hi: Option<Size>,
}

impl HeapBand {
    /// Band that never triggers
    pub const UNBOUNDED: HeapBand = HeapBand { lo: None, hi: None };

    /// Parse a `"<low>:<high>"` band.
    ///
    /// Either side may be empty, meaning no bound on that side; a bare
    /// number is both bounds. Empty, malformed, or inverted input yields the
    /// unbounded band rather than an error: a misconfigured budget must
    /// degrade to "no budget", not take the process down.
    pub fn parse(raw: &str) -> HeapBand {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::UNBOUNDED;
        }

        let mut parts = raw.splitn(2, ':');
        let lo_part = parts.next().unwrap_or("");
        let hi_part = parts.next();

        let Ok(lo) = parse_bound(lo_part) else {
            warn!("Malformed heap band {:?} ignored", raw);
            return Self::UNBOUNDED;
        };
        let hi = match hi_part {
            // Bare "N": both bounds
            None => lo,
            Some(part) => match parse_bound(part) {
                Ok(bound) => bound,
                Err(()) => {
                    warn!("Malformed heap band {:?} ignored", raw);
                    return Self::UNBOUNDED;
                }
            },
        };

        if let (Some(lo), Some(hi)) = (lo, hi) {
            if lo > hi {
                warn!("Inverted heap band {}:{} ignored", lo, hi);
                return Self::UNBOUNDED;
            }
        }
        HeapBand { lo, hi }
    }

    /// Load the band from `MEMSHED_HEAP_BAND`; absence means unbounded.
    pub fn from_env() -> HeapBand {
        match env::var(HEAP_BAND_ENV) {
            Ok(raw) => Self::parse(&raw),
            Err(_) => Self::UNBOUNDED,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.lo.is_none() && self.hi.is_none()
    }
}

impl fmt::Display for HeapBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lo {
            Some(lo) => write!(f, "{}", lo)?,
            None => {}
        }
        write!(f, ":")?;
        match self.hi {
            Some(hi) => write!(f, "{}", hi),
            None => Ok(()),
        }
    }
}

fn parse_bound(part: &str) -> Result<Option<Size>, ()> {
    if part.is_empty() {
        return Ok(None);
    }
    part.parse::<Size>().map(Some).map_err(|_| ())
}
