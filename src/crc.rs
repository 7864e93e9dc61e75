//! Header CRCs.
//!
//! PFF uses the table-driven CRC-32 (reflected polynomial `0xEDB88320`)
//! with an initial value of zero and no final inversion.  That is the
//! standard CRC-32 register run without its pre- and post-complement, so
//! it is computed here with `crc32fast` seeded with `!0` and inverted once.
//!
//! | Field | Stored at | Covers | Variants |
//! |-------|-----------|--------|----------|
//! | `dwCRCPartial` | 4 | 471 bytes from offset 8 | all |
//! | `dwCRCFull` | 524 | 516 bytes from offset 8 | wide only |

use crc32fast::Hasher;
use serde::Serialize;

pub const PARTIAL_CRC_OFFSET: usize = 4;
pub const PARTIAL_CRC_START:  usize = 8;
pub const PARTIAL_CRC_LEN:    usize = 471;

pub const FULL_CRC_START: usize = 8;
pub const FULL_CRC_LEN:   usize = 516;

pub fn compute(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new_with_initial(!0);
    hasher.update(data);
    !hasher.finalize()
}

/// Stored value against the value recomputed from the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrcCheck {
    pub stored:   u32,
    pub computed: u32,
}

impl CrcCheck {
    pub fn is_valid(&self) -> bool {
        self.stored == self.computed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrcReport {
    pub partial: CrcCheck,
    pub full:    Option<CrcCheck>,
}

impl CrcReport {
    pub fn is_valid(&self) -> bool {
        self.partial.is_valid() && self.full.map_or(true, |c| c.is_valid())
    }

    /// First failing field, by name, in header order.
    pub fn first_mismatch(&self) -> Option<(&'static str, CrcCheck)> {
        if !self.partial.is_valid() {
            return Some(("dwCRCPartial", self.partial));
        }
        match self.full {
            Some(full) if !full.is_valid() => Some(("dwCRCFull", full)),
            _ => None,
        }
    }
}
