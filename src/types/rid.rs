use std::fmt;

/// Stable address of a record inside its table's record file.
///
/// Rids are plain `(block, slot)` offsets rather than references, so an
/// operator can remember where a row lives and come back to it later with
/// [`UpdateScan::move_to_rid`](crate::query::UpdateScan::move_to_rid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rid {
    pub block: u64,
    pub slot: u32,
}

impl Rid {
    pub fn new(block: u64, slot: u32) -> Self {
        Self { block, slot }
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.block, self.slot)
    }
}
