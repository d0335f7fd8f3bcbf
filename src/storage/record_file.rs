//! # Record File
//!
//! In-memory slotted storage for one table. Records live in fixed-capacity
//! blocks; a record's [`Rid`] is its `(block, slot)` position and stays
//! valid until the record is deleted. Deleted slots are reused by later
//! inserts that scan forward from the cursor, the same way a slotted page
//! reuses free slots.
//!
//! ## Layout
//!
//! ```text
//! RecordFile
//!   block 0: [slot 0][slot 1]...[slot n-1]     n = block_size / slot_size
//!   block 1: [slot 0][slot 1]...
//!   ...
//! slot := None (free) | Some(values in schema order)
//! ```
//!
//! Block capacity is derived from the schema's slot size so that block
//! counts reported to the cost model match the storage actually used.

use crate::error::QueryError;
use crate::types::{Constant, FieldType, Rid, Schema};
use eyre::Result;

type Slot = Option<Vec<Constant>>;

#[derive(Debug)]
pub struct RecordFile {
    schema: Schema,
    slots_per_block: usize,
    blocks: Vec<Vec<Slot>>,
    live: usize,
    /// No block before this one has a free slot.
    free_hint: usize,
}

impl RecordFile {
    pub fn new(schema: Schema, block_size: usize) -> Self {
        let slots_per_block = (block_size / schema.slot_size()).max(1);
        Self {
            schema,
            slots_per_block,
            blocks: Vec::new(),
            live: 0,
            free_hint: 0,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn slots_per_block(&self) -> usize {
        self.slots_per_block
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn record_count(&self) -> usize {
        self.live
    }

    pub fn record(&self, rid: Rid) -> Option<&[Constant]> {
        self.blocks
            .get(rid.block as usize)
            .and_then(|b| b.get(rid.slot as usize))
            .and_then(|s| s.as_deref())
    }

    fn record_mut(&mut self, rid: Rid) -> Result<&mut Vec<Constant>> {
        self.blocks
            .get_mut(rid.block as usize)
            .and_then(|b| b.get_mut(rid.slot as usize))
            .and_then(|s| s.as_mut())
            .ok_or_else(|| {
                QueryError::InvalidRid {
                    block: rid.block,
                    slot: rid.slot,
                }
                .into()
            })
    }

    /// First used slot strictly after `after`, or from the start when
    /// `after` is `None`.
    pub fn next_used(&self, after: Option<Rid>) -> Option<Rid> {
        let mut pos = self.successor(after);
        while let Some(rid) = pos {
            if self.record(rid).is_some() {
                return Some(rid);
            }
            pos = self.successor(Some(rid));
        }
        None
    }

    fn successor(&self, after: Option<Rid>) -> Option<Rid> {
        let (block, slot) = match after {
            None => (0usize, 0usize),
            Some(rid) => {
                let next_slot = rid.slot as usize + 1;
                if next_slot < self.slots_per_block {
                    (rid.block as usize, next_slot)
                } else {
                    (rid.block as usize + 1, 0)
                }
            }
        };
        if block < self.blocks.len() {
            Some(Rid::new(block as u64, slot as u32))
        } else {
            None
        }
    }

    /// Claims the first free slot after `after` (appending a block when the
    /// file is full) and fills it with default values.
    ///
    /// Without a cursor the search starts at the first block that may still
    /// have room, so loading a table row by row stays linear.
    pub fn insert_after(&mut self, after: Option<Rid>) -> Rid {
        let mut pos = match after {
            Some(rid) => self.successor(Some(rid)),
            None if self.free_hint < self.blocks.len() => {
                Some(Rid::new(self.free_hint as u64, 0))
            }
            None => None,
        };
        while let Some(rid) = pos {
            if self.record(rid).is_none() {
                self.fill(rid);
                if after.is_none() {
                    self.free_hint = rid.block as usize;
                }
                return rid;
            }
            pos = self.successor(Some(rid));
        }
        self.blocks.push(vec![None; self.slots_per_block]);
        let rid = Rid::new((self.blocks.len() - 1) as u64, 0);
        self.fill(rid);
        if after.is_none() {
            self.free_hint = rid.block as usize;
        }
        rid
    }

    fn fill(&mut self, rid: Rid) {
        let defaults = self
            .schema
            .fields()
            .map(|f| match self.schema.field_type(f) {
                Ok(FieldType::Str(_)) => Constant::Str(String::new()),
                _ => Constant::Int(0),
            })
            .collect();
        self.blocks[rid.block as usize][rid.slot as usize] = Some(defaults);
        self.live += 1;
    }

    pub fn set(&mut self, rid: Rid, field: &str, value: Constant) -> Result<()> {
        self.schema.check_value(field, &value)?;
        let idx = self
            .schema
            .index_of(field)
            .ok_or_else(|| QueryError::FieldNotFound {
                field: field.to_string(),
            })?;
        self.record_mut(rid)?[idx] = value;
        Ok(())
    }

    pub fn delete(&mut self, rid: Rid) -> Result<()> {
        self.record_mut(rid)?;
        self.blocks[rid.block as usize][rid.slot as usize] = None;
        self.live -= 1;
        self.free_hint = self.free_hint.min(rid.block as usize);
        Ok(())
    }
}
