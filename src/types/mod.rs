//! # Value and Schema Types
//!
//! ## Module Structure
//!
//! - `value`: [`Constant`], the integer-or-string scalar with checked ordering
//! - `schema`: [`Schema`] and [`FieldType`]
//! - `rid`: [`Rid`], the `(block, slot)` record address
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | `Constant` | Field value read from or written to a scan |
//! | `FieldType` | Int or bounded string |
//! | `Schema` | Ordered, uniquely named fields of a plan |
//! | `Rid` | Dereferenceable address of a stored record |

mod rid;
mod schema;
mod value;

pub use rid::Rid;
pub use schema::{FieldType, Schema};
pub use value::Constant;
