//! # Item Type System
//!
//! This module defines what a buffer can hold and how text items are turned
//! into bytes.
//!
//! ## Module Structure
//!
//! - `kind`: The closed `PrimitiveKind` enumeration and natural widths
//! - `codepage`: The fixed codepage registry used by Text items
//! - `scalar`: `Timestamp` and `Guid` newtypes
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | `PrimitiveKind` | Kind tag written at byte 0 of every buffer |
//! | `Codepage` | Byte encoding of Text items |
//! | `Timestamp` | Microseconds since the Unix epoch |
//! | `Guid` | 16-byte identifier |

mod codepage;
mod kind;
mod scalar;

pub use codepage::Codepage;
pub use kind::PrimitiveKind;
pub use scalar::{Guid, Timestamp};
