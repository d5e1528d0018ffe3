//! # binarray Configuration Constants
//!
//! This module centralizes the numeric limits of the binary format and the
//! characters of the textual grammar. Values that must agree with each other
//! are co-located and checked at compile time.
//!
//! ## Dependency Graph
//!
//! ```text
//! FLAGS byte layout
//!       │
//!       ├─> COUNT_SIZING_SHIFT (bits 0-1)
//!       ├─> ITEM_SIZING_SHIFT  (bits 2-3)
//!       ├─> COMPACT_FLAG       (bit 4)
//!       ├─> COMPACT_WIDTH_SHIFT (bits 5-6)
//!       └─> FLAGS_RESERVED_MASK (bit 7, must be zero)
//!
//! ITEM_DELIMITER / OPEN_BRACKET / CLOSE_BRACKET / QUOTE
//!       │
//!       └─> must be pairwise distinct, otherwise Format output is ambiguous
//! ```
//!
//! ## Critical Invariants
//!
//! 1. The flag fields do not overlap and together cover the whole byte
//! 2. Grammar characters are pairwise distinct
//! 3. `MAX_RANK` fits a one-byte size encoding

// ============================================================================
// HEADER LAYOUT
// ============================================================================

/// Byte offset of the kind tag.
pub const KIND_OFFSET: usize = 0;

/// Byte offset of the flags byte.
pub const FLAGS_OFFSET: usize = 1;

/// Kind tag plus flags byte.
pub const PREAMBLE_SIZE: usize = 2;

/// Width of the codepage id stored by Text buffers.
pub const CODEPAGE_FIELD_SIZE: usize = 2;

pub const COUNT_SIZING_SHIFT: u8 = 0;
pub const ITEM_SIZING_SHIFT: u8 = 2;
pub const COMPACT_FLAG: u8 = 1 << 4;
pub const COMPACT_WIDTH_SHIFT: u8 = 5;
pub const SIZING_MASK: u8 = 0b11;
pub const FLAGS_RESERVED_MASK: u8 = 1 << 7;

const _: () = assert!(
    (SIZING_MASK << COUNT_SIZING_SHIFT).count_ones()
        + (SIZING_MASK << ITEM_SIZING_SHIFT).count_ones()
        + COMPACT_FLAG.count_ones()
        + (SIZING_MASK << COMPACT_WIDTH_SHIFT).count_ones()
        + FLAGS_RESERVED_MASK.count_ones()
        == 8,
    "flag fields must not overlap"
);

const _: () = assert!(
    (SIZING_MASK << COUNT_SIZING_SHIFT)
        | (SIZING_MASK << ITEM_SIZING_SHIFT)
        | COMPACT_FLAG
        | (SIZING_MASK << COMPACT_WIDTH_SHIFT)
        | FLAGS_RESERVED_MASK
        == 0xFF,
    "flag fields must cover the flags byte"
);

// ============================================================================
// SHAPE LIMITS
// ============================================================================

/// Maximum number of axes of a regular array.
pub const MAX_RANK: usize = 32;

const _: () = assert!(MAX_RANK <= u8::MAX as usize, "MAX_RANK must fit a 1-byte size encoding");

// ============================================================================
// TEXT GRAMMAR
// ============================================================================

pub const ITEM_DELIMITER: char = ',';
pub const QUOTE: char = '"';
pub const ESCAPE: char = '\\';
pub const OPEN_BRACKET: char = '[';
pub const CLOSE_BRACKET: char = ']';
pub const SHAPE_OPEN: char = '<';
pub const SHAPE_CLOSE: char = '>';
pub const RAW_HEX_PREFIX: &str = "0x";

const _: () = assert!(
    ITEM_DELIMITER != QUOTE
        && ITEM_DELIMITER != OPEN_BRACKET
        && ITEM_DELIMITER != CLOSE_BRACKET
        && QUOTE != OPEN_BRACKET
        && QUOTE != CLOSE_BRACKET
        && OPEN_BRACKET != CLOSE_BRACKET
        && QUOTE != ESCAPE,
    "grammar characters must be distinct"
);

// ============================================================================
// CODEPAGES
// ============================================================================

/// UTF-8, used when neither the policy nor the config names a codepage.
pub const DEFAULT_CODEPAGE_ID: u16 = 65001;
