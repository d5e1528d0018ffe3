//! # Encoding Module
//!
//! This module provides the fixed-width size encodings used by every binarray
//! buffer header:
//!
//! - **Size encoding**: 1, 2, 4 or 8 byte little-endian counts, indices,
//!   lengths and dimension extents, chosen once per buffer

pub mod sizing;

pub use sizing::{decode_size, encode_size, write_size, SizeEncoding};
