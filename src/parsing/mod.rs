//! # Text Bridge
//!
//! Conversion between the textual notation of collections and regular arrays
//! and the values their items hold.
//!
//! ## Module Structure
//!
//! - `text`: Delimiters, quoting, nesting and the shape prefix
//! - `literal`: Per-kind literal grammar (booleans, numbers, timestamps,
//!   guids, hex blobs, quoted text)
//!
//! ```ignore
//! use binarray::parsing::text::split_items;
//! use binarray::parsing::literal::parse_timestamp;
//!
//! let tokens = split_items(r#"1, "two", 3"#)?;
//! let micros = parse_timestamp("2024-02-29T12:00:00.5")?;
//! ```
//!
//! ## Error Handling
//!
//! Grammar violations are reported as `CodecError::ParseError` with the
//! offending position or token in the message.

pub mod literal;
pub mod text;

pub use text::{NestedText, Node, Token};
