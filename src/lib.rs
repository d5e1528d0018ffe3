//! # binarray - Self-Describing Binary Collections and Regular Arrays
//!
//! binarray encodes two kinds of values as opaque, self-describing byte
//! buffers:
//!
//! - **Collections**: growable sequences of one primitive kind
//! - **Regular arrays**: fixed-rank rectangular arrays in row-major order
//!
//! Both support random access, copy-on-write editing without a full decode,
//! and a textual form that round-trips byte for byte.
//!
//! ## Quick Start
//!
//! ```rust
//! use binarray::{Collection, DimRange, Policy, RegularArray, SizeEncoding};
//!
//! let policy = Policy::new(SizeEncoding::One);
//! let names = Collection::<String>::parse(r#""ada", "grace""#, policy).unwrap();
//! let names = names.insert(None, &"linus".to_string()).unwrap();
//! assert_eq!(names.count(), 3);
//! assert_eq!(names.index_of(&"grace".to_string()).unwrap(), Some(1));
//!
//! let grid = RegularArray::<f64>::parse("[[1,2,3],[4,5,6]]", policy).unwrap();
//! assert_eq!(grid.dim_lengths(), &[2, 3]);
//! assert_eq!(grid.get_dim(&[1, 0]).unwrap(), 4.0);
//! let column = grid.get_dim_range(&[DimRange::full(), DimRange::new(2, 1)]).unwrap();
//! assert_eq!(column.to_vec().unwrap(), vec![3.0, 6.0]);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │   Collection<T>          RegularArray<T>     │  codec
//! ├──────────────────────────────────────────────┤
//! │   header preamble │ body layouts │ enumerate │  codec internals
//! ├──────────────────────────────────────────────┤
//! │   Item trait: 11 primitive kinds             │  codec::item
//! ├───────────────────────┬──────────────────────┤
//! │   size encoding       │   text grammar       │  encoding, parsing
//! ├───────────────────────┴──────────────────────┤
//! │   kinds, codepages, Timestamp, Guid          │  types
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Primitive Kinds
//!
//! | Rust type | Kind | Width |
//! |-----------|------|-------|
//! | `bool` | Boolean | 1 bit |
//! | `u8` | Byte | 1 |
//! | `i16` / `i32` / `i64` | Int16 / Int32 / Int64 | 2 / 4 / 8, or compact |
//! | `f32` / `f64` | Single / Double | 4 / 8 |
//! | [`Timestamp`] | Timestamp | 8 |
//! | [`Guid`] | Guid | 16 |
//! | `String` | Text | length-prefixed, codepage encoded |
//! | `Vec<u8>` | Raw | length-prefixed |
//!
//! ## Errors
//!
//! Every fallible operation returns `eyre::Result`. Failures callers may want
//! to tell apart carry a [`CodecError`], reachable with
//! `report.downcast_ref::<CodecError>()`.
//!
//! ## Module Overview
//!
//! - [`codec`]: Collection and regular array codecs, the `Item` trait
//! - [`encoding`]: Fixed-width size encoding of counts and lengths
//! - [`parsing`]: Text grammar and per-kind literals
//! - [`types`]: Primitive kinds, codepage registry, scalar newtypes
//! - [`config`]: Format constants and `CodecConfig`
//! - [`error`]: `CodecError`

pub mod codec;
pub mod config;
pub mod encoding;
pub mod error;
pub mod parsing;
pub mod types;

pub use codec::{
    Collection, DimIndex, DimRange, Enumerate, EnumerateDim, Item, Policy, RegularArray,
};
pub use config::CodecConfig;
pub use encoding::SizeEncoding;
pub use error::{codec_error, CodecError};
pub use types::{Codepage, Guid, PrimitiveKind, Timestamp};
