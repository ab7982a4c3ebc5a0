//! # TESSERA Shared
//!
//! The primitive type table consumed by the storage engine.
//!
//! Every component field is declared with one of the [`PrimitiveType`] tags.
//! The table answers the only questions the allocator asks of a type:
//! how many bytes one element takes and, for unsigned types, the largest
//! representable value.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod types;

pub use constants::{POOL_ALIGNMENT, UNSIGNED_MAX_U16, UNSIGNED_MAX_U32, UNSIGNED_MAX_U8};
pub use types::{ParsePrimitiveTypeError, PrimitiveType};
