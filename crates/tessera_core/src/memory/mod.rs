//! # Memory Management
//!
//! Typed buffers and the per-type pools array fields are carved from.
//!
//! ## Design Philosophy
//!
//! All memory for a store is allocated when the store is compiled or grown:
//! - Reading or writing a field never allocates
//! - Every buffer is contiguous and zero-initialized
//! - Pool lengths are rounded to [`tessera_shared::POOL_ALIGNMENT`]

mod buffer;
mod pool;

pub use buffer::{check_column_len, Buffer, Element};
pub use pool::{pool_len, round_to_multiple, Carved, IndexWidth, Pool, PoolSet, Window};
