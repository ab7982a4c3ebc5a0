//! # Layout Constants
//!
//! Values baked into every buffer layout. Readers that map a store's
//! buffers from shared memory must agree on them.

/// Largest value of an unsigned 8-bit element.
pub const UNSIGNED_MAX_U8: u64 = u8::MAX as u64;

/// Largest value of an unsigned 16-bit element.
pub const UNSIGNED_MAX_U16: u64 = u16::MAX as u64;

/// Largest value of an unsigned 32-bit element.
pub const UNSIGNED_MAX_U32: u64 = u32::MAX as u64;

/// Pool lengths (in elements) are rounded up to a multiple of this.
///
/// Keeps every pool a whole number of 4-element lanes so a pool can later be
/// placed in shared memory or walked with 128-bit SIMD loads.
pub const POOL_ALIGNMENT: usize = 4;
