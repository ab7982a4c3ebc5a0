//! # Backing Pools
//!
//! One shared buffer per primitive type, carved into per-entity windows.
//!
//! ```text
//! f32 pool (capacity 4, position: [f32; 3], scale: [f32; 2]):
//!
//! | p0 p0 p0 | p1 p1 p1 | p2 p2 p2 | p3 p3 p3 | s0 s0 | s1 s1 | s2 s2 | s3 s3 |
//! ^ cursor 0                                  ^ cursor 12                     ^ cursor 20
//! ```
//!
//! The cursor is a bump pointer: it only ever advances, and a full re-carve
//! resets it to 0 before any new window is issued. Two windows carved from
//! the same pool therefore never overlap.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::ops::Range;

use tessera_shared::{PrimitiveType, POOL_ALIGNMENT, UNSIGNED_MAX_U16, UNSIGNED_MAX_U8};
use tracing::trace;

use super::buffer::Buffer;
use crate::error::{StorageError, StorageResult};
use crate::schema::ArrayCensus;

/// Rounds `x` up to the next multiple of `mul`.
#[inline]
#[must_use]
pub const fn round_to_multiple(x: usize, mul: usize) -> usize {
    x.div_ceil(mul) * mul
}

/// Number of elements a pool needs for `elements_per_entity` at `capacity`.
///
/// `None` if the count does not fit in a `usize`.
#[inline]
#[must_use]
pub const fn pool_len(elements_per_entity: usize, capacity: usize) -> Option<usize> {
    match elements_per_entity.checked_mul(capacity) {
        Some(n) => n.checked_next_multiple_of(POOL_ALIGNMENT),
        None => None,
    }
}

/// Narrowest unsigned type that can index into a window.
///
/// Recorded so a serializer can write window-relative offsets compactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexWidth {
    /// Offsets fit in 8 bits.
    U8,
    /// Offsets fit in 16 bits.
    U16,
    /// Offsets need 32 bits.
    U32,
}

impl IndexWidth {
    /// Picks the width for an array of `length` elements.
    #[must_use]
    pub const fn for_length(length: usize) -> Self {
        if length as u64 <= UNSIGNED_MAX_U8 {
            Self::U8
        } else if length as u64 <= UNSIGNED_MAX_U16 {
            Self::U16
        } else {
            Self::U32
        }
    }

    /// The primitive type offsets are serialized as.
    #[must_use]
    pub const fn primitive_type(self) -> PrimitiveType {
        match self {
            Self::U8 => PrimitiveType::U8,
            Self::U16 => PrimitiveType::U16,
            Self::U32 => PrimitiveType::U32,
        }
    }

    /// Bytes per serialized offset.
    #[must_use]
    pub const fn bytes(self) -> usize {
        self.primitive_type().byte_width()
    }
}

/// One entity's slice of a pool: elements `[from, to)`.
///
/// A window does not own memory. It is resolved against the pool of its
/// field's type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Window {
    from: usize,
    to: usize,
    index_width: IndexWidth,
}

impl Window {
    /// Creates a window over `[from, to)`.
    #[must_use]
    pub const fn new(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            index_width: IndexWidth::for_length(to - from),
        }
    }

    /// First element (inclusive).
    #[inline]
    #[must_use]
    pub const fn from(&self) -> usize {
        self.from
    }

    /// Last element (exclusive).
    #[inline]
    #[must_use]
    pub const fn to(&self) -> usize {
        self.to
    }

    /// Number of elements.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.to - self.from
    }

    /// Returns true for a zero-length window.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.to == self.from
    }

    /// The window as a range into its pool.
    #[inline]
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.from..self.to
    }

    /// Compact index width for this window's offsets.
    #[inline]
    #[must_use]
    pub const fn index_width(&self) -> IndexWidth {
        self.index_width
    }

    /// Returns true if the two windows share any element.
    #[inline]
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.from < other.to && other.from < self.to
    }
}

/// Windows produced by one carve, plus the pool slice they cover.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Carved {
    /// One window per entity, indexed by entity.
    pub windows: Vec<Window>,
    /// The exact pool range `[start, end)` the windows were carved from.
    pub parent: Range<usize>,
}

/// Shared backing buffer for all array fields of one primitive type.
#[derive(Clone, Debug, PartialEq)]
pub struct Pool {
    /// The elements.
    buffer: Buffer,
    /// Next free element.
    cursor: usize,
    /// Index width of the first field carved from this pool.
    index_width: IndexWidth,
}

impl Pool {
    /// Allocates a zeroed pool of `len` elements.
    #[must_use]
    pub fn new(ty: PrimitiveType, len: usize, index_width: IndexWidth) -> Self {
        Self {
            buffer: Buffer::zeroed(ty, len),
            cursor: 0,
            index_width,
        }
    }

    /// Primitive type of the pool.
    #[inline]
    #[must_use]
    pub const fn primitive_type(&self) -> PrimitiveType {
        self.buffer.primitive_type()
    }

    /// Bytes per element.
    #[inline]
    #[must_use]
    pub const fn byte_width(&self) -> usize {
        self.primitive_type().byte_width()
    }

    /// Total elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if the pool has no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Next free element.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Elements not yet handed out.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.len() - self.cursor
    }

    /// Index width recorded when the pool was allocated.
    #[inline]
    #[must_use]
    pub const fn index_width(&self) -> IndexWidth {
        self.index_width
    }

    /// The backing buffer.
    #[inline]
    #[must_use]
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// The backing buffer, mutably.
    #[inline]
    pub fn buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffer
    }

    /// Bumps the cursor by `length * capacity`, one window per entity.
    ///
    /// # Errors
    ///
    /// `CapacityViolation` if the windows would run past the end of the pool.
    pub fn carve(&mut self, length: usize, capacity: usize) -> StorageResult<Carved> {
        let start = self.cursor;
        let end = length
            .checked_mul(capacity)
            .and_then(|n| start.checked_add(n))
            .unwrap_or(usize::MAX);
        if end > self.len() {
            return Err(StorageError::CapacityViolation {
                current: self.len(),
                requested: end,
            });
        }

        let windows = (0..capacity)
            .map(|eid| {
                let from = start + eid * length;
                Window::new(from, from + length)
            })
            .collect();

        self.cursor = end;

        Ok(Carved {
            windows,
            parent: start..end,
        })
    }
}

/// The per-type pools of one store, plus the census that sizes them.
///
/// Pools are allocated lazily, on the first carve of their type, but their
/// size always comes from the census of the whole schema.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoolSet {
    /// Pools by element type.
    pools: BTreeMap<PrimitiveType, Pool>,
    /// Array field counts and summed lengths by type.
    census: ArrayCensus,
    /// Entities every pool is sized for.
    capacity: usize,
}

impl PoolSet {
    /// Creates an empty pool set for a schema census at `capacity`.
    #[must_use]
    pub fn new(census: ArrayCensus, capacity: usize) -> Self {
        Self {
            pools: BTreeMap::new(),
            census,
            capacity,
        }
    }

    /// Entities every pool is sized for.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// The census the pools are sized from.
    #[inline]
    #[must_use]
    pub fn census(&self) -> &ArrayCensus {
        &self.census
    }

    /// Carves one window per entity for an array field.
    ///
    /// # Errors
    ///
    /// - `InvalidFieldLength` if `length` is zero, or if the pool for `ty`
    ///   would be too large to allocate at this capacity
    /// - `CapacityViolation` if the pool cannot hold the windows, which
    ///   means the field was not part of the census
    pub fn carve(&mut self, path: &str, ty: PrimitiveType, length: usize) -> StorageResult<Carved> {
        if length == 0 {
            return Err(StorageError::InvalidFieldLength {
                field: path.to_string(),
                length,
            });
        }

        let pool = match self.pools.entry(ty) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let len = pool_len(self.census.summed_length(ty), self.capacity)
                    .filter(|&len| len <= Buffer::max_len(ty))
                    .ok_or_else(|| StorageError::InvalidFieldLength {
                        field: path.to_string(),
                        length,
                    })?;
                trace!(target: "tessera::pool", ty = %ty, elements = len, "allocating pool");
                entry.insert(Pool::new(ty, len, IndexWidth::for_length(length)))
            }
        };

        let carved = pool.carve(length, self.capacity)?;
        trace!(
            target: "tessera::pool",
            field = path,
            ty = %ty,
            start = carved.parent.start,
            end = carved.parent.end,
            "carved array field"
        );
        Ok(carved)
    }

    /// Pool for `ty`, if any array field of that type was carved.
    #[inline]
    #[must_use]
    pub fn pool(&self, ty: PrimitiveType) -> Option<&Pool> {
        self.pools.get(&ty)
    }

    /// Pool for `ty`, mutably.
    #[inline]
    pub fn pool_mut(&mut self, ty: PrimitiveType) -> Option<&mut Pool> {
        self.pools.get_mut(&ty)
    }

    /// Cursor for `ty` (0 if nothing was carved).
    #[must_use]
    pub fn cursor(&self, ty: PrimitiveType) -> usize {
        self.pools.get(&ty).map_or(0, Pool::cursor)
    }

    /// Number of array fields of `ty` in the schema.
    #[must_use]
    pub fn array_field_count(&self, ty: PrimitiveType) -> usize {
        self.census.field_count(ty)
    }

    /// Number of allocated pools.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Returns true if no pool is allocated.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Iterates pools in type order.
    pub fn iter(&self) -> impl Iterator<Item = (PrimitiveType, &Pool)> {
        self.pools.iter().map(|(ty, pool)| (*ty, pool))
    }

    /// Zeroes every pool. Cursors are untouched.
    pub fn fill_zero(&mut self) {
        for pool in self.pools.values_mut() {
            pool.buffer.fill_zero();
        }
    }
}
