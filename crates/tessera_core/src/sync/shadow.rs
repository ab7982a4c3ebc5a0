//! # Shadows
//!
//! Point-in-time copies of a store's buffers.
//!
//! ## Architecture
//!
//! ```text
//!        ┌──────────────────────┐   shadow("query")   ┌──────────────────┐
//!        │        Store         │ ──────────────────► │  Arc<Shadow>     │
//!        │  columns (live)      │   value copy of     │  columns (frozen)│
//!        │  shadows: key → Arc  │   buffers + pools   │  same windows    │
//!        └──────────────────────┘                     └──────────────────┘
//!                 │ writes                                  │ reads
//!                 ▼                                         ▼
//!            logic systems                      queries, serializers, diffing
//! ```
//!
//! A shadow shares no memory with its store. Later writes on either side
//! are invisible to the other, and readers holding the `Arc` need no lock.

use tessera_shared::PrimitiveType;

use crate::error::StorageResult;
use crate::memory::{Buffer, Element, Pool, Window};
use crate::store::{ArrayView, Columns, Field, Group};

/// An immutable snapshot of a store's buffers and windows.
#[derive(Debug, Clone, PartialEq)]
pub struct Shadow {
    /// Key the shadow was taken under.
    key: String,
    /// Frozen copy of the store's columns.
    columns: Columns,
}

impl Shadow {
    pub(crate) fn capture(key: String, columns: &Columns) -> Self {
        Self {
            key,
            columns: columns.clone(),
        }
    }

    /// Key the shadow was taken under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Capacity of the store at capture time.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.columns.capacity()
    }

    /// Root of the field tree.
    #[must_use]
    pub fn fields(&self) -> &Group {
        self.columns.root()
    }

    /// Field at a dotted path.
    ///
    /// # Errors
    ///
    /// `FieldNotFound` if no field lives at `path`.
    pub fn field(&self, path: &str) -> StorageResult<&Field> {
        self.columns.field(path)
    }

    /// Column of a scalar field.
    ///
    /// # Errors
    ///
    /// Same as [`Store::scalar`](crate::Store::scalar).
    pub fn scalar<T: Element>(&self, path: &str) -> StorageResult<&[T]> {
        self.columns.scalar(path)
    }

    /// Windows of an array field.
    ///
    /// # Errors
    ///
    /// Same as [`Store::array`](crate::Store::array).
    pub fn array<T: Element>(&self, path: &str) -> StorageResult<ArrayView<'_, T>> {
        self.columns.array(path)
    }

    /// Window of entity `eid` in an array field.
    ///
    /// # Errors
    ///
    /// Same as [`Store::window`](crate::Store::window).
    pub fn window(&self, path: &str, eid: usize) -> StorageResult<Window> {
        self.columns.window(path, eid)
    }

    /// Pool backing the array fields of `ty`.
    #[must_use]
    pub fn pool(&self, ty: PrimitiveType) -> Option<&Pool> {
        self.columns.pools().pool(ty)
    }

    /// Every raw buffer, in the same order as the store's.
    pub fn flat_buffers(&self) -> impl Iterator<Item = &Buffer> {
        self.columns.flat_buffers()
    }

    /// Total size of the copied buffers in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.flat_buffers().map(Buffer::byte_len).sum()
    }
}
