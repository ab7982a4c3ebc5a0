//! # Component Stores
//!
//! A [`Store`] is the realized form of one component schema: scalar fields
//! become columns of `capacity` elements, array fields become per-entity
//! windows into shared per-type pools, groups become nested fields addressed
//! by dotted paths (`"transform.position"`).
//!
//! ## Operations
//!
//! - compile: [`Store::compile`]
//! - grow: [`Store::grow`] (move-and-swap, never shrinks)
//! - reset: [`Store::reset_all`], [`Store::reset_entity`]
//! - shadow: [`Store::shadow`]
//!
//! Tag stores (empty schema) own no buffers, and every mutating operation
//! on them is a no-op.
//!
//! ## Data access
//!
//! Structural operations need `&mut Store`. Data access hands out plain
//! slices, so writers on disjoint entities can split them and run in
//! parallel:
//!
//! ```rust,ignore
//! let mut positions = store.array_mut::<f32>("position")?;
//! std::thread::scope(|s| {
//!     for chunk in positions.entities_mut() {
//!         s.spawn(move || chunk.fill(1.0));
//!     }
//! });
//! ```

mod columns;
mod compile;
mod grow;
mod reset;
mod view;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use tessera_shared::PrimitiveType;
use tracing::debug;

pub(crate) use columns::Columns;
pub use columns::{ArrayField, Field, Group, ScalarField};
pub use view::{ArrayView, ArrayViewMut};

use crate::error::{StorageError, StorageResult};
use crate::memory::{Buffer, Element, Pool, Window};
use crate::registry::StoreHandle;
use crate::schema::Schema;
use crate::sync::Shadow;

/// The buffer set of one component type, sized for `capacity` entities.
#[derive(Debug)]
pub struct Store {
    /// Registry key, minted at compile time.
    handle: StoreHandle,
    /// Owned copy of the schema this store was compiled from.
    schema: Schema,
    /// True if compiled from an empty schema.
    is_tag: bool,
    /// Live buffers.
    columns: Columns,
    /// Snapshots by key.
    shadows: HashMap<String, Arc<Shadow>>,
}

impl Store {
    /// Compiles `schema` into a store of `capacity` zeroed entities.
    ///
    /// # Errors
    ///
    /// - `InvalidFieldLength` for a zero-length array field, or one whose
    ///   pool would be too large to allocate at `capacity`
    /// - `CapacityViolation` if a scalar column cannot hold `capacity`
    ///   elements
    /// - `InvalidSchema` for an empty or dotted field name
    pub fn compile(schema: &Schema, capacity: usize) -> StorageResult<Self> {
        let columns = Columns::compile(schema, capacity)?;
        let store = Self {
            handle: StoreHandle::mint(),
            schema: schema.clone(),
            is_tag: schema.is_tag(),
            columns,
            shadows: HashMap::new(),
        };

        debug!(
            target: "tessera::store",
            handle = %store.handle,
            capacity,
            tag = store.is_tag,
            scalars = store.columns.scalar_count(),
            pools = store.columns.pools().len(),
            "compiled store"
        );
        Ok(store)
    }

    /// Registry key of this store.
    #[inline]
    #[must_use]
    pub const fn handle(&self) -> StoreHandle {
        self.handle
    }

    /// Maximum number of entities.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.columns.capacity()
    }

    /// Returns true for a tag store.
    #[inline]
    #[must_use]
    pub const fn is_tag(&self) -> bool {
        self.is_tag
    }

    /// The schema this store was compiled from.
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Root of the field tree.
    #[inline]
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
    /// `FieldNotFound`, `FieldKindMismatch` if the field is not a scalar,
    /// `TypeMismatch` if `T` does not match its primitive type.
    pub fn scalar<T: Element>(&self, path: &str) -> StorageResult<&[T]> {
        self.columns.scalar(path)
    }

    /// Column of a scalar field, mutably.
    ///
    /// # Errors
    ///
    /// Same as [`Store::scalar`].
    pub fn scalar_mut<T: Element>(&mut self, path: &str) -> StorageResult<&mut [T]> {
        self.columns.scalar_mut(path)
    }

    /// Windows of an array field.
    ///
    /// # Errors
    ///
    /// `FieldNotFound`, `FieldKindMismatch` if the field is not an array,
    /// `TypeMismatch` if `T` does not match its primitive type.
    pub fn array<T: Element>(&self, path: &str) -> StorageResult<ArrayView<'_, T>> {
        self.columns.array(path)
    }

    /// Windows of an array field, mutably.
    ///
    /// # Errors
    ///
    /// Same as [`Store::array`].
    pub fn array_mut<T: Element>(&mut self, path: &str) -> StorageResult<ArrayViewMut<'_, T>> {
        self.columns.array_mut(path)
    }

    /// Window of entity `eid` in an array field.
    ///
    /// # Errors
    ///
    /// `FieldNotFound`, `FieldKindMismatch`, or `EntityOutOfBounds`.
    pub fn window(&self, path: &str, eid: usize) -> StorageResult<Window> {
        self.columns.window(path, eid)
    }

    /// The whole pool slice an array field was carved from.
    ///
    /// # Errors
    ///
    /// Same as [`Store::array`].
    pub fn parent_slice<T: Element>(&self, path: &str) -> StorageResult<&[T]> {
        self.columns.parent_slice(path)
    }

    /// Pool backing the array fields of `ty`.
    #[must_use]
    pub fn pool(&self, ty: PrimitiveType) -> Option<&Pool> {
        self.columns.pools().pool(ty)
    }

    /// Next free element of the `ty` pool.
    #[must_use]
    pub fn cursor(&self, ty: PrimitiveType) -> usize {
        self.columns.pools().cursor(ty)
    }

    /// Number of array fields of `ty`.
    #[must_use]
    pub fn array_field_count(&self, ty: PrimitiveType) -> usize {
        self.columns.pools().array_field_count(ty)
    }

    /// Every raw buffer: scalar columns in compile order, then pools in
    /// type order.
    pub fn flat_buffers(&self) -> impl Iterator<Item = &Buffer> {
        self.columns.flat_buffers()
    }

    /// Grows the store to `new_capacity` entities.
    ///
    /// Existing entities keep their data; new entities read zero. Growing
    /// to the current capacity does nothing.
    ///
    /// # Errors
    ///
    /// `CapacityViolation` if `new_capacity` is below the current capacity
    /// or too large for a scalar column, `InvalidFieldLength` if a pool
    /// would be too large to allocate. The store is unchanged on error.
    pub fn grow(&mut self, new_capacity: usize) -> StorageResult<()> {
        if self.is_tag {
            return Ok(());
        }

        let current = self.capacity();
        match new_capacity.cmp(&current) {
            Ordering::Less => Err(StorageError::CapacityViolation {
                current,
                requested: new_capacity,
            }),
            Ordering::Equal => Ok(()),
            Ordering::Greater => {
                let staged = self.columns.grown(new_capacity)?;
                self.columns = staged;
                debug!(
                    target: "tessera::store",
                    handle = %self.handle,
                    from = current,
                    to = new_capacity,
                    "grew store"
                );
                Ok(())
            }
        }
    }

    /// Zeroes every buffer and pool.
    pub fn reset_all(&mut self) {
        if !self.is_tag {
            self.columns.reset_all();
        }
    }

    /// Zeroes entity `eid` across every field.
    ///
    /// # Errors
    ///
    /// `EntityOutOfBounds` if `eid >= capacity` (tag stores accept any
    /// `eid`).
    pub fn reset_entity(&mut self, eid: usize) -> StorageResult<()> {
        if self.is_tag {
            return Ok(());
        }
        self.columns.reset_entity(eid)
    }

    /// Takes a snapshot of every buffer and stores it under `key`,
    /// replacing any earlier snapshot with the same key.
    pub fn shadow(&mut self, key: impl Into<String>) -> Arc<Shadow> {
        let key = key.into();
        let shadow = Arc::new(Shadow::capture(key.clone(), &self.columns));
        debug!(
            target: "tessera::store",
            handle = %self.handle,
            key = %key,
            bytes = shadow.byte_len(),
            "captured shadow"
        );
        self.shadows.insert(key, Arc::clone(&shadow));
        shadow
    }

    /// Snapshot stored under `key`.
    ///
    /// # Errors
    ///
    /// `ShadowNotFound` if no snapshot was taken under `key`.
    pub fn shadow_of(&self, key: &str) -> StorageResult<Arc<Shadow>> {
        self.shadows
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::ShadowNotFound(key.to_string()))
    }

    /// Removes and returns the snapshot stored under `key`.
    ///
    /// # Errors
    ///
    /// `ShadowNotFound` if no snapshot was taken under `key`.
    pub fn drop_shadow(&mut self, key: &str) -> StorageResult<Arc<Shadow>> {
        self.shadows
            .remove(key)
            .ok_or_else(|| StorageError::ShadowNotFound(key.to_string()))
    }

    /// Keys of every stored snapshot, sorted.
    #[must_use]
    pub fn shadow_keys(&self) -> Vec<&str> {
        let mut keys: Vec<_> = self.shadows.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
