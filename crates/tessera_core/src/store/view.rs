//! Typed views over an array field's windows.

use std::slice::ChunksExactMut;

use super::columns::ArrayField;
use crate::memory::{Element, Window};

/// Read-only view of one array field, resolved against its pool.
#[derive(Debug)]
pub struct ArrayView<'a, T> {
    field: &'a ArrayField,
    pool: &'a [T],
}

impl<T> Clone for ArrayView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArrayView<'_, T> {}

impl<'a, T: Element> ArrayView<'a, T> {
    pub(crate) fn new(field: &'a ArrayField, pool: &'a [T]) -> Self {
        Self { field, pool }
    }

    /// Number of entities (one window each).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.field.windows.len()
    }

    /// Returns true if the store has zero capacity.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field.windows.is_empty()
    }

    /// Elements per entity.
    #[inline]
    #[must_use]
    pub fn length(&self) -> usize {
        self.field.length
    }

    /// Elements of entity `eid`.
    #[inline]
    #[must_use]
    pub fn get(&self, eid: usize) -> Option<&'a [T]> {
        let window = self.field.windows.get(eid)?;
        self.pool.get(window.range())
    }

    /// Window of entity `eid`.
    #[inline]
    #[must_use]
    pub fn window(&self, eid: usize) -> Option<Window> {
        self.field.window(eid)
    }

    /// Iterates entity slices in entity order.
    pub fn iter(&self) -> impl Iterator<Item = &'a [T]> + 'a {
        let pool = self.pool;
        self.field.windows.iter().map(move |w| &pool[w.range()])
    }

    /// The whole pool slice this field was carved from.
    #[must_use]
    pub fn parent(&self) -> &'a [T] {
        &self.pool[self.field.parent.clone()]
    }
}

/// Mutable view of one array field.
///
/// Windows of distinct entities never overlap, so [`entities_mut`] can hand
/// out every entity's slice at once for parallel writers.
///
/// [`entities_mut`]: ArrayViewMut::entities_mut
#[derive(Debug)]
pub struct ArrayViewMut<'a, T> {
    field: &'a ArrayField,
    pool: &'a mut [T],
}

impl<'a, T: Element> ArrayViewMut<'a, T> {
    pub(crate) fn new(field: &'a ArrayField, pool: &'a mut [T]) -> Self {
        Self { field, pool }
    }

    /// Number of entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.field.windows.len()
    }

    /// Returns true if the store has zero capacity.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field.windows.is_empty()
    }

    /// Elements per entity.
    #[inline]
    #[must_use]
    pub fn length(&self) -> usize {
        self.field.length
    }

    /// Elements of entity `eid`.
    #[inline]
    #[must_use]
    pub fn get(&self, eid: usize) -> Option<&[T]> {
        let window = self.field.windows.get(eid)?;
        self.pool.get(window.range())
    }

    /// Elements of entity `eid`, mutably.
    #[inline]
    pub fn get_mut(&mut self, eid: usize) -> Option<&mut [T]> {
        let window = self.field.windows.get(eid)?;
        self.pool.get_mut(window.range())
    }

    /// The whole pool slice this field was carved from.
    pub fn parent_mut(&mut self) -> &mut [T] {
        &mut self.pool[self.field.parent.clone()]
    }

    /// Every entity's slice, in entity order.
    pub fn entities_mut(&mut self) -> ChunksExactMut<'_, T> {
        let length = self.field.length;
        self.parent_mut().chunks_exact_mut(length)
    }
}
