//! # Columns
//!
//! The realized buffer set of a store: the field tree, the scalar column
//! buffers it points into, and the per-type pools its array windows were
//! carved from.
//!
//! ```text
//! Field tree                 buffers            pools
//! ──────────                 ───────            ─────
//! health   Scalar(u16, #0) ─► [u16; cap]
//! position Array(f32, 3)  ─────────────────────► f32 [ p0 p0 p0 | p1 p1 p1 | ... ]
//! transform
//!   parent Scalar(eid, #1) ─► [u32; cap]
//! ```
//!
//! Fields hold indices and windows, never memory. Cloning a `Columns`
//! value-copies every buffer and pool while the windows keep their offsets.

use std::collections::BTreeMap;
use std::ops::Range;

use tessera_shared::PrimitiveType;

use super::view::{ArrayView, ArrayViewMut};
use crate::error::{StorageError, StorageResult};
use crate::memory::{Buffer, Element, IndexWidth, PoolSet, Window};

/// A scalar field: one element per entity in its own column buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScalarField {
    pub(crate) ty: PrimitiveType,
    pub(crate) buffer: usize,
}

impl ScalarField {
    /// Element type of the column.
    #[inline]
    #[must_use]
    pub const fn primitive_type(&self) -> PrimitiveType {
        self.ty
    }

    /// Returns true if the column holds entity identifiers.
    #[inline]
    #[must_use]
    pub const fn is_entity_ref(&self) -> bool {
        self.ty.is_entity_id()
    }

    /// Position of the column in the store's flat buffer list.
    #[inline]
    #[must_use]
    pub const fn buffer_index(&self) -> usize {
        self.buffer
    }
}

/// An array field: one fixed-length window per entity into a shared pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayField {
    pub(crate) ty: PrimitiveType,
    pub(crate) length: usize,
    pub(crate) windows: Vec<Window>,
    pub(crate) parent: Range<usize>,
}

impl ArrayField {
    /// Element type of the pool the windows live in.
    #[inline]
    #[must_use]
    pub const fn primitive_type(&self) -> PrimitiveType {
        self.ty
    }

    /// Returns true if the elements are entity identifiers.
    #[inline]
    #[must_use]
    pub const fn is_entity_ref(&self) -> bool {
        self.ty.is_entity_id()
    }

    /// Elements per entity.
    #[inline]
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Every window, indexed by entity.
    #[inline]
    #[must_use]
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    /// Window of one entity.
    #[inline]
    #[must_use]
    pub fn window(&self, eid: usize) -> Option<Window> {
        self.windows.get(eid).copied()
    }

    /// The pool slice `[start, end)` all windows were carved from.
    #[inline]
    #[must_use]
    pub fn parent_range(&self) -> Range<usize> {
        self.parent.clone()
    }

    /// Compact index width for offsets within one window.
    #[inline]
    #[must_use]
    pub const fn index_width(&self) -> IndexWidth {
        IndexWidth::for_length(self.length)
    }
}

/// A nested group of fields, in name order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Group {
    pub(crate) fields: BTreeMap<String, Field>,
}

impl Group {
    /// Looks up a direct child.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Iterates direct children in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Number of direct children.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the group has no children.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One node of a compiled store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Field {
    /// Column buffer, one element per entity.
    Scalar(ScalarField),
    /// Per-entity windows into a pool.
    Array(ArrayField),
    /// Nested fields.
    Group(Group),
}

impl Field {
    /// Short name of the field kind, for error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Array(_) => "array",
            Self::Group(_) => "group",
        }
    }

    /// Element type, for scalar and array fields.
    #[must_use]
    pub const fn primitive_type(&self) -> Option<PrimitiveType> {
        match self {
            Self::Scalar(field) => Some(field.ty),
            Self::Array(field) => Some(field.ty),
            Self::Group(_) => None,
        }
    }

    /// Returns true if the field holds entity identifiers.
    #[must_use]
    pub const fn is_entity_ref(&self) -> bool {
        match self.primitive_type() {
            Some(ty) => ty.is_entity_id(),
            None => false,
        }
    }

    /// The scalar field, if this is one.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&ScalarField> {
        match self {
            Self::Scalar(field) => Some(field),
            _ => None,
        }
    }

    /// The array field, if this is one.
    #[must_use]
    pub const fn as_array(&self) -> Option<&ArrayField> {
        match self {
            Self::Array(field) => Some(field),
            _ => None,
        }
    }

    /// The group, if this is one.
    #[must_use]
    pub const fn as_group(&self) -> Option<&Group> {
        match self {
            Self::Group(group) => Some(group),
            _ => None,
        }
    }
}

/// Walks a dotted path from `root`.
fn resolve<'a>(root: &'a Group, path: &str) -> StorageResult<&'a Field> {
    let mut segments = path.split('.');
    let not_found = || StorageError::FieldNotFound(path.to_string());

    let first = segments.next().ok_or_else(not_found)?;
    let mut field = root.get(first).ok_or_else(not_found)?;
    for segment in segments {
        let Field::Group(group) = field else {
            return Err(not_found());
        };
        field = group.get(segment).ok_or_else(not_found)?;
    }
    Ok(field)
}

fn resolve_scalar<'a>(root: &'a Group, path: &str) -> StorageResult<&'a ScalarField> {
    match resolve(root, path)? {
        Field::Scalar(field) => Ok(field),
        other => Err(kind_mismatch(path, "scalar", other)),
    }
}

fn resolve_array<'a>(root: &'a Group, path: &str) -> StorageResult<&'a ArrayField> {
    match resolve(root, path)? {
        Field::Array(field) => Ok(field),
        other => Err(kind_mismatch(path, "array", other)),
    }
}

fn kind_mismatch(path: &str, expected: &'static str, actual: &Field) -> StorageError {
    StorageError::FieldKindMismatch {
        path: path.to_string(),
        expected,
        actual: actual.kind(),
    }
}

fn type_mismatch<T: Element>(path: &str, actual: PrimitiveType) -> StorageError {
    StorageError::TypeMismatch {
        path: path.to_string(),
        expected: T::PRIMITIVE,
        actual,
    }
}

fn check_type<T: Element>(path: &str, actual: PrimitiveType) -> StorageResult<()> {
    if T::accepts(actual) {
        Ok(())
    } else {
        Err(type_mismatch::<T>(path, actual))
    }
}

/// Compiled buffer set of one store.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Columns {
    /// Field tree.
    pub(crate) root: Group,
    /// Scalar column buffers, in compile order.
    pub(crate) buffers: Vec<Buffer>,
    /// Array field pools.
    pub(crate) pools: PoolSet,
    /// Entities every buffer is sized for.
    pub(crate) capacity: usize,
}

impl Columns {
    /// A buffer set with no fields (tag stores).
    pub(crate) fn empty(capacity: usize) -> Self {
        Self {
            root: Group::default(),
            buffers: Vec::new(),
            pools: PoolSet::default(),
            capacity,
        }
    }

    pub(crate) const fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn root(&self) -> &Group {
        &self.root
    }

    pub(crate) fn pools(&self) -> &PoolSet {
        &self.pools
    }

    pub(crate) fn field(&self, path: &str) -> StorageResult<&Field> {
        resolve(&self.root, path)
    }

    pub(crate) fn scalar<T: Element>(&self, path: &str) -> StorageResult<&[T]> {
        let field = resolve_scalar(&self.root, path)?;
        check_type::<T>(path, field.ty)?;
        self.buffers
            .get(field.buffer)
            .and_then(Buffer::as_slice::<T>)
            .ok_or_else(|| type_mismatch::<T>(path, field.ty))
    }

    pub(crate) fn scalar_mut<T: Element>(&mut self, path: &str) -> StorageResult<&mut [T]> {
        let field = resolve_scalar(&self.root, path)?;
        check_type::<T>(path, field.ty)?;
        self.buffers
            .get_mut(field.buffer)
            .and_then(Buffer::as_mut_slice::<T>)
            .ok_or_else(|| type_mismatch::<T>(path, field.ty))
    }

    pub(crate) fn array<T: Element>(&self, path: &str) -> StorageResult<ArrayView<'_, T>> {
        let field = resolve_array(&self.root, path)?;
        check_type::<T>(path, field.ty)?;
        let pool = self
            .pools
            .pool(field.ty)
            .and_then(|pool| pool.buffer().as_slice::<T>())
            .ok_or_else(|| type_mismatch::<T>(path, field.ty))?;
        Ok(ArrayView::new(field, pool))
    }

    pub(crate) fn array_mut<T: Element>(&mut self, path: &str) -> StorageResult<ArrayViewMut<'_, T>> {
        let field = resolve_array(&self.root, path)?;
        check_type::<T>(path, field.ty)?;
        let pool = self
            .pools
            .pool_mut(field.ty)
            .and_then(|pool| pool.buffer_mut().as_mut_slice::<T>())
            .ok_or_else(|| type_mismatch::<T>(path, field.ty))?;
        Ok(ArrayViewMut::new(field, pool))
    }

    pub(crate) fn window(&self, path: &str, eid: usize) -> StorageResult<Window> {
        let field = resolve_array(&self.root, path)?;
        field.window(eid).ok_or(StorageError::EntityOutOfBounds {
            eid,
            capacity: self.capacity,
        })
    }

    pub(crate) fn parent_slice<T: Element>(&self, path: &str) -> StorageResult<&[T]> {
        Ok(self.array::<T>(path)?.parent())
    }

    /// Every scalar buffer in compile order, then every pool in type order.
    pub(crate) fn flat_buffers(&self) -> impl Iterator<Item = &Buffer> {
        self.buffers
            .iter()
            .chain(self.pools.iter().map(|(_, pool)| pool.buffer()))
    }

    pub(crate) fn scalar_count(&self) -> usize {
        self.buffers.len()
    }
}
