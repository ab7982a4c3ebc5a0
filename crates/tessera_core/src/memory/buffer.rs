//! # Typed Buffers
//!
//! A [`Buffer`] is one contiguous, zero-initialized allocation of a single
//! primitive type. Scalar columns and backing pools are both buffers.
//!
//! The element type is erased at the buffer level so a store can keep
//! columns of different types side by side; [`Element`] recovers a typed
//! slice when the caller names a matching Rust type.

use std::fmt;
use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use tessera_shared::PrimitiveType;

use crate::error::{StorageError, StorageResult};

/// Type-erased element storage. One variant per distinct Rust representation.
#[derive(Clone, PartialEq)]
enum Data {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// Runs `$body` with `$v` bound to the inner vector, whatever its type.
macro_rules! dispatch {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            Data::I8($v) => $body,
            Data::U8($v) => $body,
            Data::I16($v) => $body,
            Data::U16($v) => $body,
            Data::I32($v) => $body,
            Data::U32($v) => $body,
            Data::F32($v) => $body,
            Data::F64($v) => $body,
        }
    };
}

/// Like `dispatch!`, but wraps the vector produced by `$body` back into
/// the same variant.
macro_rules! map_data {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            Data::I8($v) => Data::I8($body),
            Data::U8($v) => Data::U8($body),
            Data::I16($v) => Data::I16($body),
            Data::U16($v) => Data::U16($body),
            Data::I32($v) => Data::I32($body),
            Data::U32($v) => Data::U32($body),
            Data::F32($v) => Data::F32($body),
            Data::F64($v) => Data::F64($body),
        }
    };
}

/// Pairs two buffers of the same representation; `$mismatch` otherwise.
macro_rules! zip_data {
    ($dst:expr, $src:expr, $d:ident, $s:ident => $body:expr, else $mismatch:expr) => {
        match ($dst, $src) {
            (Data::I8($d), Data::I8($s)) => $body,
            (Data::U8($d), Data::U8($s)) => $body,
            (Data::I16($d), Data::I16($s)) => $body,
            (Data::U16($d), Data::U16($s)) => $body,
            (Data::I32($d), Data::I32($s)) => $body,
            (Data::U32($d), Data::U32($s)) => $body,
            (Data::F32($d), Data::F32($s)) => $body,
            (Data::F64($d), Data::F64($s)) => $body,
            _ => $mismatch,
        }
    };
}

impl Data {
    fn zeroed(ty: PrimitiveType, len: usize) -> Self {
        match ty {
            PrimitiveType::I8 => Self::I8(vec![0; len]),
            PrimitiveType::U8 | PrimitiveType::U8Clamped => Self::U8(vec![0; len]),
            PrimitiveType::I16 => Self::I16(vec![0; len]),
            PrimitiveType::U16 => Self::U16(vec![0; len]),
            PrimitiveType::I32 => Self::I32(vec![0; len]),
            PrimitiveType::U32 | PrimitiveType::Eid => Self::U32(vec![0; len]),
            PrimitiveType::F32 => Self::F32(vec![0.0; len]),
            PrimitiveType::F64 => Self::F64(vec![0.0; len]),
        }
    }
}

/// Checks a column of `ty` can hold `capacity` elements.
///
/// # Errors
///
/// `CapacityViolation` if the column would exceed [`Buffer::max_len`].
pub fn check_column_len(ty: PrimitiveType, capacity: usize) -> StorageResult<()> {
    let max = Buffer::max_len(ty);
    if capacity > max {
        return Err(StorageError::CapacityViolation {
            current: max,
            requested: capacity,
        });
    }
    Ok(())
}

/// A fixed-length, owning, zero-initialized buffer of one primitive type.
///
/// Length never changes in place. Growth produces a new buffer through
/// [`Buffer::resized`], which the caller swaps in once everything else is
/// staged.
#[derive(Clone, PartialEq)]
pub struct Buffer {
    /// Declared primitive type (distinguishes `u8` from `u8c`, `u32` from `eid`).
    ty: PrimitiveType,
    /// The elements.
    data: Data,
}

impl Buffer {
    /// Largest element count a buffer of `ty` can be allocated with.
    #[inline]
    #[must_use]
    pub const fn max_len(ty: PrimitiveType) -> usize {
        isize::MAX as usize / ty.byte_width()
    }

    /// Allocates `len` zeroed elements of `ty`.
    #[must_use]
    pub fn zeroed(ty: PrimitiveType, len: usize) -> Self {
        Self {
            ty,
            data: Data::zeroed(ty, len),
        }
    }

    /// Returns the declared primitive type.
    #[inline]
    #[must_use]
    pub const fn primitive_type(&self) -> PrimitiveType {
        self.ty
    }

    /// Returns true if this buffer holds entity identifiers.
    #[inline]
    #[must_use]
    pub const fn is_entity_ref(&self) -> bool {
        self.ty.is_entity_id()
    }

    /// Number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        dispatch!(&self.data, v => v.len())
    }

    /// Returns true if the buffer holds no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the buffer in bytes.
    #[inline]
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.len() * self.ty.byte_width()
    }

    /// Returns a new buffer of `len` elements holding this buffer's prefix.
    ///
    /// Elements past the old length are zero. If `len` is shorter, the tail
    /// is dropped.
    #[must_use]
    pub fn resized(&self, len: usize) -> Self {
        let data = map_data!(&self.data, v => {
            let keep = v.len().min(len);
            let mut out = Vec::with_capacity(len);
            out.extend_from_slice(&v[..keep]);
            out.resize(len, Default::default());
            out
        });
        Self { ty: self.ty, data }
    }

    /// Sets every element to zero.
    pub fn fill_zero(&mut self) {
        dispatch!(&mut self.data, v => v.fill(Default::default()));
    }

    /// Sets the elements in `range` to zero.
    ///
    /// # Panics
    ///
    /// Panics if `range` is out of bounds.
    pub fn zero_range(&mut self, range: Range<usize>) {
        dispatch!(&mut self.data, v => v[range].fill(Default::default()));
    }

    /// Copies `src[src_range]` into this buffer starting at `dst_start`.
    ///
    /// Nothing is copied on error.
    ///
    /// # Errors
    ///
    /// - `BufferMismatch` if the two buffers do not share a representation
    /// - `CapacityViolation` if either range runs past the end of its buffer
    pub fn copy_from(&mut self, src: &Buffer, src_range: Range<usize>, dst_start: usize) -> StorageResult<()> {
        if src_range.start > src_range.end || src_range.end > src.len() {
            return Err(StorageError::CapacityViolation {
                current: src.len(),
                requested: src_range.end,
            });
        }
        let dst_end = dst_start
            .checked_add(src_range.len())
            .filter(|&end| end <= self.len())
            .ok_or_else(|| StorageError::CapacityViolation {
                current: self.len(),
                requested: dst_start.saturating_add(src_range.len()),
            })?;

        let (dst_ty, src_ty) = (self.ty, src.ty);
        zip_data!(&mut self.data, &src.data, d, s => {
            d[dst_start..dst_end].copy_from_slice(&s[src_range]);
            Ok(())
        }, else Err(StorageError::BufferMismatch { dst: dst_ty, src: src_ty }))
    }

    /// Raw little-endian bytes of the buffer.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        dispatch!(&self.data, v => bytemuck::cast_slice(v.as_slice()))
    }

    /// Mutable raw bytes of the buffer.
    #[must_use]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        dispatch!(&mut self.data, v => bytemuck::cast_slice_mut(v.as_mut_slice()))
    }

    /// Typed view, if `T` matches the declared type.
    #[inline]
    #[must_use]
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        if T::accepts(self.ty) {
            T::view(self)
        } else {
            None
        }
    }

    /// Typed mutable view, if `T` matches the declared type.
    #[inline]
    #[must_use]
    pub fn as_mut_slice<T: Element>(&mut self) -> Option<&mut [T]> {
        if T::accepts(self.ty) {
            T::view_mut(self)
        } else {
            None
        }
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("ty", &self.ty)
            .field("len", &self.len())
            .finish()
    }
}

/// Rust element types that can view a [`Buffer`].
///
/// Elements must be:
/// - `Pod`: plain old data, safe to view as bytes
/// - `Zeroable`: all-zero is a valid value (fresh and reset slots)
/// - `Default`: the default is the zero value
///
/// `u8` serves both `u8` and `u8c` fields, `u32` serves both `u32` and
/// `eid` fields.
pub trait Element: Pod + Zeroable + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// The primitive type this element is named after.
    const PRIMITIVE: PrimitiveType;

    /// Returns true if a field of type `ty` can be viewed as `Self`.
    fn accepts(ty: PrimitiveType) -> bool;

    #[doc(hidden)]
    fn view(buffer: &Buffer) -> Option<&[Self]>;

    #[doc(hidden)]
    fn view_mut(buffer: &mut Buffer) -> Option<&mut [Self]>;
}

macro_rules! impl_element {
    ($t:ty, $variant:ident, $primitive:ident $(| $also:ident)*) => {
        impl Element for $t {
            const PRIMITIVE: PrimitiveType = PrimitiveType::$primitive;

            #[inline]
            fn accepts(ty: PrimitiveType) -> bool {
                matches!(ty, PrimitiveType::$primitive $(| PrimitiveType::$also)*)
            }

            #[inline]
            fn view(buffer: &Buffer) -> Option<&[Self]> {
                match &buffer.data {
                    Data::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }

            #[inline]
            fn view_mut(buffer: &mut Buffer) -> Option<&mut [Self]> {
                match &mut buffer.data {
                    Data::$variant(v) => Some(v.as_mut_slice()),
                    _ => None,
                }
            }
        }
    };
}

impl_element!(i8, I8, I8);
impl_element!(u8, U8, U8 | U8Clamped);
impl_element!(i16, I16, I16);
impl_element!(u16, U16, U16);
impl_element!(i32, I32, I32);
impl_element!(u32, U32, U32 | Eid);
impl_element!(f32, F32, F32);
impl_element!(f64, F64, F64);
