//! # Storage Error Types
//!
//! All errors that can occur while building or mutating a store.
//! These are schema or programmer errors, never transient conditions.

use tessera_shared::PrimitiveType;
use thiserror::Error;

use crate::registry::StoreHandle;

/// Errors that can occur in the storage engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The schema names a type that is not in the primitive type table.
    #[error("unknown primitive type: {0}")]
    UnknownPrimitiveType(String),

    /// An array field was declared with a zero length.
    #[error("invalid length {length} for array field {field}")]
    InvalidFieldLength {
        /// Path of the offending field.
        field: String,
        /// The declared length.
        length: usize,
    },

    /// The handle was released or never issued by this registry.
    #[error("invalid store handle: {0}")]
    InvalidHandle(StoreHandle),

    /// The requested capacity is below the current one or above the ceiling.
    #[error("capacity violation: current {current}, requested {requested}")]
    CapacityViolation {
        /// Capacity the store has now (or the configured ceiling).
        current: usize,
        /// Capacity that was asked for.
        requested: usize,
    },

    /// A non-empty schema produced no fields.
    #[error("schema has fields but compiled to a tag store")]
    EmptySchemaButNotTag,

    /// No field lives at this path.
    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// The field exists but is not of the requested kind.
    #[error("field {path} is a {actual} field, expected {expected}")]
    FieldKindMismatch {
        /// Path of the field.
        path: String,
        /// Kind that was requested.
        expected: &'static str,
        /// Kind the field actually has.
        actual: &'static str,
    },

    /// The element type does not match the field's primitive type.
    #[error("field {path} holds {actual}, accessed as {expected}")]
    TypeMismatch {
        /// Path of the field.
        path: String,
        /// Element type of the accessor.
        expected: PrimitiveType,
        /// Primitive type of the field.
        actual: PrimitiveType,
    },

    /// Two buffers with different element representations were paired.
    #[error("cannot copy {src} elements into a {dst} buffer")]
    BufferMismatch {
        /// Primitive type of the destination.
        dst: PrimitiveType,
        /// Primitive type of the source.
        src: PrimitiveType,
    },

    /// The entity index is outside `[0, capacity)`.
    #[error("entity {eid} out of bounds (capacity {capacity})")]
    EntityOutOfBounds {
        /// The entity index.
        eid: usize,
        /// Current capacity of the store.
        capacity: usize,
    },

    /// No shadow was taken under this key.
    #[error("shadow not found: {0}")]
    ShadowNotFound(String),

    /// A schema document could not be parsed.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A configuration document could not be parsed or is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
