//! # TESSERA Core Engine
//!
//! Schema-driven column storage for entity-component data:
//! - One contiguous, zeroed buffer per scalar field
//! - One shared pool per primitive type for fixed-length array fields
//! - Capacity growth without losing entity data
//!
//! ## Architecture Rules
//!
//! 1. **Buffers are sized up front** - Data access never allocates
//! 2. **Layout is a function of (schema, capacity)** - Same inputs, same offsets
//! 3. **Structural changes are staged** - A failed grow leaves the store intact
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_core::{PrimitiveType, Schema, StoreRegistry};
//!
//! let body = Schema::new()
//!     .array("position", PrimitiveType::F32, 3)
//!     .scalar("health", PrimitiveType::U16);
//!
//! let mut registry = StoreRegistry::new();
//! let handle = registry.compile(&body, 4)?;
//! let store = registry.get(handle)?;
//! store.write().array_mut::<f32>("position")?.get_mut(2).unwrap().copy_from_slice(&[1.0, 2.0, 3.0]);
//! registry.grow_to(handle, 8)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod memory;
pub mod registry;
pub mod schema;
pub mod store;
pub mod sync;

pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use memory::{Buffer, Element, IndexWidth, Pool, Window};
pub use registry::{SharedStore, StoreHandle, StoreRegistry};
pub use schema::{ArrayCensus, Schema, SchemaNode};
pub use store::{ArrayField, ArrayView, ArrayViewMut, Field, Group, ScalarField, Store};
pub use sync::Shadow;
pub use tessera_shared::PrimitiveType;
