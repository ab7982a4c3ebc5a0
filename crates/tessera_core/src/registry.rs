//! # Store Registry
//!
//! Owns compiled stores and hands out opaque [`StoreHandle`]s.
//!
//! Each store sits behind `Arc<RwLock<_>>` so callers can keep one across
//! threads. Structural operations routed through the registry (grow,
//! reset, shadow) take the write lock for their duration.
//!
//! Handles are minted from one process-wide counter: a handle is never
//! reissued, even by another registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::schema::Schema;
use crate::store::Store;
use crate::sync::Shadow;

/// Next handle to mint.
static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Opaque key of a registered store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreHandle(u64);

impl StoreHandle {
    /// Mints a process-unique handle.
    pub(crate) fn mint() -> Self {
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw handle value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store#{}", self.0)
    }
}

/// A store shared between the registry and its callers.
pub type SharedStore = Arc<RwLock<Store>>;

/// Registry of live stores.
#[derive(Debug, Default)]
pub struct StoreRegistry {
    /// Live stores by handle.
    stores: HashMap<StoreHandle, SharedStore>,
    /// Capacity limits.
    config: StorageConfig,
}

impl StoreRegistry {
    /// Creates an empty registry with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with `config`'s limits.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if `config` fails validation.
    pub fn with_config(config: StorageConfig) -> StorageResult<Self> {
        config.validate()?;
        Ok(Self {
            stores: HashMap::new(),
            config,
        })
    }

    /// The registry's capacity limits.
    #[must_use]
    pub const fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Compiles `schema` at `capacity` and registers the result.
    ///
    /// # Errors
    ///
    /// `CapacityViolation` if `capacity` is above the configured ceiling,
    /// otherwise whatever [`Store::compile`] returns.
    pub fn compile(&mut self, schema: &Schema, capacity: usize) -> StorageResult<StoreHandle> {
        self.check_ceiling(capacity)?;
        let store = Store::compile(schema, capacity)?;
        self.register(store)
    }

    /// Compiles `schema` at the configured default capacity.
    ///
    /// # Errors
    ///
    /// Same as [`StoreRegistry::compile`].
    pub fn compile_default(&mut self, schema: &Schema) -> StorageResult<StoreHandle> {
        self.compile(schema, self.config.default_capacity)
    }

    /// Registers an already compiled store under its handle.
    ///
    /// # Errors
    ///
    /// `CapacityViolation` if the store's capacity is above the configured
    /// ceiling. The store is dropped.
    pub fn register(&mut self, store: Store) -> StorageResult<StoreHandle> {
        self.check_ceiling(store.capacity())?;
        let handle = store.handle();
        self.stores.insert(handle, Arc::new(RwLock::new(store)));
        debug!(target: "tessera::registry", handle = %handle, live = self.stores.len(), "registered store");
        Ok(handle)
    }

    /// Removes a store. The handle is invalid afterwards.
    ///
    /// # Errors
    ///
    /// `InvalidHandle` if `handle` is not registered.
    pub fn release(&mut self, handle: StoreHandle) -> StorageResult<SharedStore> {
        let store = self
            .stores
            .remove(&handle)
            .ok_or(StorageError::InvalidHandle(handle))?;
        debug!(target: "tessera::registry", handle = %handle, live = self.stores.len(), "released store");
        Ok(store)
    }

    /// The store registered under `handle`.
    ///
    /// # Errors
    ///
    /// `InvalidHandle` if `handle` is not registered.
    pub fn get(&self, handle: StoreHandle) -> StorageResult<SharedStore> {
        self.stores
            .get(&handle)
            .cloned()
            .ok_or(StorageError::InvalidHandle(handle))
    }

    /// Returns true if `handle` is registered.
    #[must_use]
    pub fn contains(&self, handle: StoreHandle) -> bool {
        self.stores.contains_key(&handle)
    }

    /// Number of live stores.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Returns true if no store is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Every live handle, in mint order.
    #[must_use]
    pub fn handles(&self) -> Vec<StoreHandle> {
        let mut handles: Vec<_> = self.stores.keys().copied().collect();
        handles.sort_unstable();
        handles
    }

    /// Grows a store to `new_capacity` entities.
    ///
    /// # Errors
    ///
    /// - `InvalidHandle` if `handle` is not registered
    /// - `CapacityViolation` if `new_capacity` is below the store's capacity
    ///   or above the configured ceiling
    ///
    /// Logs a warning once the store has grown past the soft ceiling.
    pub fn grow_to(&self, handle: StoreHandle, new_capacity: usize) -> StorageResult<()> {
        let store = self.get(handle)?;
        self.check_ceiling(new_capacity)?;

        let mut store = store.write();
        let before = store.capacity();
        store.grow(new_capacity)?;

        if store.capacity() > before && new_capacity > self.config.warn_capacity {
            warn!(
                target: "tessera::registry",
                handle = %handle,
                capacity = new_capacity,
                soft_limit = self.config.warn_capacity,
                "store capacity above soft limit"
            );
        }
        Ok(())
    }

    /// Zeroes every buffer of a store.
    ///
    /// # Errors
    ///
    /// `InvalidHandle` if `handle` is not registered.
    pub fn reset_all(&self, handle: StoreHandle) -> StorageResult<()> {
        self.get(handle)?.write().reset_all();
        Ok(())
    }

    /// Zeroes one entity of a store.
    ///
    /// # Errors
    ///
    /// `InvalidHandle` if `handle` is not registered, `EntityOutOfBounds`
    /// if `eid` is past the store's capacity.
    pub fn reset_entity(&self, handle: StoreHandle, eid: usize) -> StorageResult<()> {
        self.get(handle)?.write().reset_entity(eid)
    }

    /// Snapshots a store under `key`.
    ///
    /// # Errors
    ///
    /// `InvalidHandle` if `handle` is not registered.
    pub fn snapshot(&self, handle: StoreHandle, key: &str) -> StorageResult<Arc<Shadow>> {
        Ok(self.get(handle)?.write().shadow(key))
    }

    fn check_ceiling(&self, capacity: usize) -> StorageResult<()> {
        if capacity > self.config.max_capacity {
            return Err(StorageError::CapacityViolation {
                current: self.config.max_capacity,
                requested: capacity,
            });
        }
        Ok(())
    }
}
