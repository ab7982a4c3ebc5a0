//! # Storage Configuration
//!
//! Capacity limits for a registry, loaded from the `[storage]` table of a
//! TOML file:
//!
//! ```toml
//! [storage]
//! default_capacity = 1024
//! max_capacity = 1048576
//! warn_capacity = 262144
//! ```
//!
//! Missing keys fall back to [`StorageConfig::default`].

use std::path::Path;

use serde::Deserialize;

use crate::error::{StorageError, StorageResult};

/// Capacity limits enforced by a [`StoreRegistry`](crate::StoreRegistry).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Capacity used by `compile_default`.
    pub default_capacity: usize,
    /// Hard ceiling. Compiling or growing past it fails.
    pub max_capacity: usize,
    /// Soft ceiling. Growing past it logs a warning.
    pub warn_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            default_capacity: 1024,
            max_capacity: 1 << 20,
            warn_capacity: 1 << 18,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    storage: StorageConfig,
}

impl StorageConfig {
    /// Parses the `[storage]` table of a TOML document and validates it.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the document does not parse or fails
    /// [`validate`](Self::validate).
    pub fn from_toml(source: &str) -> StorageResult<Self> {
        let file: ConfigFile = toml::from_str(source)
            .map_err(|e| StorageError::InvalidConfig(e.message().to_string()))?;
        file.storage.validate()?;
        Ok(file.storage)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the file cannot be read, plus everything
    /// [`from_toml`](Self::from_toml) returns.
    pub fn from_file(path: &Path) -> StorageResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            StorageError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&source)
    }

    /// Checks the limits are consistent.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if `max_capacity` is zero or below `default_capacity`.
    pub fn validate(&self) -> StorageResult<()> {
        if self.max_capacity == 0 {
            return Err(StorageError::InvalidConfig(
                "max_capacity must be greater than zero".to_string(),
            ));
        }
        if self.default_capacity > self.max_capacity {
            return Err(StorageError::InvalidConfig(format!(
                "default_capacity {} exceeds max_capacity {}",
                self.default_capacity, self.max_capacity
            )));
        }
        Ok(())
    }

    /// Sets the capacity used by `compile_default`.
    #[must_use]
    pub const fn with_default_capacity(mut self, capacity: usize) -> Self {
        self.default_capacity = capacity;
        self
    }

    /// Sets the hard ceiling.
    #[must_use]
    pub const fn with_max_capacity(mut self, capacity: usize) -> Self {
        self.max_capacity = capacity;
        self
    }

    /// Sets the soft ceiling.
    #[must_use]
    pub const fn with_warn_capacity(mut self, capacity: usize) -> Self {
        self.warn_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.default_capacity, 1024);
        assert_eq!(config.max_capacity, 1_048_576);
        assert_eq!(config.warn_capacity, 262_144);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = StorageConfig::from_toml(
            r"
            [storage]
            default_capacity = 64
            ",
        )
        .unwrap();
        assert_eq!(config.default_capacity, 64);
        assert_eq!(config.max_capacity, StorageConfig::default().max_capacity);
    }

    #[test]
    fn test_from_toml_empty_document() {
        assert_eq!(StorageConfig::from_toml("").unwrap(), StorageConfig::default());
    }

    #[test]
    fn test_from_toml_rejects_unknown_keys() {
        let err = StorageConfig::from_toml("[storage]\nmin_capacity = 1").unwrap_err();
        assert!(matches!(err, StorageError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_missing_file() {
        let err = StorageConfig::from_file(Path::new("/nonexistent/tessera.toml")).unwrap_err();
        assert!(matches!(err, StorageError::InvalidConfig(msg) if msg.contains("tessera.toml")));
    }

    #[test]
    fn test_validate() {
        let config = StorageConfig::default().with_max_capacity(0);
        assert!(config.validate().is_err());

        let config = StorageConfig::default()
            .with_default_capacity(10)
            .with_max_capacity(5);
        let err = StorageConfig::from_toml("[storage]\ndefault_capacity = 10\nmax_capacity = 5").unwrap_err();
        assert_eq!(config.validate().unwrap_err(), err);
    }
}
