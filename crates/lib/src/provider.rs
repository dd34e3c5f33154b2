//! Backing-container factories.
//!
//! The decoder never allocates maps or lists directly; it asks a
//! [`ContainerProvider`]. Documents take the provider as a type parameter, so
//! the choice is made at compile time.
//!
//! ```
//! use thunderfile::provider::{CapacityProvider, ContainerProvider};
//!
//! let provider = CapacityProvider::new(16, 4);
//! let list = provider.new_list().unwrap();
//! assert!(list.capacity() >= 4);
//! ```

use thiserror::Error;

use crate::map::AttributeMap;

/// Errors raised while creating containers.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The allocator refused the requested capacity.
    #[error("Failed to allocate {container} with capacity {capacity}: {source}")]
    Allocation {
        container: &'static str,
        capacity: usize,
        #[source]
        source: std::collections::TryReserveError,
    },

    /// A custom provider failed for its own reasons.
    #[error("Container provider failed: {reason}")]
    Failed { reason: String },
}

impl ProviderError {
    /// Check if this error came from the allocator.
    pub fn is_allocation_error(&self) -> bool {
        matches!(self, ProviderError::Allocation { .. })
    }
}

impl From<ProviderError> for crate::Error {
    fn from(err: ProviderError) -> Self {
        crate::Error::Provider(err)
    }
}

/// Creates the maps and lists a decoded document is built from.
pub trait ContainerProvider: Send + Sync + std::fmt::Debug {
    /// Returns a fresh, empty map.
    fn new_map(&self) -> Result<AttributeMap, ProviderError>;

    /// Returns a fresh, empty list.
    fn new_list(&self) -> Result<Vec<String>, ProviderError>;
}

/// Plain empty containers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProvider;

impl ContainerProvider for DefaultProvider {
    fn new_map(&self) -> Result<AttributeMap, ProviderError> {
        Ok(AttributeMap::new())
    }

    fn new_list(&self) -> Result<Vec<String>, ProviderError> {
        Ok(Vec::new())
    }
}

/// Pre-sized containers for files with many entries per level.
///
/// Allocation failure is reported as [`ProviderError::Allocation`] instead of
/// aborting the process.
#[derive(Debug, Clone, Copy)]
pub struct CapacityProvider {
    map_capacity: usize,
    list_capacity: usize,
}

impl CapacityProvider {
    pub fn new(map_capacity: usize, list_capacity: usize) -> Self {
        Self {
            map_capacity,
            list_capacity,
        }
    }
}

impl ContainerProvider for CapacityProvider {
    fn new_map(&self) -> Result<AttributeMap, ProviderError> {
        let mut map = AttributeMap::new();
        map.try_reserve(self.map_capacity)
            .map_err(|source| ProviderError::Allocation {
                container: "map",
                capacity: self.map_capacity,
                source,
            })?;
        Ok(map)
    }

    fn new_list(&self) -> Result<Vec<String>, ProviderError> {
        let mut list = Vec::new();
        list.try_reserve(self.list_capacity)
            .map_err(|source| ProviderError::Allocation {
                container: "list",
                capacity: self.list_capacity,
                source,
            })?;
        Ok(list)
    }
}
