//! Process-wide datatype registry
//!
//! The host installs a registry at startup and shuts it down on exit. Nothing
//! is registered implicitly: until [`install`] runs, [`current`] fails with
//! [`SchemaError::RegistryNotInstalled`].

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Result, SchemaError};
use crate::registry::DatatypeRegistry;

static REGISTRY: RwLock<Option<Arc<DatatypeRegistry>>> = parking_lot::const_rwlock(None);

/// Install the process-wide registry, returning the one it replaces
pub fn install(registry: Arc<DatatypeRegistry>) -> Option<Arc<DatatypeRegistry>> {
    log::info!("Installing datatype registry with {} datatypes", registry.len());
    REGISTRY.write().replace(registry)
}

/// The installed registry
pub fn current() -> Result<Arc<DatatypeRegistry>> {
    REGISTRY
        .read()
        .clone()
        .ok_or(SchemaError::RegistryNotInstalled)
}

/// Remove the installed registry. Node types built from it stay valid.
pub fn shutdown() -> Option<Arc<DatatypeRegistry>> {
    let previous = REGISTRY.write().take();
    if previous.is_some() {
        log::info!("Datatype registry shut down");
    }
    previous
}
