//! Device registry: identifier → device, populated once at startup.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::device::Device;
use crate::error::{Error, Result};
use crate::loader;

/// All known devices.
///
/// The map has its own lock; each `Device` carries a second, independent
/// lock for its samples. Lookups hand out an `Arc<Device>` so the map lock is
/// released before any device lock is taken.
#[derive(Debug, Default)]
pub struct Registry {
    devices: RwLock<HashMap<String, Arc<Device>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a CSV source and register one empty device per data row.
    /// Returns the number of devices in the registry afterwards.
    pub async fn load<R: Read>(&self, source: R) -> Result<usize> {
        let ids = loader::read_device_ids(source)?;
        Ok(self.insert_all(ids).await)
    }

    /// Like [`Registry::load`], reading from a file on disk.
    pub async fn load_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let ids = loader::read_device_file(path)?;
        Ok(self.insert_all(ids).await)
    }

    async fn insert_all(&self, ids: Vec<String>) -> usize {
        let mut devices = self.devices.write().await;
        for id in ids {
            if devices
                .insert(id.clone(), Arc::new(Device::new(id.clone())))
                .is_some()
            {
                warn!(device_id = %id, "Duplicate device in bootstrap file, keeping the later row");
            } else {
                info!(device_id = %id, "Loaded device");
            }
        }
        devices.len()
    }

    pub async fn lookup(&self, id: &str) -> Result<Arc<Device>> {
        self.devices
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::DeviceNotFound(id.to_string()))
    }

    pub async fn is_empty(&self) -> bool {
        self.devices.read().await.is_empty()
    }

    /// Registered identifiers, sorted.
    pub async fn device_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.devices.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}
