pub mod device;
pub mod error;
pub mod loader;
pub mod registry;
pub mod stats;
pub mod wire;

pub use device::{Device, DeviceSnapshot, DeviceStats};
pub use error::{Error, Result};
pub use registry::Registry;
pub use wire::{HeartbeatRequest, StatsResponse, UploadRequest};

/// Default HTTP port for the ingestion server
pub const DEFAULT_PORT: u16 = 8080;

/// Default bootstrap file listing the known devices
pub const DEFAULT_CSV_PATH: &str = "devices.csv";

/// Default server config file (optional)
pub const DEFAULT_CONFIG_PATH: &str = "telemetry.toml";
