//! Per-device sample storage.
//!
//! Every device owns its own lock, independent of the registry lock and of
//! every other device, so traffic for unrelated devices never contends.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::stats;

/// A registered device and its append-only sample sequences.
#[derive(Debug)]
pub struct Device {
    id: String,
    samples: RwLock<DeviceSnapshot>,
}

/// Copy of a device's sample sequences, in append order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceSnapshot {
    pub heartbeats: Vec<DateTime<Utc>>,
    pub upload_times: Vec<i64>,
}

/// Derived statistics for one device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceStats {
    /// Heartbeat density percentage (may exceed 100)
    pub uptime: f64,
    /// Truncated mean of the upload samples
    pub avg_upload_time: i64,
}

impl Device {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            samples: RwLock::new(DeviceSnapshot::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append a heartbeat. Timestamps come from the client clock and are
    /// stored in arrival order, not chronological order.
    pub async fn record_heartbeat(&self, sent_at: DateTime<Utc>) {
        self.samples.write().await.heartbeats.push(sent_at);
    }

    /// Append an upload-duration sample.
    pub async fn record_upload(&self, upload_time: i64) {
        self.samples.write().await.upload_times.push(upload_time);
    }

    pub async fn stats(&self) -> DeviceStats {
        let samples = self.samples.read().await;
        DeviceStats {
            uptime: stats::uptime_percent(&samples.heartbeats),
            avg_upload_time: stats::average_upload_time(&samples.upload_times),
        }
    }

    pub async fn snapshot(&self) -> DeviceSnapshot {
        self.samples.read().await.clone()
    }

    pub async fn heartbeat_count(&self) -> usize {
        self.samples.read().await.heartbeats.len()
    }

    pub async fn upload_count(&self) -> usize {
        self.samples.read().await.upload_times.len()
    }
}
