//! JSON bodies exchanged between devices, the ingestion server and the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::DeviceStats;

/// Body of `POST /devices/{id}/heartbeat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    /// RFC 3339 timestamp from the device clock
    #[serde(deserialize_with = "rfc3339::deserialize")]
    pub sent_at: DateTime<Utc>,
}

/// Body of `POST /devices/{id}/stats`.
///
/// `sent_at` is validated but not stored; only `upload_time` is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRequest {
    #[serde(deserialize_with = "rfc3339::deserialize")]
    pub sent_at: DateTime<Utc>,
    pub upload_time: i64,
}

/// Body of `GET /devices/{id}/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub uptime: f64,
    /// Integer average, rendered as a decimal string
    pub avg_upload_time: String,
}

impl From<DeviceStats> for StatsResponse {
    fn from(stats: DeviceStats) -> Self {
        Self {
            uptime: stats.uptime,
            avg_upload_time: stats.avg_upload_time.to_string(),
        }
    }
}

mod rfc3339 {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer};

    /// Strict RFC 3339: the date and time must be joined by `T` (or `t`).
    /// chrono's own parser would also take a space there.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(d)?;
        if !matches!(s.as_bytes().get(10), Some(b'T' | b't')) {
            return Err(de::Error::custom(format!(
                "invalid RFC 3339 timestamp {s:?}: expected 'T' between date and time"
            )));
        }
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}
