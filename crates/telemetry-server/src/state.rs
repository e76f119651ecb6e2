//! Shared application state for the ingestion server.
//! Built once in `main` and handed to every handler through axum's State
//! extractor; there is no process-global registry.

use std::sync::Arc;
use std::time::Instant;

use telemetry_core::Registry;

#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    pub start_time: Instant,
    pub registry: Registry,
}

impl AppState {
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                start_time: Instant::now(),
                registry,
            }),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn uptime_secs(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }
}
