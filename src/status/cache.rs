use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use super::models::SystemStatus;

const STATUS_KEY: &str = "system_status";

/// Holds the most recent status snapshot for a fixed TTL.
#[derive(Clone)]
pub struct StatusCache {
    inner: Cache<String, Arc<SystemStatus>>,
}

impl StatusCache {
    pub fn new(ttl: Duration) -> Self {
        let inner = Cache::builder().time_to_live(ttl).max_capacity(1).build();
        Self { inner }
    }

    pub async fn get(&self) -> Option<Arc<SystemStatus>> {
        self.inner.get(STATUS_KEY).await
    }

    pub async fn store(&self, status: Arc<SystemStatus>) {
        self.inner.insert(STATUS_KEY.to_string(), status).await;
    }
}
