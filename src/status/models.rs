use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Presence and integrity of one template or font asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AssetStatus {
    #[schema(example = "templates/kreis_nord/jugend.pdf")]
    pub path: String,
    pub exists: bool,
    pub size: Option<usize>,
    /// Lowercase hex SHA-256 of the fetched bytes
    pub sha256: Option<String>,
    /// `None` when no baseline digest is recorded for the asset
    pub hash_valid: Option<bool>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SelfTestFailure {
    pub locality: String,
    pub category: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SelfTestResult {
    pub passed: usize,
    pub total: usize,
    pub failed: usize,
    pub failures: Vec<SelfTestFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SystemStatus {
    pub status: HealthLevel,
    pub timestamp: DateTime<Utc>,
    pub templates: Vec<AssetStatus>,
    pub font: AssetStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
    /// Absent when the asset check already found the system unhealthy
    pub self_test: Option<SelfTestResult>,
}

impl SystemStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthLevel::Healthy
    }
}

/// Body returned when the status check itself could not run.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusFailureResponse {
    pub status: HealthLevel,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}
