//! System status: asset presence and integrity plus a generation self-test,
//! cached for a fixed TTL.

pub mod cache;
pub mod fixtures;
pub mod models;
pub mod reporter;

pub use cache::StatusCache;
pub use models::{AssetStatus, HealthLevel, SelfTestFailure, SelfTestResult, SystemStatus};
pub use reporter::{StatusError, StatusReporter};
