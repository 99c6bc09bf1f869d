use chrono::Utc;
use futures::future::join_all;
use log::{debug, error, info, warn};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use super::cache::StatusCache;
use super::fixtures::canned_requests;
use super::models::{AssetStatus, HealthLevel, SelfTestFailure, SelfTestResult, SystemStatus};
use crate::report::ReportGenerator;
use crate::storage::ObjectStorage;

const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Debug, Error)]
pub enum StatusError {
    #[error("self-test task failed: {0}")]
    SelfTest(#[from] tokio::task::JoinError),
}

pub struct StatusReporter {
    generator: ReportGenerator,
    storage: Arc<dyn ObjectStorage + Send + Sync>,
    cache: StatusCache,
    refresh_lock: Mutex<()>,
}

impl StatusReporter {
    pub fn new(
        generator: ReportGenerator,
        storage: Arc<dyn ObjectStorage + Send + Sync>,
        cache: StatusCache,
    ) -> Self {
        Self {
            generator,
            storage,
            cache,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Current status. A cached snapshot is returned as-is unless `force_refresh`.
    pub async fn get_status(&self, force_refresh: bool) -> Result<Arc<SystemStatus>, StatusError> {
        if !force_refresh {
            if let Some(cached) = self.cache.get().await {
                debug!("Serving cached status from {}", cached.timestamp);
                return Ok(cached);
            }
        }

        let _guard = self.refresh_lock.lock().await;
        if !force_refresh {
            // another caller may have refreshed while we waited
            if let Some(cached) = self.cache.get().await {
                return Ok(cached);
            }
        }

        let status = Arc::new(self.compute_status().await?);
        self.cache.store(status.clone()).await;
        Ok(status)
    }

    async fn compute_status(&self) -> Result<SystemStatus, StatusError> {
        let registry = self.generator.registry();
        let template_paths = registry.template_paths();
        let font_path = registry.font_path();
        info!(
            "Checking {} templates and font {}",
            template_paths.len(),
            font_path
        );

        let (templates, font) = futures::future::join(
            join_all(template_paths.iter().map(|path| self.check_asset(path))),
            self.check_asset(font_path),
        )
        .await;

        let mut issues = Vec::new();
        for asset in templates.iter().chain(std::iter::once(&font)) {
            if !asset.exists {
                issues.push(format!("Missing asset: {}", asset.path));
            } else if asset.hash_valid == Some(false) {
                issues.push(format!("Checksum mismatch: {}", asset.path));
            }
        }

        if !issues.is_empty() {
            for issue in &issues {
                warn!("{}", issue);
            }
            return Ok(SystemStatus {
                status: HealthLevel::Unhealthy,
                timestamp: Utc::now(),
                templates,
                font,
                issues,
                self_test: None,
            });
        }

        let self_test = self.run_self_test().await?;
        let status = if self_test.failed == 0 {
            HealthLevel::Healthy
        } else {
            for failure in &self_test.failures {
                issues.push(format!(
                    "Self-test failed for {} {}: {}",
                    failure.locality, failure.category, failure.error
                ));
            }
            HealthLevel::Degraded
        };
        info!(
            "Status {:?}: self-test {}/{} passed",
            status, self_test.passed, self_test.total
        );

        Ok(SystemStatus {
            status,
            timestamp: Utc::now(),
            templates,
            font,
            issues,
            self_test: Some(self_test),
        })
    }

    async fn check_asset(&self, path: &str) -> AssetStatus {
        let baseline = self.generator.registry().baseline_for(path);
        match self.storage.download_file(path).await {
            Ok(bytes) => {
                let digest = hex::encode(Sha256::digest(&bytes));
                let hash_valid = baseline.map(|expected| expected == digest);
                if hash_valid == Some(false) {
                    debug!("Digest of {} is {}, expected {:?}", path, digest, baseline);
                }
                AssetStatus {
                    path: path.to_string(),
                    exists: true,
                    size: Some(bytes.len()),
                    sha256: Some(digest),
                    hash_valid,
                    error: None,
                }
            }
            Err(e) => {
                error!("Status check could not fetch {}: {}", path, e);
                AssetStatus {
                    path: path.to_string(),
                    exists: false,
                    size: None,
                    sha256: None,
                    hash_valid: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Generate one canned report per supported pair.
    async fn run_self_test(&self) -> Result<SelfTestResult, StatusError> {
        let requests = canned_requests(self.generator.registry());
        let total = requests.len();

        let handles = requests.into_iter().map(|request| {
            let generator = self.generator.clone();
            tokio::spawn(async move {
                let outcome = match generator.generate(&request).await {
                    Ok(report) if report.pdf.starts_with(PDF_MAGIC) => Ok(()),
                    Ok(_) => Err("output is not a PDF".to_string()),
                    Err(e) => Err(e.to_string()),
                };
                (request, outcome)
            })
        });

        let mut failures = Vec::new();
        for joined in join_all(handles).await {
            let (request, outcome) = joined?;
            if let Err(message) = outcome {
                error!(
                    "Self-test failed for {} {}: {}",
                    request.locality, request.age_category, message
                );
                failures.push(SelfTestFailure {
                    locality: request.locality,
                    category: request.age_category,
                    error: message,
                });
            }
        }

        Ok(SelfTestResult {
            passed: total - failures.len(),
            total,
            failed: failures.len(),
            failures,
        })
    }
}
