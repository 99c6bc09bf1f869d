//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, AssetSource};
use crate::report::{ReportGenerator, TemplateRegistry};
use crate::status::{StatusCache, StatusReporter};
use crate::storage::{HttpStorage, LocalStorage, ObjectStorage};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TemplateRegistry>,
    pub generator: ReportGenerator,
    pub status_reporter: Arc<StatusReporter>,
}

impl AppState {
    pub fn new_with_config(config: &AppConfig) -> anyhow::Result<Self> {
        let registry = match &config.template_table_path {
            Some(path) => {
                log::info!("Loading template table from {}", path.display());
                TemplateRegistry::from_path(path)?
            }
            None => TemplateRegistry::bundled()?,
        };

        let storage: Arc<dyn ObjectStorage + Send + Sync> = match &config.assets {
            AssetSource::Http { base_url } => {
                log::info!("Serving assets from {}", base_url);
                let http_client = reqwest::Client::builder()
                    .pool_idle_timeout(Duration::from_secs(900))
                    .user_agent(concat!("referee-report-server/", env!("CARGO_PKG_VERSION")))
                    .build()?;
                Arc::new(HttpStorage::new(base_url.clone(), http_client))
            }
            AssetSource::Local { dir } => {
                log::info!("Serving assets from directory {}", dir.display());
                Arc::new(LocalStorage::new(dir.clone()))
            }
        };

        Ok(Self::new_with_registry_and_storage(
            Arc::new(registry),
            storage,
            config.status_cache_ttl,
        ))
    }

    pub fn new_with_registry_and_storage(
        registry: Arc<TemplateRegistry>,
        storage: Arc<dyn ObjectStorage + Send + Sync>,
        status_cache_ttl: Duration,
    ) -> Self {
        let generator = ReportGenerator::new(registry.clone(), storage.clone());
        let status_reporter = Arc::new(StatusReporter::new(
            generator.clone(),
            storage,
            StatusCache::new(status_cache_ttl),
        ));

        Self {
            registry,
            generator,
            status_reporter,
        }
    }
}
