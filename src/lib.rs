use actix_web::middleware::{from_fn, Compress};
use actix_web::{web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod api;
pub mod config;
pub mod cors;
pub mod report;
pub mod state;
pub mod status;
pub mod storage;

pub use crate::config::AppConfig;
pub use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::service_info,
        crate::api::handlers::get_status,
        crate::api::handlers::generate_report
    ),
    components(
        schemas(
            report::ReportRequest,
            status::SystemStatus,
            status::AssetStatus,
            status::HealthLevel,
            status::SelfTestResult,
            status::SelfTestFailure,
            status::models::StatusFailureResponse,
            api::handlers::ServiceInfo,
            api::handlers::LocalityInfo,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Referee Reports", description = "Report generation and system status endpoints.")
    ),
    servers(
        (url = "http://127.0.0.1:8080", description = "Local development server")
    )
)]
pub struct ApiDoc;

pub async fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    let app_state = web::Data::new(AppState::new_with_config(&config)?);
    let cors_policy = Arc::new(config.cors.clone());

    let prometheus = PrometheusMetricsBuilder::new("referee_report_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| anyhow::anyhow!("failed to create Prometheus metrics middleware: {:?}", e))?;

    log::info!(
        "Starting server at http://{}:{} ({} localities, {} supported categories)",
        config.host,
        config.port,
        app_state.registry.localities().count(),
        app_state.registry.supported_pairs().len()
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .wrap(prometheus.clone())
            .wrap(cors::build_cors(cors_policy.clone()))
            .wrap(from_fn(cors::answer_foreign_preflight))
            .app_data(web::Data::from(cors_policy.clone()))
            .app_data(app_state.clone())
            .app_data(api::json_config())
            .configure(api::config)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .default_service(web::to(api::fallback))
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
