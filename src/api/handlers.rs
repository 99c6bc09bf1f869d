use actix_web::http::{header, Method};
use actix_web::{error::InternalError, web, HttpRequest, HttpResponse, Resource, Responder};
use chrono::Utc;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::report::{validate, ReportRequest};
use crate::state::AppState;
use crate::status::models::{HealthLevel, StatusFailureResponse, SystemStatus};
use crate::ErrorResponse;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LocalityInfo {
    #[schema(example = "Kreis Nord")]
    pub code: String,
    pub categories: Vec<String>,
}

/// Capability listing returned by `/` and `/health`.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    #[schema(example = "ok")]
    pub status: String,
    pub localities: Vec<LocalityInfo>,
    pub categories: Vec<String>,
    pub endpoints: Vec<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    /// `true` bypasses the cached snapshot
    pub refresh: Option<String>,
}

impl StatusQuery {
    fn force_refresh(&self) -> bool {
        self.refresh.as_deref() == Some("true")
    }
}

#[utoipa::path(
    tag = "Referee Reports",
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service capabilities", body = ServiceInfo)
    )
)]
pub async fn service_info(data: web::Data<AppState>) -> impl Responder {
    let registry = &data.registry;
    let localities = registry
        .localities()
        .map(|locality| LocalityInfo {
            code: locality.to_string(),
            categories: registry
                .categories_for(locality)
                .into_iter()
                .map(String::from)
                .collect(),
        })
        .collect();

    HttpResponse::Ok().json(ServiceInfo {
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "ok".to_string(),
        localities,
        categories: registry.known_categories().to_vec(),
        endpoints: vec![
            "GET /health".to_string(),
            "GET /api/status".to_string(),
            "POST /api/generate-report".to_string(),
            "GET /metrics".to_string(),
            "GET /swagger-ui/".to_string(),
        ],
    })
}

#[utoipa::path(
    context_path = "/api",
    tag = "Referee Reports",
    get,
    path = "/status",
    params(StatusQuery),
    responses(
        (status = 200, description = "All assets present and self-test passed", body = SystemStatus),
        (status = 503, description = "Degraded or unhealthy", body = SystemStatus),
        (status = 500, description = "Status check failed", body = StatusFailureResponse)
    )
)]
pub async fn get_status(
    query: web::Query<StatusQuery>,
    data: web::Data<AppState>,
) -> impl Responder {
    let force_refresh = query.force_refresh();
    info!("Status requested (refresh: {})", force_refresh);

    match data.status_reporter.get_status(force_refresh).await {
        Ok(status) if status.is_healthy() => HttpResponse::Ok().json(status.as_ref()),
        Ok(status) => {
            warn!("Reporting {:?} status", status.status);
            HttpResponse::ServiceUnavailable().json(status.as_ref())
        }
        Err(e) => {
            error!("Status check failed: {}", e);
            HttpResponse::InternalServerError().json(StatusFailureResponse {
                status: HealthLevel::Unhealthy,
                error: e.to_string(),
                timestamp: Utc::now(),
            })
        }
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Referee Reports",
    post,
    path = "/generate-report",
    request_body = ReportRequest,
    responses(
        (status = 200, description = "Filled referee report", content_type = "application/pdf"),
        (status = 400, description = "Invalid form data", body = ErrorResponse),
        (status = 500, description = "Generation failed", body = ErrorResponse)
    )
)]
pub async fn generate_report(
    req: web::Json<ReportRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    let request = req.into_inner();
    info!(
        "Generating report for {} {} ({} vs {})",
        request.locality, request.age_category, request.team_1, request.team_2
    );

    if let Err(e) = validate(&request, &data.registry) {
        warn!("Rejected report request: {}", e);
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e.message));
    }

    match data.generator.generate(&request).await {
        Ok(report) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report.filename),
            ))
            .body(report.pdf),
        Err(e) => {
            error!("Failed to generate report: {}", e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error(&e.to_string()))
        }
    }
}

/// Default for unmatched paths and methods: bare `OPTIONS` gets an empty 204,
/// anything else a plain-text 404.
pub async fn fallback(req: HttpRequest) -> HttpResponse {
    if req.method() == Method::OPTIONS {
        return HttpResponse::NoContent().finish();
    }
    debug!("No route for {} {}", req.method(), req.path());
    HttpResponse::NotFound()
        .content_type("text/plain; charset=utf-8")
        .body("Not Found")
}

/// JSON extractor config that answers malformed bodies with an `ErrorResponse`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        warn!("Malformed JSON body: {}", message);
        InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(ErrorResponse::bad_request(&message)),
        )
        .into()
    })
}

fn resource(path: &str) -> Resource {
    web::resource(path).default_service(web::to(fallback))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(resource("/").route(web::get().to(service_info)))
        .service(resource("/health").route(web::get().to(service_info)))
        .service(
            web::scope("/api")
                .service(resource("/status").route(web::get().to(get_status)))
                .service(resource("/generate-report").route(web::post().to(generate_report))),
        );
}
