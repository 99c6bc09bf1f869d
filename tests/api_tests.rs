//! HTTP surface: routing, status codes, headers and CORS.

mod common;

use actix_web::http::{header, Method, StatusCode};
use actix_web::middleware::from_fn;
use actix_web::{test, web, App};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{healthy_storage, sample_template, test_registry, MockStorage, FONT, TEST_FONT};
use referee_report_server::cors::{answer_foreign_preflight, build_cors, CorsPolicy};
use referee_report_server::report::TemplateRegistry;
use referee_report_server::storage::{LocalStorage, ObjectStorage, StorageError};
use referee_report_server::{api, AppState};

const ALLOWED_ORIGIN: &str = "http://localhost:5173";

fn bundled_state() -> AppState {
    AppState::new_with_registry_and_storage(
        Arc::new(TemplateRegistry::bundled().unwrap()),
        Arc::new(LocalStorage::new("static")),
        Duration::from_secs(60),
    )
}

fn state_with(storage: Arc<dyn ObjectStorage + Send + Sync>) -> AppState {
    AppState::new_with_registry_and_storage(
        Arc::new(test_registry()),
        storage,
        Duration::from_secs(60),
    )
}

fn policy() -> Arc<CorsPolicy> {
    Arc::new(CorsPolicy {
        allowed_origins: vec![ALLOWED_ORIGIN.to_string()],
        allowed_suffixes: vec![".pages.dev".to_string()],
    })
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .wrap(build_cors(policy()))
                .wrap(from_fn(answer_foreign_preflight))
                .app_data(web::Data::from(policy()))
                .app_data(web::Data::new($state))
                .app_data(api::json_config())
                .configure(api::config)
                .default_service(web::to(api::fallback)),
        )
        .await
    };
}

fn report_body() -> Value {
    json!({
        "referee_name": "Max Mustermann",
        "match_date": "2025-11-04",
        "start_time": "14:30",
        "team_1": "FC Beispielstadt",
        "team_2": "SV Musterdorf",
        "age_category": "U15",
        "locality": "Kreis Nord"
    })
}

#[actix_web::test]
async fn test_health_lists_capabilities() {
    let app = test_app!(bundled_state());

    for path in ["/", "/health"] {
        let req = test::TestRequest::get().uri(path).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "referee-report-server");
        assert_eq!(body["localities"][0]["code"], "Kreis Nord");
        assert_eq!(body["localities"][1]["code"], "Kreis Süd");
        assert_eq!(body["categories"].as_array().unwrap().len(), 9);
        assert!(body["endpoints"]
            .as_array()
            .unwrap()
            .contains(&json!("POST /api/generate-report")));
    }
}

#[actix_web::test]
async fn test_unknown_route_is_plain_not_found() {
    let app = test_app!(bundled_state());

    let req = test::TestRequest::get().uri("/api/unknown").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = test::read_body(resp).await;
    assert_eq!(body.as_ref(), b"Not Found");
}

#[actix_web::test]
async fn test_wrong_method_on_known_path_is_plain_not_found() {
    let app = test_app!(bundled_state());

    let requests = [
        test::TestRequest::get().uri("/api/generate-report").to_request(),
        test::TestRequest::post().uri("/health").to_request(),
        test::TestRequest::delete().uri("/api/status").to_request(),
    ];
    for req in requests {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = test::read_body(resp).await;
        assert_eq!(body.as_ref(), b"Not Found");
    }
}

#[actix_web::test]
async fn test_generate_report_returns_attachment() {
    let app = test_app!(bundled_state());

    let req = test::TestRequest::post()
        .uri("/api/generate-report")
        .set_json(report_body())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    assert_eq!(
        resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"referee_report_U15_FCBeispielstadt_vs_SVMusterdorf_20251104.pdf\""
    );

    let body = test::read_body(resp).await;
    assert!(body.starts_with(b"%PDF"));
}

#[actix_web::test]
async fn test_generate_report_rejects_invalid_form() {
    let app = test_app!(bundled_state());

    let mut body = report_body();
    body["age_category"] = json!("U13");
    let req = test::TestRequest::post()
        .uri("/api/generate-report")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let error: Value = test::read_body_json(resp).await;
    assert_eq!(error["error"], "BadRequest");
    assert_eq!(error["message"], "Age category U13 requires a second referee name");
    assert!(error["timestamp"].is_string());
}

#[actix_web::test]
async fn test_malformed_json_is_bad_request() {
    let app = test_app!(bundled_state());

    let req = test::TestRequest::post()
        .uri("/api/generate-report")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{\"referee_name\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let error: Value = test::read_body_json(resp).await;
    assert_eq!(error["error"], "BadRequest");
}

#[actix_web::test]
async fn test_generation_failure_is_internal_error() {
    // valid form, but the template is missing from storage
    let storage = Arc::new(MockStorage::new().with_file(TEST_FONT, FONT.to_vec()));
    let app = test_app!(state_with(storage));

    let mut body = report_body();
    body["locality"] = json!("Testkreis");
    body["age_category"] = json!("U15");
    let req = test::TestRequest::post()
        .uri("/api/generate-report")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let error: Value = test::read_body_json(resp).await;
    assert_eq!(error["error"], "InternalServerError");
    assert!(error["message"].as_str().unwrap().contains("templates/test.pdf"));
}

#[actix_web::test]
async fn test_status_codes_follow_health() {
    let app = test_app!(state_with(Arc::new(healthy_storage())));
    let req = test::TestRequest::get().uri("/api/status").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let status: Value = test::read_body_json(resp).await;
    assert_eq!(status["status"], "healthy");

    let app = test_app!(state_with(Arc::new(MockStorage::new())));
    let req = test::TestRequest::get()
        .uri("/api/status?refresh=true")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let status: Value = test::read_body_json(resp).await;
    assert_eq!(status["status"], "unhealthy");
    assert_eq!(status["templates"][0]["exists"], false);
}

#[actix_web::test]
async fn test_cors_echoes_only_allowed_origins() {
    let app = test_app!(bundled_state());

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header((header::ORIGIN, ALLOWED_ORIGIN))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        ALLOWED_ORIGIN
    );

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header((header::ORIGIN, "https://feature-x.referee.pages.dev"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://feature-x.referee.pages.dev"
    );

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header((header::ORIGIN, "https://evil.example.com"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[actix_web::test]
async fn test_preflight_is_answered() {
    let app = test_app!(bundled_state());

    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/api/generate-report")
        .insert_header((header::ORIGIN, ALLOWED_ORIGIN))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        ALLOWED_ORIGIN
    );
}

#[actix_web::test]
async fn test_bare_options_gets_empty_response() {
    let app = test_app!(bundled_state());

    for (path, origin) in [
        ("/api/status", Some(ALLOWED_ORIGIN)),
        ("/health", None),
        ("/no/such/path", None),
    ] {
        let mut req = test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri(path);
        if let Some(origin) = origin {
            req = req.insert_header((header::ORIGIN, origin));
        }
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT, "OPTIONS {}", path);
        let body = test::read_body(resp).await;
        assert!(body.is_empty());
    }
}

#[actix_web::test]
async fn test_preflight_from_foreign_origin_omits_cors_headers() {
    let app = test_app!(bundled_state());

    let req = test::TestRequest::default()
        .method(Method::OPTIONS)
        .uri("/api/generate-report")
        .insert_header((header::ORIGIN, "https://evil.example.com"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    let body = test::read_body(resp).await;
    assert!(body.is_empty());
}

/// Serves the asset check, then panics on every later download so the
/// self-test task dies.
struct PanicAfterAssetCheck {
    inner: MockStorage,
    served: AtomicUsize,
}

#[async_trait]
impl ObjectStorage for PanicAfterAssetCheck {
    async fn download_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        // template + font for the test registry
        if self.served.fetch_add(1, Ordering::SeqCst) >= 2 {
            panic!("storage backend crashed while fetching {}", path);
        }
        self.inner.download_file(path).await
    }

    fn get_asset_url(&self, path: &str) -> String {
        self.inner.get_asset_url(path)
    }
}

#[actix_web::test]
async fn test_status_check_failure_is_internal_error() {
    let storage = PanicAfterAssetCheck {
        inner: MockStorage::new()
            .with_file(common::TEST_TEMPLATE, sample_template(1))
            .with_file(TEST_FONT, FONT.to_vec()),
        served: AtomicUsize::new(0),
    };
    let app = test_app!(state_with(Arc::new(storage)));

    let req = test::TestRequest::get().uri("/api/status").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "unhealthy");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("self-test task failed"));
    assert!(body["timestamp"].is_string());
    assert!(body.get("templates").is_none());
}
