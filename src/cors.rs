//! CORS policy.
//!
//! The caller's origin is echoed back only when it is explicitly allowed or
//! when its host ends with one of the allowed suffixes. Anything else is
//! served without CORS headers, which makes the browser reject the response.

use actix_cors::Cors;
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::{header, Method};
use actix_web::middleware::Next;
use actix_web::{web, Error, HttpResponse};
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorsPolicy {
    /// Origins matched exactly, e.g. `https://referee.example.org`.
    pub allowed_origins: Vec<String>,
    /// Host suffixes for preview deployments and subdomains, matched over https only.
    pub allowed_suffixes: Vec<String>,
}

impl CorsPolicy {
    pub fn is_allowed(&self, origin: &str) -> bool {
        let origin = origin.trim_end_matches('/');
        if self.allowed_origins.iter().any(|allowed| allowed == origin) {
            return true;
        }

        let Some(host) = origin.strip_prefix("https://") else {
            return false;
        };
        let host = host.split(':').next().unwrap_or(host);
        if host.is_empty() {
            return false;
        }

        self.allowed_suffixes.iter().any(|suffix| {
            let bare = suffix.trim_start_matches('.');
            !bare.is_empty()
                && host.len() > bare.len()
                && host.ends_with(bare)
                && host[..host.len() - bare.len()].ends_with('.')
        })
    }
}

pub fn build_cors(policy: Arc<CorsPolicy>) -> Cors {
    Cors::default()
        .allowed_origin_fn(move |origin, _req_head| {
            origin
                .to_str()
                .map(|value| policy.is_allowed(value))
                .unwrap_or(false)
        })
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .expose_headers(vec![header::CONTENT_DISPOSITION])
        .block_on_origin_mismatch(false)
        .max_age(3600)
}

/// Answers `OPTIONS` from an origin outside the policy with an empty 204 and
/// no CORS headers, before `Cors` can reject it. Reads the policy from app
/// data; without one every request passes through.
pub async fn answer_foreign_preflight<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    let foreign = req.method() == Method::OPTIONS
        && match (
            req.headers().get(header::ORIGIN),
            req.app_data::<web::Data<CorsPolicy>>(),
        ) {
            (Some(origin), Some(policy)) => !origin
                .to_str()
                .map(|value| policy.is_allowed(value))
                .unwrap_or(false),
            _ => false,
        };

    if foreign {
        log::debug!("Answering preflight for {} from a foreign origin", req.path());
        return Ok(req
            .into_response(HttpResponse::NoContent().finish())
            .map_into_right_body());
    }

    next.call(req).await.map(ServiceResponse::map_into_left_body)
}
