use crate::errors::AppError;
use crate::models::{LeadRecord, LeadRequest, ProxyHealth};
use crate::rate_limit::RateLimiter;
use crate::services::LeadService;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Lead extraction pipeline.
    pub lead_service: LeadService,
    /// Per-client limiter for the lead route.
    pub rate_limiter: Arc<dyn RateLimiter>,
}

/// Client identifier used for rate limiting: the first `X-Forwarded-For` hop.
pub fn client_identifier(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Liveness check. Not rate limited.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-leadgen-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /generate-leads
///
/// Main lead endpoint. The client's rate-limit window is charged before the
/// body is looked at, so malformed requests still count against the limit.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `headers` - Request headers; `X-Forwarded-For` identifies the client.
/// * `payload` - JSON body with `keyword`, `siteAddress`, `location` and `emailDomain`.
///
/// # Returns
///
/// * `Result<Json<Vec<LeadRecord>>, AppError>` - The extracted leads, or an
///   error rendered as `{"error": ...}` (400, 413, 429 or 500).
#[utoipa::path(
    post,
    path = "/generate-leads",
    request_body = LeadRequest,
    responses(
        (status = 200, description = "Extracted leads", body = [LeadRecord]),
        (status = 400, description = "Missing or empty field", body = crate::models::ErrorBody),
        (status = 413, description = "Body over the size limit", body = crate::models::ErrorBody),
        (status = 429, description = "Rate limit exceeded", body = crate::models::ErrorBody),
        (status = 500, description = "Fetch, model or parse failure", body = crate::models::ErrorBody)
    )
)]
pub async fn generate_leads(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<LeadRequest>, JsonRejection>,
) -> Result<Json<Vec<LeadRecord>>, AppError> {
    let client_id = client_identifier(&headers);
    if !state.rate_limiter.allow(&client_id) {
        return Err(AppError::RateLimited);
    }

    let Json(request) = payload.map_err(|rejection| match rejection {
        // Body could not be read at all, e.g. it exceeded the size limit (413).
        JsonRejection::BytesRejection(_) => {
            AppError::Rejected(rejection.status(), rejection.body_text())
        }
        _ => AppError::Validation(format!("Invalid request body: {}", rejection.body_text())),
    })?;

    let leads = state.lead_service.extract_leads(&request).await?;
    Ok(Json(leads))
}

/// GET /generate-leads
///
/// Verifies the outbound proxy by asking an IP-echo service for our address.
///
/// # Arguments
///
/// * `state` - The application state.
///
/// # Returns
///
/// * `(StatusCode, Json<ProxyHealth>)` - HTTP 200 with `{status: "ok", proxyIp}`,
///   or HTTP 500 with `{status: "error", message}`.
#[utoipa::path(
    get,
    path = "/generate-leads",
    responses(
        (status = 200, description = "Proxy reachable", body = ProxyHealth),
        (status = 500, description = "Proxy unreachable", body = ProxyHealth)
    )
)]
pub async fn proxy_health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ProxyHealth>) {
    let report = state.lead_service.search_client().check_proxy().await;
    let status = match report {
        ProxyHealth::Ok { .. } => StatusCode::OK,
        ProxyHealth::Error { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_identifier_uses_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(client_identifier(&headers), "203.0.113.9");
    }

    #[test]
    fn test_client_identifier_falls_back_to_unknown() {
        assert_eq!(client_identifier(&HeaderMap::new()), "unknown");

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("  "));
        assert_eq!(client_identifier(&headers), "unknown");
    }
}
