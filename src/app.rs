//! Router assembly and API documentation.

use crate::handlers::{self, AppState};
use crate::models::{ErrorBody, LeadRecord, LeadRequest, ProxyHealth};
use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::OpenApi;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::generate_leads, handlers::proxy_health),
    components(schemas(LeadRequest, LeadRecord, ErrorBody, ProxyHealth)),
    info(
        title = "Lead Generation API",
        description = "Scrapes search results and structures them into contact leads"
    )
)]
pub struct ApiDoc;

async fn serve_openapi_spec() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Serves the Swagger UI HTML page pointing at the generated document.
async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Lead Generation API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.json",
                dom_id: '#swagger-ui',
                deepLinking: true
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}

/// Builds the full application router.
///
/// The lead routes are mounted at `/generate-leads` and under `/api` for
/// the existing web front end.
pub fn build_router(state: Arc<AppState>) -> Router {
    let lead_routes = Router::new().route(
        "/generate-leads",
        post(handlers::generate_leads).get(handlers::proxy_health),
    );

    let protected_routes = Router::new()
        .merge(lead_routes.clone())
        .nest("/api", lead_routes)
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/docs", get(serve_swagger_ui))
        .route("/api-docs/openapi.json", get(serve_openapi_spec))
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
