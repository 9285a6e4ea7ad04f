use rust_leadgen_api::app::build_router;
use rust_leadgen_api::config::Config;
use rust_leadgen_api::handlers::AppState;
use rust_leadgen_api::rate_limit::FixedWindowLimiter;
use rust_leadgen_api::services::LeadService;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes logging, loads configuration, builds the outbound clients and
/// the rate limiter, then starts the Axum server.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Ok if the server runs successfully, or an error if
///   configuration, client setup or binding fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_leadgen_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let lead_service = LeadService::new(&config)?;
    tracing::info!("✓ Search and Gemini clients initialized");

    let rate_limiter = Arc::new(FixedWindowLimiter::with_limits(
        config.rate_limit_max_requests,
        config.rate_limit_window(),
    ));
    tracing::info!(
        "Rate limiter initialized ({} requests per {}s per client)",
        config.rate_limit_max_requests,
        config.rate_limit_window_secs
    );

    let app_state = Arc::new(AppState {
        lead_service,
        rate_limiter,
    });

    let app = build_router(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
