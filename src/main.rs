mod business_logic;
mod errors;
mod handlers;
mod models;
mod services;
mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::business_logic::confidence::ConfidenceEstimator;
use crate::business_logic::config::ScreenerConfig;
use crate::handlers::double_bottom::{
    get_double_bottom_status, get_double_bottom_stream, post_double_bottom_outcome,
    OutcomeRequest, OutcomeResponse,
};
use crate::models::pattern::{AlertTier, AssetPatternStatus, DoubleBottomResponse, Outcome};
use crate::services::datafeed::CoinGeckoClient;
use crate::services::notifier::TracingNotifier;
use crate::services::scan_state::new_shared_state;
use crate::services::scanner::ScannerService;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::double_bottom::get_double_bottom_status,
        handlers::double_bottom::get_double_bottom_stream,
        handlers::double_bottom::post_double_bottom_outcome
    ),
    components(schemas(
        models::health::HealthResponse,
        DoubleBottomResponse,
        AssetPatternStatus,
        AlertTier,
        Outcome,
        OutcomeRequest,
        OutcomeResponse,
        errors::ErrorResponse
    ))
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing: console plus a daily-rolling log file
    let file_appender = tracing_appender::rolling::daily("logs", "bottomscreener.log");
    let (file_writer, _log_guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bottomscreener=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    let config = ScreenerConfig::from_env();
    tracing::info!(
        "Screening config: tolerance {:.0}%, spacing {:.0}-{:.0}d, cycle every {}m",
        config.tolerance_fraction * 100.0,
        config.min_spacing_days,
        config.max_spacing_days,
        config.cycle_minutes
    );

    let scan_state = new_shared_state(16);
    let estimator = Arc::new(ConfidenceEstimator::new());

    // Start double bottom scanning in background
    let scanner = ScannerService::new(
        Arc::new(CoinGeckoClient::new(&config)),
        Arc::new(TracingNotifier),
        estimator.clone(),
        config,
        scan_state.clone(),
    );
    tokio::spawn(async move {
        tracing::info!("Double bottom scanner active");
        scanner.run().await;
    });

    let app_state = AppState {
        scan_state,
        estimator,
    };

    // Start web server
    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/double-bottom", get(get_double_bottom_status))
        .route("/double-bottom/stream", get(get_double_bottom_stream))
        .route("/double-bottom/outcome", post(post_double_bottom_outcome))
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    tracing::info!("Server running on http://localhost:3000");
    tracing::info!("Swagger UI: http://localhost:3000/swagger-ui");
    axum::serve(listener, app).await.unwrap();
}
