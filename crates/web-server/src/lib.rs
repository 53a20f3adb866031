use axum::{Router, routing::get};
use configuration::DashboardConfig;
use database::{ServiceMetrics, VolumeQueryService};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod charts;
pub mod error;
pub mod handlers;
pub mod pages;

use pages::Page;

/// The shared application state that all handlers can access.
pub struct AppState {
    pub service: VolumeQueryService,
    pub pages: Vec<Page>,
}

/// Builds the router over an already-constructed state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/navigation", get(handlers::get_navigation))
        .route("/api/pages/:slug", get(handlers::get_page))
        .route("/api/volume/:chain", get(handlers::get_volume))
        .route("/api/metrics", get(handlers::get_metrics))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// The main function to configure and run the web server.
///
/// Tracing must already be initialized by the caller. The volume service is
/// closed once the server stops after Ctrl-C.
pub async fn run_server(config: DashboardConfig) -> anyhow::Result<()> {
    let source = configuration::source_for(&config);
    let service = VolumeQueryService::from_source(
        source.as_ref(),
        config.environment,
        &config.pool,
        Arc::new(ServiceMetrics::new()),
    )?;

    let state = Arc::new(AppState {
        service,
        pages: pages::default_pages(),
    });
    let app = router(state.clone());

    let addr = config.server.addr;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.service.close().await;
    tracing::info!("Web server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C.");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received.");
}
