use crate::pages::{NavSection, PageContent, PageView, midnight, navigation};
use crate::{AppState, error::AppError};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use core_types::{Chain, Resolution, VolumeTable};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct VolumeParams {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub resolution: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub instances_created: u64,
    pub queries_executed: u64,
    pub queries_failed: u64,
    pub open_connections: u32,
    pub max_connections: u32,
}

/// # GET /api/navigation
pub async fn get_navigation(State(state): State<Arc<AppState>>) -> Json<Vec<NavSection>> {
    Json(navigation(&state.pages))
}

/// # GET /api/pages/:slug
/// Runs the page's fixed query and builds its chart, if it has one.
pub async fn get_page(
    Path(slug): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PageView>, AppError> {
    let page = state
        .pages
        .iter()
        .find(|p| p.slug == slug)
        .ok_or_else(|| AppError::NotFound(format!("No page named '{}'", slug)))?;

    let view = match &page.content {
        PageContent::Markdown(markdown) => PageView {
            title: page.title,
            markdown: Some(*markdown),
            table: None,
            chart: None,
        },
        PageContent::Volume(panel) => {
            tracing::info!(page = page.slug, chain = %panel.chain, "Fetching page data.");
            let (start, end) = panel.window();
            let table = state
                .service
                .get_volume(panel.chain, start, end, panel.resolution)
                .await?;
            let chart = panel
                .chart
                .as_ref()
                .map(|spec| spec.render(&table))
                .transpose()
                .map_err(AppError::Chart)?;
            PageView {
                title: page.title,
                markdown: None,
                table: Some(table),
                chart,
            }
        }
    };

    Ok(Json(view))
}

/// # GET /api/volume/:chain?start=YYYY-MM-DD&end=YYYY-MM-DD&resolution=daily
pub async fn get_volume(
    Path(chain): Path<String>,
    Query(params): Query<VolumeParams>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<VolumeTable>, AppError> {
    let chain: Chain = chain
        .parse()
        .map_err(|e: core_types::CoreError| AppError::BadRequest(e.to_string()))?;
    let resolution: Resolution = match params.resolution.as_deref() {
        Some(raw) => raw
            .parse()
            .map_err(|e: core_types::CoreError| AppError::BadRequest(e.to_string()))?,
        None => Resolution::default(),
    };

    let table = state
        .service
        .get_volume(chain, midnight(params.start), midnight(params.end), resolution)
        .await?;
    Ok(Json(table))
}

/// # GET /api/metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    let metrics = state.service.metrics();
    Json(MetricsSnapshot {
        instances_created: metrics.instances_created(),
        queries_executed: metrics.queries_executed(),
        queries_failed: metrics.queries_failed(),
        open_connections: state.service.open_connections(),
        max_connections: state.service.max_connections(),
    })
}
