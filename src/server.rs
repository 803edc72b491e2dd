use crate::charts::render_charts;
use crate::config::Settings;
use crate::model::{Analysis, Dataset};
use crate::page;
use crate::stats::{self, EmptyDatasetError};
use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Clone)]
pub struct AppState {
    pub dataset: Dataset,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(dataset: Dataset, settings: Settings) -> Self {
        Self {
            dataset,
            settings: Arc::new(settings),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    EmptyDataset(#[from] EmptyDatasetError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::EmptyDataset(_) => (StatusCode::UNPROCESSABLE_ENTITY, "EMPTY_DATASET"),
        };
        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));
        (status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/analyze", post(analyze_page))
        .route("/api/analysis", get(analysis_json))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn serve(settings: Settings, dataset: Dataset) -> anyhow::Result<()> {
    let bind_addr = settings.bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(
        addr = %listener.local_addr().context("listener has no local address")?,
        rows = dataset.len(),
        "serving"
    );

    let app = build_router(AppState::new(dataset, settings));
    axum::serve(listener, app).await.context("server stopped")?;
    Ok(())
}

async fn index() -> Html<String> {
    debug!("GET /");
    Html(page::index_page())
}

async fn analyze_page(State(state): State<AppState>) -> Response {
    debug!("POST /analyze");
    let analysis = match run_analysis(&state) {
        Ok(analysis) => analysis,
        Err(err) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(page::error_page(&err.to_string())),
            )
                .into_response();
        }
    };

    // pixel drawing and png encoding are cpu bound
    let rendered = tokio::task::spawn_blocking(move || {
        render_charts(&analysis).map(|charts| (analysis, charts))
    })
    .await;

    match rendered {
        Ok(Ok((analysis, charts))) => {
            Html(page::results_page(&analysis, &charts, page::current_year())).into_response()
        }
        Ok(Err(err)) => chart_failure(format!("{err:#}")),
        Err(err) => chart_failure(err.to_string()),
    }
}

fn chart_failure(reason: String) -> Response {
    error!(error = %reason, "chart rendering failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(page::error_page("Charts could not be rendered.")),
    )
        .into_response()
}

async fn analysis_json(State(state): State<AppState>) -> Result<Json<Analysis>, ApiError> {
    debug!("GET /api/analysis");
    Ok(Json(run_analysis(&state)?))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        module: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn run_analysis(state: &AppState) -> Result<Analysis, EmptyDatasetError> {
    let analysis = stats::analyze(&state.dataset, &state.settings.analysis_options())?;
    info!(
        total_plays = analysis.summary.total_plays,
        total_songs = analysis.summary.total_songs,
        "analysis ready"
    );
    Ok(analysis)
}
