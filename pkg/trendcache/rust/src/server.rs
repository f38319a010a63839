// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! HTTP surface consumed by the chart component.

use crate::backend::HostStatus;
use crate::errors::Error;
use crate::range::DisplayRange;
use crate::session::{RangeRequest, RenderFrame, Session, Toggle, Tooltip};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Library error rendered as a JSON body with a matching status code.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidRange { .. } => StatusCode::BAD_REQUEST,
            Error::SelectionFull { .. } | Error::Overlaps { .. } => StatusCode::CONFLICT,
            Error::NoData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Transport(_) | Error::Decode { .. } => StatusCode::BAD_GATEWAY,
        };
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    revision: u64,
}

#[derive(Debug, Deserialize)]
pub struct TooltipQuery {
    pub x: f64,
    pub width: f64,
}

#[derive(Debug, Deserialize)]
pub struct ZoomRequest {
    pub x_start: f64,
    pub x_end: f64,
    pub width: f64,
}

#[derive(Debug, Serialize)]
pub struct ZoomResponse {
    /// False when the selection was too narrow and the range is unchanged.
    pub applied: bool,
    pub range: DisplayRange,
}

pub fn router(session: Arc<Session>) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/frame", get(frame_handler))
        .route("/api/tooltip", get(tooltip_handler))
        .route("/api/range", post(range_handler))
        .route("/api/range/reset", post(reset_range_handler))
        .route("/api/range/custom", post(custom_range_handler))
        .route("/api/zoom", post(zoom_handler))
        .route("/api/hosts/{host}/toggle", post(toggle_handler))
        .route("/api/status", get(status_handler))
        .with_state(session)
}

/// Serve the API until Ctrl+C.
pub async fn run_server(session: Arc<Session>, port: u16) -> anyhow::Result<()> {
    let app = router(session);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "trendcache listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    Ok(())
}

async fn health_handler(State(session): State<Arc<Session>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        revision: session.revision(),
    })
}

async fn frame_handler(State(session): State<Arc<Session>>) -> Json<RenderFrame> {
    Json(session.frame().await)
}

async fn tooltip_handler(
    State(session): State<Arc<Session>>,
    Query(query): Query<TooltipQuery>,
) -> Json<Option<Tooltip>> {
    Json(session.tooltip(query.x, query.width).await)
}

async fn range_handler(
    State(session): State<Arc<Session>>,
    Json(request): Json<RangeRequest>,
) -> Result<Json<DisplayRange>, ApiError> {
    Ok(Json(session.set_range(request).await?))
}

async fn reset_range_handler(State(session): State<Arc<Session>>) -> Json<DisplayRange> {
    Json(session.reset_range().await)
}

async fn custom_range_handler(State(session): State<Arc<Session>>) -> Json<RenderFrame> {
    session.open_custom_range().await;
    Json(session.frame().await)
}

async fn zoom_handler(
    State(session): State<Arc<Session>>,
    Json(request): Json<ZoomRequest>,
) -> Result<Json<ZoomResponse>, ApiError> {
    let zoomed = session
        .zoom(request.x_start, request.x_end, request.width)
        .await?;
    let response = match zoomed {
        Some(range) => ZoomResponse {
            applied: true,
            range,
        },
        None => ZoomResponse {
            applied: false,
            range: session.range().await,
        },
    };
    Ok(Json(response))
}

async fn toggle_handler(
    State(session): State<Arc<Session>>,
    Path(host): Path<String>,
) -> Result<Json<Toggle>, ApiError> {
    Ok(Json(session.toggle_host(&host).await?))
}

async fn status_handler(State(session): State<Arc<Session>>) -> Json<Vec<HostStatus>> {
    Json(session.status().await)
}
