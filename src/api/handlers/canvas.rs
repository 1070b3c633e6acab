//! Canvas read handlers: grid, cooldown status, pixel provenance.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{CanvasResponse, CooldownQuery, PixelResponse};
use crate::app_state::AppState;
use crate::domain::{CooldownStatus, UserId};
use crate::error::{CanvasError, ErrorResponse};

/// `GET /canvas` — Full grid and stats.
#[utoipa::path(
    get,
    path = "/api/v1/canvas",
    tag = "Canvas",
    summary = "Get the canvas",
    description = "Returns every cell color (row-major, null for background) with the aggregate counters. Clients poll this endpoint and replace their local copy wholesale.",
    responses(
        (status = 200, description = "Current canvas", body = CanvasResponse),
    )
)]
pub async fn get_canvas(State(state): State<AppState>) -> Json<CanvasResponse> {
    Json(state.placement_service.grid().await.into())
}

/// `GET /canvas/cooldown?userId=` — Cooldown status of one user.
///
/// # Errors
///
/// Returns [`CanvasError::InvalidRequest`] when `userId` is missing.
#[utoipa::path(
    get,
    path = "/api/v1/canvas/cooldown",
    tag = "Canvas",
    summary = "Get a user's cooldown",
    description = "Reports whether the user may place a pixel now and, if not, how many whole seconds remain.",
    params(CooldownQuery),
    responses(
        (status = 200, description = "Cooldown status", body = CooldownStatus),
        (status = 400, description = "Missing userId", body = ErrorResponse),
    )
)]
pub async fn get_cooldown(
    State(state): State<AppState>,
    Query(query): Query<CooldownQuery>,
) -> Result<Json<CooldownStatus>, CanvasError> {
    let user_id = query
        .user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| CanvasError::InvalidRequest("userId is required".to_string()))?;
    let status = state
        .placement_service
        .cooldown_status(&UserId::new(user_id))
        .await;
    Ok(Json(status))
}

/// `GET /canvas/pixels/{x}/{y}` — Who painted a cell, and when.
///
/// # Errors
///
/// Returns [`CanvasError::PixelNotPlaced`] if the cell is background or
/// outside the grid.
#[utoipa::path(
    get,
    path = "/api/v1/canvas/pixels/{x}/{y}",
    tag = "Canvas",
    summary = "Get pixel provenance",
    params(
        ("x" = u32, Path, description = "Column"),
        ("y" = u32, Path, description = "Row"),
    ),
    responses(
        (status = 200, description = "Painted cell", body = PixelResponse),
        (status = 404, description = "Cell never painted", body = ErrorResponse),
    )
)]
pub async fn get_pixel(
    State(state): State<AppState>,
    Path((x, y)): Path<(u32, u32)>,
) -> Result<Json<PixelResponse>, CanvasError> {
    let cell = state
        .placement_service
        .cell(x, y)
        .await
        .ok_or(CanvasError::PixelNotPlaced { x, y })?;
    Ok(Json(PixelResponse { x, y, cell }))
}

/// Canvas read routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/canvas", get(get_canvas))
        .route("/canvas/cooldown", get(get_cooldown))
        .route("/canvas/pixels/{x}/{y}", get(get_pixel))
}
