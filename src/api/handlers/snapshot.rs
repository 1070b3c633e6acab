//! Snapshot handlers: display, archive listing, manual trigger.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{SnapshotListResponse, SnapshotResponse, TriggerResponse};
use crate::app_state::AppState;
use crate::domain::{Snapshot, SnapshotPeriod};
use crate::error::{CanvasError, ErrorResponse};

/// `GET /canvas/snapshot` — The snapshot shown to visitors.
///
/// # Errors
///
/// Returns [`CanvasError::PersistenceError`] if the store cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/canvas/snapshot",
    tag = "Snapshots",
    summary = "Get the display snapshot",
    description = "Returns last week's snapshot, or this week's when last week has none.",
    responses(
        (status = 200, description = "Snapshot (possibly absent) with a message", body = SnapshotResponse),
        (status = 500, description = "Store failure", body = ErrorResponse),
    )
)]
pub async fn get_display_snapshot(
    State(state): State<AppState>,
) -> Result<Json<SnapshotResponse>, CanvasError> {
    let now = Utc::now();
    let current = SnapshotPeriod::containing(now);
    let previous = current.previous();
    let snapshot = state.snapshot_scheduler.latest_for_display(now).await?;

    let message = match &snapshot {
        Some(s) if s.period == previous => format!("Showing previous week snapshot ({previous})"),
        Some(_) => {
            format!("Showing current week snapshot ({current}) - no previous week available")
        }
        None => format!("No snapshot available for week {previous} or {current}"),
    };
    Ok(Json(SnapshotResponse { snapshot, message }))
}

/// `GET /canvas/snapshots` — Stored periods.
///
/// # Errors
///
/// Returns [`CanvasError::PersistenceError`] if the store cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/canvas/snapshots",
    tag = "Snapshots",
    summary = "List snapshot periods",
    responses(
        (status = 200, description = "Stored periods, oldest first", body = SnapshotListResponse),
    )
)]
pub async fn list_snapshots(
    State(state): State<AppState>,
) -> Result<Json<SnapshotListResponse>, CanvasError> {
    let periods = state
        .snapshot_scheduler
        .periods()
        .await?
        .iter()
        .map(ToString::to_string)
        .collect();
    Ok(Json(SnapshotListResponse { periods }))
}

/// `GET /canvas/snapshots/{period}` — One archived week.
///
/// # Errors
///
/// Returns [`CanvasError::InvalidRequest`] for a malformed period and
/// [`CanvasError::SnapshotNotFound`] when nothing was archived for it.
#[utoipa::path(
    get,
    path = "/api/v1/canvas/snapshots/{period}",
    tag = "Snapshots",
    summary = "Get a snapshot by period",
    params(("period" = String, Path, description = "ISO week, e.g. 2025-W38")),
    responses(
        (status = 200, description = "Snapshot", body = Snapshot),
        (status = 400, description = "Malformed period", body = ErrorResponse),
        (status = 404, description = "No snapshot for this period", body = ErrorResponse),
    )
)]
pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> Result<Json<Snapshot>, CanvasError> {
    let period: SnapshotPeriod = period
        .parse()
        .map_err(|e| CanvasError::InvalidRequest(format!("{e}")))?;
    Ok(Json(state.snapshot_scheduler.snapshot(period).await?))
}

/// `POST /canvas/snapshot/trigger` — Snapshot now if this week has none.
///
/// Requires `Authorization: Bearer <CRON_SECRET>`. With no secret
/// configured the endpoint always refuses.
///
/// # Errors
///
/// Returns [`CanvasError::Unauthorized`] on a missing or wrong token and
/// [`CanvasError::SnapshotFailure`] if the write fails.
#[utoipa::path(
    post,
    path = "/api/v1/canvas/snapshot/trigger",
    tag = "Snapshots",
    summary = "Trigger the weekly snapshot",
    description = "Requires `Authorization: Bearer <CRON_SECRET>`. Idempotent within a week.",
    responses(
        (status = 200, description = "Snapshot created or already present", body = TriggerResponse),
        (status = 401, description = "Missing or wrong bearer token", body = ErrorResponse),
        (status = 500, description = "Snapshot could not be stored", body = ErrorResponse),
    )
)]
pub async fn trigger_snapshot(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TriggerResponse>, CanvasError> {
    let Some(secret) = state.cron_secret.as_deref() else {
        return Err(CanvasError::Unauthorized);
    };
    if !bearer_matches(&headers, secret) {
        tracing::warn!("snapshot trigger rejected: bad bearer token");
        return Err(CanvasError::Unauthorized);
    }

    let (period, created) = state.snapshot_scheduler.snapshot_now(Utc::now()).await?;
    let message = if created {
        format!("Weekly snapshot saved for week {period}")
    } else {
        format!("Snapshot for week {period} already exists")
    };
    Ok(Json(TriggerResponse {
        created,
        period: period.to_string(),
        message,
    }))
}

/// Whether the `Authorization` header carries `Bearer <secret>`.
fn bearer_matches(headers: &HeaderMap, secret: &str) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.as_bytes().strip_prefix(b"Bearer "))
        .is_some_and(|token| constant_time_eq(token, secret.as_bytes()))
}

/// Compares without stopping at the first differing byte. Only the length
/// is observable through timing.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Snapshot routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/canvas/snapshot", get(get_display_snapshot))
        .route("/canvas/snapshot/trigger", post(trigger_snapshot))
        .route("/canvas/snapshots", get(list_snapshots))
        .route("/canvas/snapshots/{period}", get(get_snapshot))
}
