//! Placement handler.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{PlaceFailureResponse, PlaceRequest, PlaceSuccessResponse};
use crate::app_state::AppState;
use crate::domain::Identity;

/// `POST /canvas/place` — Paint one cell.
///
/// Rejections use the placement body shape rather than the generic error
/// envelope so clients can branch on `errorKind` and show the message.
#[utoipa::path(
    post,
    path = "/api/v1/canvas/place",
    tag = "Canvas",
    summary = "Place a pixel",
    description = "Paints one cell for the calling user. Checks run in order: identity, cooldown, coordinates, color. The user's cooldown starts only after the cell is written.",
    request_body = PlaceRequest,
    responses(
        (status = 200, description = "Pixel placed", body = PlaceSuccessResponse),
        (status = 400, description = "Out of bounds or invalid color", body = PlaceFailureResponse),
        (status = 401, description = "No identity supplied", body = PlaceFailureResponse),
        (status = 429, description = "User is on cooldown", body = PlaceFailureResponse),
    )
)]
pub async fn place_pixel(State(state): State<AppState>, Json(req): Json<PlaceRequest>) -> Response {
    let identity = Identity::from_parts(req.user_id, req.username);
    match state
        .placement_service
        .place(identity.as_ref(), req.x, req.y, &req.color)
        .await
    {
        Ok(record) => Json(PlaceSuccessResponse::from(record)).into_response(),
        Err(err) => (err.status_code(), Json(PlaceFailureResponse::from(&err))).into_response(),
    }
}

/// Placement routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/canvas/place", post(place_pixel))
}
