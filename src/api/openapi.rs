//! OpenAPI document and Swagger UI.

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// Aggregated OpenAPI specification for the canvas API.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        super::handlers::canvas::get_canvas,
        super::handlers::canvas::get_cooldown,
        super::handlers::canvas::get_pixel,
        super::handlers::placement::place_pixel,
        super::handlers::snapshot::get_display_snapshot,
        super::handlers::snapshot::list_snapshots,
        super::handlers::snapshot::get_snapshot,
        super::handlers::snapshot::trigger_snapshot,
        super::handlers::system::health_handler,
    ),
    components(
        schemas(
            super::dto::CanvasResponse,
            super::dto::PixelResponse,
            super::dto::PlaceRequest,
            super::dto::PlaceSuccessResponse,
            super::dto::PlaceFailureResponse,
            super::dto::SnapshotResponse,
            super::dto::SnapshotListResponse,
            super::dto::TriggerResponse,
            super::handlers::system::HealthResponse,
            crate::domain::Cell,
            crate::domain::CooldownStatus,
            crate::domain::PlacementRecord,
            crate::domain::Snapshot,
            crate::error::ErrorResponse,
            crate::error::ErrorBody,
        )
    ),
    tags(
        (name = "Canvas", description = "Grid reads, cooldowns and placement"),
        (name = "Snapshots", description = "Weekly canvas archive"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;

/// Serves the Swagger UI at `/docs` backed by [`ApiDoc`].
#[cfg(feature = "swagger-ui")]
pub fn docs_router() -> Router<AppState> {
    utoipa_swagger_ui::SwaggerUi::new("/docs")
        .url("/api-doc/openapi.json", ApiDoc::openapi())
        .into()
}

/// Serves the raw OpenAPI document when the UI is compiled out.
#[cfg(not(feature = "swagger-ui"))]
pub fn docs_router() -> Router<AppState> {
    use axum::routing::get;
    Router::new().route(
        "/api-doc/openapi.json",
        get(|| async { axum::Json(ApiDoc::openapi()) }),
    )
}
