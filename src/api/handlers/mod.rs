//! REST endpoint handlers organized by resource.

pub mod canvas;
pub mod placement;
pub mod snapshot;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(canvas::routes())
        .merge(placement::routes())
        .merge(snapshot::routes())
}
