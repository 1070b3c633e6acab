//! The client's view of the canvas server.
//!
//! [`CanvasApi`] is what the session and sync loop talk to.
//! [`HttpCanvasApi`] speaks the REST API with `reqwest`;
//! [`LocalCanvasApi`] calls a [`PlacementService`] in the same process.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use reqwest::StatusCode;

use crate::api::dto::{CanvasResponse, PlaceFailureResponse, PlaceRequest, PlaceSuccessResponse};
use crate::domain::{CooldownStatus, GridView, Identity, PlacementRecord, UserId};
use crate::error::PlacementError;
use crate::service::PlacementService;

/// Client-side failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The server refused the placement.
    #[error(transparent)]
    Rejected(#[from] PlacementError),

    /// The server could not be reached or failed internally; worth trying
    /// again later.
    #[error("network failure: {0}")]
    TransientNetworkFailure(String),

    /// The server answered with something this client does not understand.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Operations the client needs from the server.
pub trait CanvasApi: Send + Sync + std::fmt::Debug {
    /// Fetches the whole grid.
    fn fetch_grid(&self) -> BoxFuture<'_, Result<GridView, ClientError>>;

    /// Attempts a placement.
    fn place(&self, request: PlaceRequest) -> BoxFuture<'_, Result<PlacementRecord, ClientError>>;

    /// Fetches the cooldown status of `user_id`.
    fn cooldown(&self, user_id: &UserId) -> BoxFuture<'_, Result<CooldownStatus, ClientError>>;
}

/// [`CanvasApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCanvasApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCanvasApi {
    /// Creates a client for the server at `base_url` (e.g.
    /// `http://localhost:3000`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a client reusing an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }
}

fn transport(e: &reqwest::Error) -> ClientError {
    ClientError::TransientNetworkFailure(e.to_string())
}

fn decode(e: &reqwest::Error) -> ClientError {
    ClientError::UnexpectedResponse(e.to_string())
}

fn unexpected_status(status: StatusCode) -> ClientError {
    if status.is_server_error() {
        ClientError::TransientNetworkFailure(format!("server returned {status}"))
    } else {
        ClientError::UnexpectedResponse(format!("server returned {status}"))
    }
}

/// Maps a placement rejection body back to the typed error.
///
/// The body carries the kind and the cooldown; coordinates and color are
/// taken from the request that was sent.
fn rejection(body: PlaceFailureResponse, request: &PlaceRequest) -> ClientError {
    let err = match body.error_kind.as_str() {
        "unauthenticated" => PlacementError::Unauthenticated,
        "on_cooldown" => PlacementError::OnCooldown {
            remaining_seconds: body.remaining_cooldown.unwrap_or(0),
        },
        "out_of_bounds" => PlacementError::OutOfBounds {
            x: request.x,
            y: request.y,
        },
        "invalid_color" => PlacementError::InvalidColor(request.color.clone()),
        other => {
            return ClientError::UnexpectedResponse(format!("unknown rejection kind {other:?}"));
        }
    };
    ClientError::Rejected(err)
}

impl CanvasApi for HttpCanvasApi {
    fn fetch_grid(&self) -> BoxFuture<'_, Result<GridView, ClientError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(self.url("/canvas"))
                .send()
                .await
                .map_err(|e| transport(&e))?;
            if !response.status().is_success() {
                return Err(unexpected_status(response.status()));
            }
            let body: CanvasResponse = response.json().await.map_err(|e| decode(&e))?;
            Ok(body.into())
        })
    }

    fn place(&self, request: PlaceRequest) -> BoxFuture<'_, Result<PlacementRecord, ClientError>> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.url("/canvas/place"))
                .json(&request)
                .send()
                .await
                .map_err(|e| transport(&e))?;
            let status = response.status();
            if status.is_success() {
                let body: PlaceSuccessResponse = response.json().await.map_err(|e| decode(&e))?;
                return Ok(body.pixel);
            }
            if matches!(
                status,
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::TOO_MANY_REQUESTS
            ) {
                let body: PlaceFailureResponse = response.json().await.map_err(|e| decode(&e))?;
                return Err(rejection(body, &request));
            }
            Err(unexpected_status(status))
        })
    }

    fn cooldown(&self, user_id: &UserId) -> BoxFuture<'_, Result<CooldownStatus, ClientError>> {
        let user_id = user_id.clone();
        Box::pin(async move {
            let url = reqwest::Url::parse_with_params(
                &self.url("/canvas/cooldown"),
                &[("userId", user_id.as_str())],
            )
            .map_err(|e| ClientError::UnexpectedResponse(format!("bad base url: {e}")))?;
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| transport(&e))?;
            if !response.status().is_success() {
                return Err(unexpected_status(response.status()));
            }
            response.json().await.map_err(|e| decode(&e))
        })
    }
}

/// [`CanvasApi`] calling a [`PlacementService`] directly.
#[derive(Debug, Clone)]
pub struct LocalCanvasApi {
    service: Arc<PlacementService>,
}

impl LocalCanvasApi {
    /// Wraps `service`.
    #[must_use]
    pub fn new(service: Arc<PlacementService>) -> Self {
        Self { service }
    }
}

impl CanvasApi for LocalCanvasApi {
    fn fetch_grid(&self) -> BoxFuture<'_, Result<GridView, ClientError>> {
        Box::pin(async move { Ok(self.service.grid().await) })
    }

    fn place(&self, request: PlaceRequest) -> BoxFuture<'_, Result<PlacementRecord, ClientError>> {
        Box::pin(async move {
            let identity = Identity::from_parts(request.user_id, request.username);
            Ok(self
                .service
                .place(identity.as_ref(), request.x, request.y, &request.color)
                .await?)
        })
    }

    fn cooldown(&self, user_id: &UserId) -> BoxFuture<'_, Result<CooldownStatus, ClientError>> {
        let user_id = user_id.clone();
        Box::pin(async move { Ok(self.service.cooldown_status(&user_id).await) })
    }
}
