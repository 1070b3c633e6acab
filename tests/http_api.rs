//! End-to-end tests: the REST API served on an ephemeral port, driven with
//! `reqwest` and with the client's `HttpCanvasApi`.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pixel_canvas::api;
use pixel_canvas::app_state::AppState;
use pixel_canvas::client::{CanvasApi, CanvasSession, ClickOutcome, ClientError, HttpCanvasApi, RecordingSink};
use pixel_canvas::domain::{Identity, UserId};
use pixel_canvas::error::PlacementError;
use pixel_canvas::persistence::{CanvasStore, MemoryStore};
use pixel_canvas::service::{PlacementService, SnapshotScheduler};
use serde_json::{Value, json};

const SECRET: &str = "cron-secret";

async fn spawn_app() -> SocketAddr {
    let service = Arc::new(PlacementService::new(16, 16, Duration::from_secs(30), 0));
    let store: Arc<dyn CanvasStore> = Arc::new(MemoryStore::new());
    let scheduler = Arc::new(SnapshotScheduler::new(Arc::clone(&service), store));
    let state = AppState {
        placement_service: service,
        snapshot_scheduler: scheduler,
        cron_secret: Some(Arc::from(SECRET)),
    };
    let app = api::build_router().with_state(state);

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{addr}{path}")
}

async fn json_of(response: reqwest::Response) -> Value {
    let Ok(body) = response.json::<Value>().await else {
        panic!("body is not JSON");
    };
    body
}

#[tokio::test]
async fn place_then_read_back() {
    let addr = spawn_app().await;
    let http = reqwest::Client::new();

    let Ok(response) = http
        .post(url(addr, "/api/v1/canvas/place"))
        .json(&json!({"x": 10, "y": 10, "color": "#FF0000", "userId": "u1", "username": "alice"}))
        .send()
        .await
    else {
        panic!("request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body = json_of(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Pixel placed successfully!"));
    assert_eq!(body["pixel"]["userId"], json!("u1"));

    let Ok(response) = http.get(url(addr, "/api/v1/canvas")).send().await else {
        panic!("request failed");
    };
    let canvas = json_of(response).await;
    assert_eq!(canvas["grid"][10][10], json!("#FF0000"));
    assert_eq!(canvas["grid"][0][0], Value::Null);
    assert_eq!(canvas["totalPixels"], json!(1));
    assert_eq!(canvas["uniqueUsers"], json!(1));
    assert_eq!(canvas["canvasSize"], json!(16));

    let Ok(response) = http.get(url(addr, "/api/v1/canvas/pixels/10/10")).send().await else {
        panic!("request failed");
    };
    let pixel = json_of(response).await;
    assert_eq!(pixel["placedByName"], json!("alice"));

    let Ok(response) = http.get(url(addr, "/api/v1/canvas/pixels/0/0")).send().await else {
        panic!("request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rejections_carry_status_and_kind() {
    let addr = spawn_app().await;
    let http = reqwest::Client::new();
    let place = |body: Value| {
        let http = http.clone();
        async move {
            let Ok(response) = http
                .post(url(addr, "/api/v1/canvas/place"))
                .json(&body)
                .send()
                .await
            else {
                panic!("request failed");
            };
            let status = response.status();
            (status, json_of(response).await)
        }
    };

    let (status, body) = place(json!({"x": 1, "y": 1, "color": "#FF0000"})).await;
    assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
    assert_eq!(body["errorKind"], json!("unauthenticated"));

    let (status, body) =
        place(json!({"x": 16, "y": 1, "color": "#FF0000", "userId": "u2", "username": "bob"})).await;
    assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(body["errorKind"], json!("out_of_bounds"));

    let (status, body) =
        place(json!({"x": 1, "y": 1, "color": "red", "userId": "u2", "username": "bob"})).await;
    assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(body["errorKind"], json!("invalid_color"));

    let (status, _) =
        place(json!({"x": 1, "y": 1, "color": "#00ff00", "userId": "u2", "username": "bob"})).await;
    assert_eq!(status, reqwest::StatusCode::OK);

    let (status, body) =
        place(json!({"x": 2, "y": 2, "color": "#00FF00", "userId": "u2", "username": "bob"})).await;
    assert_eq!(status, reqwest::StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["errorKind"], json!("on_cooldown"));
    assert!(body["remainingCooldown"].as_u64().is_some_and(|s| s > 0 && s <= 30));
}

#[tokio::test]
async fn cooldown_endpoint_requires_user() {
    let addr = spawn_app().await;
    let http = reqwest::Client::new();

    let Ok(response) = http.get(url(addr, "/api/v1/canvas/cooldown")).send().await else {
        panic!("request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let Ok(response) = http
        .get(url(addr, "/api/v1/canvas/cooldown?userId=nobody"))
        .send()
        .await
    else {
        panic!("request failed");
    };
    let body = json_of(response).await;
    assert_eq!(body, json!({"onCooldown": false, "remainingSeconds": 0}));
}

#[tokio::test]
async fn snapshot_trigger_is_guarded_and_idempotent() {
    let addr = spawn_app().await;
    let http = reqwest::Client::new();
    let trigger = url(addr, "/api/v1/canvas/snapshot/trigger");

    let Ok(response) = http.post(&trigger).send().await else {
        panic!("request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);

    let Ok(response) = http.post(&trigger).bearer_auth("wrong").send().await else {
        panic!("request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);

    let Ok(response) = http.post(&trigger).bearer_auth(SECRET).send().await else {
        panic!("request failed");
    };
    let first = json_of(response).await;
    assert_eq!(first["created"], json!(true));

    let Ok(response) = http.post(&trigger).bearer_auth(SECRET).send().await else {
        panic!("request failed");
    };
    let second = json_of(response).await;
    assert_eq!(second["created"], json!(false));
    assert_eq!(second["period"], first["period"]);

    let Ok(response) = http.get(url(addr, "/api/v1/canvas/snapshots")).send().await else {
        panic!("request failed");
    };
    let list = json_of(response).await;
    assert_eq!(list["periods"], json!([first["period"].clone()]));

    let Some(period) = first["period"].as_str() else {
        panic!("period should be a string");
    };
    let Ok(response) = http
        .get(url(addr, &format!("/api/v1/canvas/snapshots/{period}")))
        .send()
        .await
    else {
        panic!("request failed");
    };
    let snapshot = json_of(response).await;
    assert_eq!(snapshot["id"], json!(format!("snapshot-{period}")));
    assert!(snapshot["svg"].as_str().is_some_and(|s| s.starts_with("<svg")));

    let Ok(response) = http.get(url(addr, "/api/v1/canvas/snapshot")).send().await else {
        panic!("request failed");
    };
    let display = json_of(response).await;
    assert_eq!(display["snapshot"]["period"], json!(period));

    let Ok(response) = http
        .get(url(addr, "/api/v1/canvas/snapshots/not-a-week"))
        .send()
        .await
    else {
        panic!("request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_client_against_live_server() {
    let addr = spawn_app().await;
    let api = Arc::new(HttpCanvasApi::new(format!("http://{addr}")));

    let Ok(grid) = api.fetch_grid().await else {
        panic!("grid fetch failed");
    };
    assert_eq!((grid.width, grid.height), (16, 16));

    let sink = Arc::new(RecordingSink::new());
    let session = CanvasSession::new(
        Arc::clone(&api) as Arc<dyn CanvasApi>,
        Arc::clone(&sink) as Arc<dyn pixel_canvas::client::NotificationSink>,
        Some(Identity::new("u9", "carol")),
    );
    let ClickOutcome::Placed(record) = session.click_cell(3, 3, "#0000FF").await else {
        panic!("placement should succeed");
    };
    assert_eq!(record.color.as_str(), "#0000FF");
    assert!(session.remaining_cooldown().await > 0);
    assert_eq!(sink.take().len(), 1);

    let Ok(status) = api.cooldown(&UserId::from("u9")).await else {
        panic!("cooldown fetch failed");
    };
    assert!(status.on_cooldown);

    let rejected = api
        .place(pixel_canvas::api::dto::PlaceRequest {
            x: 99,
            y: 0,
            color: "#000000".to_string(),
            user_id: Some("u10".to_string()),
            username: Some("dave".to_string()),
        })
        .await;
    assert_eq!(
        rejected,
        Err(ClientError::Rejected(PlacementError::OutOfBounds { x: 99, y: 0 }))
    );

    let offline = HttpCanvasApi::new("http://127.0.0.1:9");
    assert!(matches!(
        offline.fetch_grid().await,
        Err(ClientError::TransientNetworkFailure(_))
    ));
}

#[tokio::test]
async fn health_reports_ok() {
    let addr = spawn_app().await;
    let Ok(response) = reqwest::get(url(addr, "/health")).await else {
        panic!("request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body = json_of(response).await;
    assert_eq!(body["status"], json!("healthy"));
}
