//! Placement session: one user's interaction with the canvas.
//!
//! A click goes through local pre-checks (signed in, countdown idle, no
//! request already in flight) before a request is sent. Every attempt
//! that is not ignored yields exactly one notification.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use super::api::{CanvasApi, ClientError};
use super::countdown::{CooldownCountdown, TickOutcome};
use super::eyedropper::{ColorPicker, PickUnavailable};
use super::notify::{Notification, NotificationSink};
use crate::api::dto::{PLACED_MESSAGE, PlaceRequest};
use crate::domain::{Color, GridView, Identity, PlacementRecord};
use crate::error::PlacementError;

/// Shown when a request fails for reasons other than a rejection.
pub const PLACE_FAILED_MESSAGE: &str = "Failed to place pixel";

/// Default cooldown assumed until the server says otherwise.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

/// What happened to a click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The server stored the pixel.
    Placed(PlacementRecord),
    /// Refused locally or by the server.
    Rejected(PlacementError),
    /// The request did not get an answer.
    Failed,
    /// Another placement was still in flight; nothing happened.
    Ignored,
}

/// Resets the in-flight flag when dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Client-side state of one user's canvas session.
#[derive(Debug)]
pub struct CanvasSession {
    api: Arc<dyn CanvasApi>,
    notifier: Arc<dyn NotificationSink>,
    identity: RwLock<Option<Identity>>,
    cooldown: Duration,
    view: RwLock<Option<GridView>>,
    countdown: Mutex<CooldownCountdown>,
    selected_color: RwLock<Color>,
    in_flight: AtomicBool,
}

impl CanvasSession {
    /// Creates a session. `identity` is `None` for signed-out visitors.
    #[must_use]
    pub fn new(
        api: Arc<dyn CanvasApi>,
        notifier: Arc<dyn NotificationSink>,
        identity: Option<Identity>,
    ) -> Self {
        Self {
            api,
            notifier,
            identity: RwLock::new(identity),
            cooldown: DEFAULT_COOLDOWN,
            view: RwLock::new(None),
            countdown: Mutex::new(CooldownCountdown::new()),
            selected_color: RwLock::new(Color::black()),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Overrides the cooldown used to start the local countdown.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Signs in or out.
    pub async fn set_identity(&self, identity: Option<Identity>) {
        *self.identity.write().await = identity;
        self.countdown.lock().await.start(0);
    }

    /// Current identity.
    pub async fn identity(&self) -> Option<Identity> {
        self.identity.read().await.clone()
    }

    /// Last fetched grid.
    pub async fn view(&self) -> Option<GridView> {
        self.view.read().await.clone()
    }

    /// Seconds left on the local countdown.
    pub async fn remaining_cooldown(&self) -> u64 {
        self.countdown.lock().await.remaining()
    }

    /// Color used by [`CanvasSession::click_selected`].
    pub async fn selected_color(&self) -> Color {
        self.selected_color.read().await.clone()
    }

    /// Sets the selected color from user input (`#RGB`, `#RRGGBB`, with or
    /// without `#`).
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::InvalidColor`] for anything else.
    pub async fn set_selected_color(&self, input: &str) -> Result<Color, PlacementError> {
        let color = Color::from_user_input(input)
            .ok_or_else(|| PlacementError::InvalidColor(input.to_string()))?;
        *self.selected_color.write().await = color.clone();
        Ok(color)
    }

    /// Picks the selected color from the screen.
    ///
    /// # Errors
    ///
    /// Returns [`PickUnavailable`] when the picker cannot deliver; the
    /// selected color is left unchanged.
    pub async fn pick_color(&self, picker: &dyn ColorPicker) -> Result<Color, PickUnavailable> {
        let color = picker.pick_color_from_screen().await?;
        *self.selected_color.write().await = color.clone();
        Ok(color)
    }

    /// Places the selected color at `(x, y)`.
    pub async fn click_selected(&self, x: i64, y: i64) -> ClickOutcome {
        let color = self.selected_color().await;
        self.click_cell(x, y, color.as_str()).await
    }

    /// Attempts to paint `(x, y)` with `color`.
    pub async fn click_cell(&self, x: i64, y: i64, color: &str) -> ClickOutcome {
        let Some(identity) = self.identity().await else {
            return self.reject(PlacementError::Unauthenticated);
        };
        let remaining = self.remaining_cooldown().await;
        if remaining > 0 {
            return self.reject(PlacementError::OnCooldown {
                remaining_seconds: remaining,
            });
        }
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            return ClickOutcome::Ignored;
        };

        let request = PlaceRequest {
            x,
            y,
            color: color.to_string(),
            user_id: Some(identity.id.as_str().to_string()),
            username: Some(identity.username.clone()),
        };
        match self.api.place(request).await {
            Ok(record) => {
                self.notifier.notify(Notification::success(PLACED_MESSAGE));
                self.countdown.lock().await.start(self.cooldown.as_secs());
                self.refresh_grid().await;
                self.refresh_cooldown().await;
                ClickOutcome::Placed(record)
            }
            Err(ClientError::Rejected(err)) => {
                if let PlacementError::OnCooldown { remaining_seconds } = err {
                    self.countdown.lock().await.start(remaining_seconds);
                }
                self.reject(err)
            }
            Err(err) => {
                tracing::warn!(error = %err, x, y, "placement request failed");
                self.notifier.notify(Notification::error(PLACE_FAILED_MESSAGE));
                ClickOutcome::Failed
            }
        }
    }

    fn reject(&self, err: PlacementError) -> ClickOutcome {
        self.notifier.notify(Notification::error(err.to_string()));
        ClickOutcome::Rejected(err)
    }

    /// Replaces the local grid with the server's. Returns `false` (and
    /// keeps the old grid) on failure.
    pub async fn refresh_grid(&self) -> bool {
        match self.api.fetch_grid().await {
            Ok(grid) => {
                *self.view.write().await = Some(grid);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "grid refresh failed");
                false
            }
        }
    }

    /// Reconciles the local countdown with the server. Signed-out
    /// sessions have nothing to reconcile.
    pub async fn refresh_cooldown(&self) -> bool {
        let Some(identity) = self.identity().await else {
            return true;
        };
        match self.api.cooldown(&identity.id).await {
            Ok(status) => {
                self.countdown.lock().await.reconcile(status);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "cooldown refresh failed");
                false
            }
        }
    }

    /// Advances the local countdown by one second.
    pub async fn tick(&self) -> TickOutcome {
        self.countdown.lock().await.tick()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use futures_util::future::BoxFuture;

    use super::*;
    use crate::client::api::LocalCanvasApi;
    use crate::client::notify::{RecordingSink, Severity};
    use crate::domain::{CooldownStatus, UserId};
    use crate::service::PlacementService;

    fn local() -> (Arc<PlacementService>, Arc<dyn CanvasApi>) {
        let service = Arc::new(PlacementService::new(20, 20, Duration::from_secs(30), 0));
        let api: Arc<dyn CanvasApi> = Arc::new(LocalCanvasApi::new(Arc::clone(&service)));
        (service, api)
    }

    fn alice() -> Option<Identity> {
        Some(Identity::new("u1", "alice"))
    }

    /// Counts calls and fails every placement with a transport error.
    #[derive(Debug, Default)]
    struct OfflineApi {
        places: AtomicUsize,
    }

    impl CanvasApi for OfflineApi {
        fn fetch_grid(&self) -> BoxFuture<'_, Result<GridView, ClientError>> {
            Box::pin(async { Err(ClientError::TransientNetworkFailure("offline".into())) })
        }
        fn place(&self, _request: PlaceRequest) -> BoxFuture<'_, Result<PlacementRecord, ClientError>> {
            self.places.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Err(ClientError::TransientNetworkFailure("offline".into())) })
        }
        fn cooldown(&self, _user_id: &UserId) -> BoxFuture<'_, Result<CooldownStatus, ClientError>> {
            Box::pin(async { Err(ClientError::TransientNetworkFailure("offline".into())) })
        }
    }

    #[derive(Debug)]
    struct FixedPicker(&'static str);

    impl ColorPicker for FixedPicker {
        fn pick_color_from_screen(&self) -> BoxFuture<'_, Result<Color, PickUnavailable>> {
            Box::pin(async move { Color::parse(self.0).map_err(|_| PickUnavailable::Cancelled) })
        }
    }

    #[tokio::test]
    async fn signed_out_click_sends_nothing() {
        let api = Arc::new(OfflineApi::default());
        let sink = Arc::new(RecordingSink::new());
        let session = CanvasSession::new(Arc::clone(&api) as Arc<dyn CanvasApi>, Arc::clone(&sink) as Arc<dyn NotificationSink>, None);

        let outcome = session.click_cell(1, 1, "#FF0000").await;
        assert_eq!(outcome, ClickOutcome::Rejected(PlacementError::Unauthenticated));
        assert_eq!(api.places.load(Ordering::SeqCst), 0);
        let seen = sink.take();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen.first().map(|n| n.message.as_str()), Some("Please sign in to place pixels"));
    }

    #[tokio::test]
    async fn success_starts_countdown_and_refreshes_grid() {
        let (_service, api) = local();
        let sink = Arc::new(RecordingSink::new());
        let session = CanvasSession::new(api, Arc::clone(&sink) as Arc<dyn NotificationSink>, alice());

        let ClickOutcome::Placed(record) = session.click_cell(3, 4, "#00FF00").await else {
            panic!("placement should succeed");
        };
        assert_eq!((record.x, record.y), (3, 4));

        let seen = sink.take();
        assert_eq!(seen.len(), 1);
        let Some(toast) = seen.first() else {
            panic!("one toast expected");
        };
        assert_eq!(toast.severity, Severity::Success);
        assert_eq!(toast.duration_ms, 3000);

        let remaining = session.remaining_cooldown().await;
        assert!(remaining > 0 && remaining <= 30);
        let Some(view) = session.view().await else {
            panic!("grid should have been refreshed");
        };
        assert_eq!(view.total_pixels, 1);
    }

    #[tokio::test]
    async fn local_countdown_blocks_second_click() {
        let (service, api) = local();
        let sink = Arc::new(RecordingSink::new());
        let session = CanvasSession::new(api, Arc::clone(&sink) as Arc<dyn NotificationSink>, alice());

        assert!(matches!(session.click_cell(0, 0, "#000000").await, ClickOutcome::Placed(_)));
        sink.take();

        let outcome = session.click_cell(1, 0, "#000000").await;
        assert!(matches!(outcome, ClickOutcome::Rejected(PlacementError::OnCooldown { .. })));
        let seen = sink.take();
        assert_eq!(seen.len(), 1);
        assert!(seen.iter().all(|n| n.message.starts_with("Please wait")));
        assert_eq!(service.grid().await.total_pixels, 1);
    }

    #[tokio::test]
    async fn server_cooldown_rejection_reconciles_countdown() {
        let (service, api) = local();
        // Placed elsewhere (another tab): the server knows, this session does not.
        assert!(service.place(alice().as_ref(), 9, 9, "#ABCDEF").await.is_ok());

        let sink = Arc::new(RecordingSink::new());
        let session = CanvasSession::new(api, Arc::clone(&sink) as Arc<dyn NotificationSink>, alice());
        assert_eq!(session.remaining_cooldown().await, 0);

        let outcome = session.click_cell(1, 1, "#000000").await;
        assert!(matches!(outcome, ClickOutcome::Rejected(PlacementError::OnCooldown { .. })));
        assert!(session.remaining_cooldown().await > 0);
        assert_eq!(sink.take().len(), 1);
    }

    #[tokio::test]
    async fn invalid_placement_reports_reason() {
        let (_service, api) = local();
        let sink = Arc::new(RecordingSink::new());
        let session = CanvasSession::new(api, Arc::clone(&sink) as Arc<dyn NotificationSink>, alice());

        let outcome = session.click_cell(20, 0, "#000000").await;
        assert_eq!(
            outcome,
            ClickOutcome::Rejected(PlacementError::OutOfBounds { x: 20, y: 0 })
        );
        assert_eq!(session.remaining_cooldown().await, 0);
        assert_eq!(sink.take().len(), 1);
    }

    #[tokio::test]
    async fn transport_failure_is_reported_once() {
        let api = Arc::new(OfflineApi::default());
        let sink = Arc::new(RecordingSink::new());
        let session = CanvasSession::new(Arc::clone(&api) as Arc<dyn CanvasApi>, Arc::clone(&sink) as Arc<dyn NotificationSink>, alice());

        assert_eq!(session.click_cell(1, 1, "#FF0000").await, ClickOutcome::Failed);
        assert_eq!(api.places.load(Ordering::SeqCst), 1);
        let seen = sink.take();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen.first().map(|n| n.message.as_str()), Some(PLACE_FAILED_MESSAGE));
        assert_eq!(session.remaining_cooldown().await, 0);
        assert!(!session.refresh_grid().await);
    }

    #[tokio::test]
    async fn in_flight_click_is_ignored() {
        let (_service, api) = local();
        let sink = Arc::new(RecordingSink::new());
        let session = CanvasSession::new(api, Arc::clone(&sink) as Arc<dyn NotificationSink>, alice());

        let held = InFlight::acquire(&session.in_flight);
        assert!(held.is_some());
        assert_eq!(session.click_cell(1, 1, "#FF0000").await, ClickOutcome::Ignored);
        assert!(sink.take().is_empty());
        drop(held);
        assert!(matches!(session.click_cell(1, 1, "#FF0000").await, ClickOutcome::Placed(_)));
    }

    #[tokio::test]
    async fn color_selection() {
        let (_service, api) = local();
        let session = CanvasSession::new(api, Arc::new(RecordingSink::new()), alice());

        let Ok(color) = session.set_selected_color("F0A").await else {
            panic!("short hex should expand");
        };
        assert_eq!(color.as_str(), "#FF00AA");
        assert!(session.set_selected_color("#12345").await.is_err());
        assert_eq!(session.selected_color().await.as_str(), "#FF00AA");

        assert!(session.pick_color(&FixedPicker("#102030")).await.is_ok());
        assert_eq!(session.selected_color().await.as_str(), "#102030");
        assert!(matches!(
            session.click_selected(2, 2).await,
            ClickOutcome::Placed(r) if r.color.as_str() == "#102030"
        ));
    }
}
