//! Write-behind persistence of the live canvas.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::PlacementService;
use crate::persistence::CanvasStore;

/// Flushes the canvas to `store` every `every` while it is dirty, then
/// once more when `shutdown` flips.
///
/// A failed flush keeps the canvas dirty and is retried on the next tick.
pub async fn run_persister(
    service: Arc<PlacementService>,
    store: Arc<dyn CanvasStore>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tracing::info!(every_secs = every.as_secs(), "canvas persister started");

    loop {
        tokio::select! {
            _ = interval.tick() => flush_once(&service, store.as_ref()).await,
            _ = shutdown.changed() => break,
        }
    }

    flush_once(&service, store.as_ref()).await;
    tracing::info!("canvas persister stopped");
}

async fn flush_once(service: &PlacementService, store: &dyn CanvasStore) {
    match service.flush(store).await {
        Ok(true) => tracing::debug!("canvas flushed"),
        Ok(false) => {}
        Err(e) => tracing::warn!(error = %e, "canvas flush failed; will retry"),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Identity;
    use crate::persistence::MemoryStore;

    #[tokio::test]
    async fn final_flush_on_shutdown() {
        let service = Arc::new(PlacementService::new(4, 4, Duration::from_secs(30), 0));
        let store = Arc::new(MemoryStore::new());
        let (tx, rx) = watch::channel(false);

        let task = tokio::spawn(run_persister(
            Arc::clone(&service),
            Arc::clone(&store) as Arc<dyn CanvasStore>,
            Duration::from_secs(3600),
            rx,
        ));

        assert!(service.place(Some(&Identity::new("u1", "a")), 1, 1, "#FFAA00").await.is_ok());
        assert!(tx.send(true).is_ok());
        assert!(task.await.is_ok());

        let Ok(Some(doc)) = store.load_canvas().await else {
            panic!("canvas should have been flushed");
        };
        assert_eq!(doc.grid.total_pixels, 1);
        assert!(!service.is_dirty());
    }
}
