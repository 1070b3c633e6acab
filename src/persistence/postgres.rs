//! PostgreSQL implementation of the persistence layer.

use std::time::Duration;

use futures_util::future::BoxFuture;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;

use super::{CanvasDocument, CanvasStore, StoreResult};
use crate::domain::{Snapshot, SnapshotPeriod};

/// Primary key of the single live-canvas row.
const CANVAS_ROW_ID: i16 = 1;

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects, then applies the bundled migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`super::StoreError`] if the database is unreachable or a
    /// migration fails.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }
}

impl CanvasStore for PostgresStore {
    fn load_canvas(&self) -> BoxFuture<'_, StoreResult<Option<CanvasDocument>>> {
        Box::pin(async move {
            let row = sqlx::query_scalar::<_, Json<CanvasDocument>>(
                "SELECT document FROM canvas_state WHERE id = $1",
            )
            .bind(CANVAS_ROW_ID)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.map(|Json(doc)| doc))
        })
    }

    fn save_canvas(&self, document: CanvasDocument) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let saved_at = document.saved_at;
            sqlx::query(
                "INSERT INTO canvas_state (id, document, saved_at) VALUES ($1, $2, $3) \
                 ON CONFLICT (id) DO UPDATE SET document = EXCLUDED.document, saved_at = EXCLUDED.saved_at",
            )
            .bind(CANVAS_ROW_ID)
            .bind(Json(document))
            .bind(saved_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        })
    }

    fn load_snapshot(
        &self,
        period: SnapshotPeriod,
    ) -> BoxFuture<'_, StoreResult<Option<Snapshot>>> {
        Box::pin(async move {
            let row = sqlx::query_scalar::<_, Json<Snapshot>>(
                "SELECT snapshot FROM canvas_snapshots WHERE period = $1",
            )
            .bind(period.to_string())
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.map(|Json(snapshot)| snapshot))
        })
    }

    fn insert_snapshot_if_absent(&self, snapshot: Snapshot) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let period = snapshot.period.to_string();
            let taken_at = snapshot.taken_at;
            let result = sqlx::query(
                "INSERT INTO canvas_snapshots (period, snapshot, taken_at) VALUES ($1, $2, $3) \
                 ON CONFLICT (period) DO NOTHING",
            )
            .bind(period)
            .bind(Json(snapshot))
            .bind(taken_at)
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected() == 1)
        })
    }

    fn list_snapshot_periods(&self) -> BoxFuture<'_, StoreResult<Vec<SnapshotPeriod>>> {
        Box::pin(async move {
            let rows = sqlx::query_scalar::<_, String>(
                "SELECT period FROM canvas_snapshots ORDER BY period ASC",
            )
            .fetch_all(&self.pool)
            .await?;
            let mut periods: Vec<SnapshotPeriod> =
                rows.iter().filter_map(|p| p.parse().ok()).collect();
            periods.sort_unstable();
            Ok(periods)
        })
    }
}
