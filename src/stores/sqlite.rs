//! SQLite-backed stores.
//!
//! Each call checks a connection out of the pool inside `spawn_blocking`, so
//! rusqlite never blocks the async runtime.

use adcue_common::{
    AdViewRecord, Error, MediaId, MediaInfo, MonetizationConfig, Result, SubscriptionStatus,
    ViewTally, ViewerId,
};
use adcue_db::pool::{get_conn, DbPool};
use adcue_db::queries::{ad_views, monetization, subscriptions, videos};
use async_trait::async_trait;
use rusqlite::Connection;

use super::{AdLedger, MediaStore, SubscriptionStore};

#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            f(&conn)
        })
        .await
        .map_err(|e| Error::internal(format!("spawn_blocking join error: {e}")))?
    }
}

#[async_trait]
impl MediaStore for SqliteStore {
    async fn media(&self, media_id: MediaId) -> Result<Option<MediaInfo>> {
        self.with_conn(move |conn| videos::get_video(conn, media_id))
            .await
    }

    async fn monetization(&self, media_id: MediaId) -> Result<Option<MonetizationConfig>> {
        self.with_conn(move |conn| monetization::get_monetization(conn, media_id))
            .await
    }

    async fn save_monetization(
        &self,
        media_id: MediaId,
        config: &MonetizationConfig,
    ) -> Result<()> {
        let config = config.clone();
        self.with_conn(move |conn| {
            if videos::get_video(conn, media_id)?.is_none() {
                return Err(Error::not_found(format!("video {}", media_id)));
            }
            monetization::upsert_monetization(conn, media_id, &config)
        })
        .await
    }

    async fn owned_media(&self, owner_id: ViewerId) -> Result<Vec<MediaId>> {
        self.with_conn(move |conn| videos::list_video_ids_for_owner(conn, owner_id))
            .await
    }
}

#[async_trait]
impl SubscriptionStore for SqliteStore {
    async fn subscription(&self, viewer_id: ViewerId) -> Result<SubscriptionStatus> {
        self.with_conn(move |conn| subscriptions::get_subscription(conn, viewer_id))
            .await
    }

    async fn set_active(&self, viewer_id: ViewerId, active: bool) -> Result<()> {
        self.with_conn(move |conn| subscriptions::set_subscription(conn, viewer_id, active))
            .await
    }
}

#[async_trait]
impl AdLedger for SqliteStore {
    async fn append(&self, record: &AdViewRecord) -> Result<()> {
        let record = record.clone();
        self.with_conn(move |conn| ad_views::record_view(conn, &record))
            .await
    }

    async fn tallies(&self, media_id: MediaId) -> Result<Vec<ViewTally>> {
        self.with_conn(move |conn| ad_views::list_tallies_for_video(conn, media_id))
            .await
    }
}
