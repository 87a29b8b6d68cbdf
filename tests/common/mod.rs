//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which wires a [`MonetizationPolicy`] to
//! [`SqliteStore`] over an in-memory database.

use std::sync::Arc;

use adcue::monetization::MonetizationPolicy;
use adcue::stores::SqliteStore;
use adcue_common::{MediaInfo, MonetizationConfig, PlacementType, ViewerId};
use adcue_db::pool::{init_memory_pool, DbPool};
use adcue_db::queries::{monetization, videos};

pub struct TestHarness {
    pub db: DbPool,
    pub store: Arc<SqliteStore>,
    pub policy: Arc<MonetizationPolicy>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_policy(|policy| policy)
    }

    /// Create a harness, letting the caller adjust the policy before it is
    /// shared.
    pub fn with_policy(f: impl FnOnce(MonetizationPolicy) -> MonetizationPolicy) -> Self {
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let store = Arc::new(SqliteStore::new(db.clone()));
        let policy = Arc::new(f(MonetizationPolicy::new(
            store.clone(),
            store.clone(),
            store.clone(),
        )));
        Self { db, store, policy }
    }

    pub fn conn(&self) -> adcue_db::pool::PooledConnection {
        adcue_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// Insert a video owned by a fresh user.
    pub fn create_video(&self, duration_secs: Option<f64>) -> MediaInfo {
        videos::create_video(&self.conn(), ViewerId::new(), duration_secs)
            .expect("failed to create video")
    }

    /// Insert a video and enable the given ad types on it.
    pub fn create_monetized_video(&self, allowed: &[PlacementType]) -> MediaInfo {
        let video = self.create_video(Some(100.0));
        monetization::upsert_monetization(
            &self.conn(),
            video.id,
            &MonetizationConfig::enabled_with(allowed.iter().copied()),
        )
        .expect("failed to save monetization");
        video
    }
}
