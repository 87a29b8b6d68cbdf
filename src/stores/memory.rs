//! In-memory implementation of every store trait.
//!
//! Used by simulations and tests. Failure switches let tests exercise the
//! policy's fail-safe paths without a broken database.

use adcue_common::{
    AdViewRecord, Error, MediaId, MediaInfo, MonetizationConfig, PlacementType, Result,
    SubscriptionStatus, ViewTally, ViewerId,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{AdLedger, MediaStore, SubscriptionStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    media: DashMap<MediaId, MediaInfo>,
    monetization: DashMap<MediaId, MonetizationConfig>,
    subscriptions: DashMap<ViewerId, SubscriptionStatus>,
    records: Mutex<Vec<AdViewRecord>>,
    fail_lookups: AtomicBool,
    fail_ledger: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a video and return its metadata.
    pub fn add_media(&self, owner_id: ViewerId, duration_secs: Option<f64>) -> MediaInfo {
        let info = MediaInfo {
            id: MediaId::new(),
            owner_id,
            duration_secs,
        };
        self.media.insert(info.id, info.clone());
        info
    }

    pub fn set_monetization(&self, media_id: MediaId, config: MonetizationConfig) {
        self.monetization.insert(media_id, config);
    }

    pub fn set_subscription(&self, viewer_id: ViewerId, active: bool) {
        self.subscriptions
            .insert(viewer_id, SubscriptionStatus { active });
    }

    /// Make every media and subscription lookup fail.
    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Make every ledger append fail.
    pub fn fail_ledger(&self, fail: bool) {
        self.fail_ledger.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of every record appended so far.
    pub fn records(&self) -> Vec<AdViewRecord> {
        self.records.lock().clone()
    }

    /// Placements recorded for one video, in append order.
    pub fn recorded_placements(&self, media_id: MediaId) -> Vec<PlacementType> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.media_id == media_id)
            .map(|r| r.placement)
            .collect()
    }

    fn check_lookup(&self) -> Result<()> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Error::database("lookup unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn media(&self, media_id: MediaId) -> Result<Option<MediaInfo>> {
        self.check_lookup()?;
        Ok(self.media.get(&media_id).map(|m| m.value().clone()))
    }

    async fn monetization(&self, media_id: MediaId) -> Result<Option<MonetizationConfig>> {
        self.check_lookup()?;
        Ok(self.monetization.get(&media_id).map(|m| m.value().clone()))
    }

    async fn save_monetization(
        &self,
        media_id: MediaId,
        config: &MonetizationConfig,
    ) -> Result<()> {
        if !self.media.contains_key(&media_id) {
            return Err(Error::not_found(format!("video {}", media_id)));
        }
        self.monetization.insert(media_id, config.clone());
        Ok(())
    }

    async fn owned_media(&self, owner_id: ViewerId) -> Result<Vec<MediaId>> {
        self.check_lookup()?;
        let mut ids: Vec<MediaId> = self
            .media
            .iter()
            .filter(|m| m.owner_id == owner_id)
            .map(|m| m.id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn subscription(&self, viewer_id: ViewerId) -> Result<SubscriptionStatus> {
        self.check_lookup()?;
        Ok(self
            .subscriptions
            .get(&viewer_id)
            .map(|s| *s.value())
            .unwrap_or_default())
    }

    async fn set_active(&self, viewer_id: ViewerId, active: bool) -> Result<()> {
        self.set_subscription(viewer_id, active);
        Ok(())
    }
}

#[async_trait]
impl AdLedger for MemoryStore {
    async fn append(&self, record: &AdViewRecord) -> Result<()> {
        if self.fail_ledger.load(Ordering::SeqCst) {
            return Err(Error::database("ledger unavailable"));
        }
        self.records.lock().push(record.clone());
        Ok(())
    }

    async fn tallies(&self, media_id: MediaId) -> Result<Vec<ViewTally>> {
        let mut grouped: BTreeMap<(NaiveDate, PlacementType), u64> = BTreeMap::new();
        for record in self.records.lock().iter().filter(|r| r.media_id == media_id) {
            *grouped
                .entry((record.timestamp.date_naive(), record.placement))
                .or_insert(0) += 1;
        }

        Ok(grouped
            .into_iter()
            .map(|((date, placement), views)| ViewTally {
                media_id,
                placement,
                date,
                views,
            })
            .collect())
    }
}
