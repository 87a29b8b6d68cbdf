//! Ad eligibility, impression recording, and earnings.
//!
//! [`MonetizationPolicy`] decides which ads a viewer sees on a video and
//! writes impressions to the ledger. Lookups that fail degrade to "no ads" and
//! ledger writes that fail are logged and dropped: ad infrastructure never
//! blocks a viewer from watching.

pub mod plan;
pub mod rates;

pub use plan::{AdBreak, AdBreakPlan, AdEligibility, DEFAULT_MID_ROLL_FRACTIONS};
pub use rates::{DailyEarning, Earnings, RateTable};

use adcue_common::{
    AdViewRecord, Error, MediaId, MonetizationConfig, PlacementType, Result, ViewerId,
};
use std::sync::Arc;

use crate::stores::{AdLedger, MediaStore, SubscriptionStore};

pub struct MonetizationPolicy {
    media: Arc<dyn MediaStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    ledger: Arc<dyn AdLedger>,
    rates: RateTable,
    mid_roll_fractions: Vec<f64>,
}

impl MonetizationPolicy {
    pub fn new(
        media: Arc<dyn MediaStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        ledger: Arc<dyn AdLedger>,
    ) -> Self {
        Self {
            media,
            subscriptions,
            ledger,
            rates: RateTable::default(),
            mid_roll_fractions: DEFAULT_MID_ROLL_FRACTIONS.to_vec(),
        }
    }

    /// Override the revenue-per-view table.
    pub fn with_rates(mut self, rates: RateTable) -> Self {
        self.rates = rates;
        self
    }

    /// Override where mid-rolls are placed. Fractions must already be sorted
    /// and within `[0, 1]`; the config loader validates them.
    pub fn with_mid_roll_fractions(mut self, fractions: Vec<f64>) -> Self {
        self.mid_roll_fractions = fractions;
        self
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Snapshot what `viewer_id` may see on `media_id`.
    ///
    /// Any lookup failure yields [`AdEligibility::no_ads`].
    pub async fn eligibility(&self, media_id: MediaId, viewer_id: ViewerId) -> AdEligibility {
        let subscription = match self.subscriptions.subscription(viewer_id).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(
                    viewer_id = %viewer_id,
                    error = %e,
                    "Subscription lookup failed, serving no ads"
                );
                return AdEligibility::no_ads();
            }
        };

        if subscription.active {
            return AdEligibility {
                subscribed: true,
                config: None,
            };
        }

        match self.media.monetization(media_id).await {
            Ok(config) => AdEligibility {
                subscribed: false,
                config,
            },
            Err(e) => {
                tracing::warn!(
                    media_id = %media_id,
                    error = %e,
                    "Monetization lookup failed, serving no ads"
                );
                AdEligibility::no_ads()
            }
        }
    }

    /// Stored content length, if known. Lookup failures yield `None`.
    pub async fn media_duration(&self, media_id: MediaId) -> Option<f64> {
        match self.media.media(media_id).await {
            Ok(info) => info.and_then(|m| m.duration_secs),
            Err(e) => {
                tracing::warn!(
                    media_id = %media_id,
                    error = %e,
                    "Media lookup failed, duration unknown"
                );
                None
            }
        }
    }

    /// Build the ad break plan for a new session.
    pub async fn build_ad_plan(&self, media_id: MediaId, viewer_id: ViewerId) -> AdBreakPlan {
        let eligibility = self.eligibility(media_id, viewer_id).await;
        self.plan_for(&eligibility)
    }

    /// Build a plan from an eligibility snapshot already in hand.
    pub fn plan_for(&self, eligibility: &AdEligibility) -> AdBreakPlan {
        AdBreakPlan::from_eligibility(eligibility, &self.mid_roll_fractions)
    }

    /// Record that an ad was displayed. Failures are logged, never returned.
    pub async fn record_view(&self, media_id: MediaId, placement: PlacementType) {
        let record = AdViewRecord::now(media_id, placement);
        match self.ledger.append(&record).await {
            Ok(()) => {
                tracing::debug!(media_id = %media_id, placement = %placement, "Recorded ad view");
            }
            Err(e) => {
                tracing::warn!(
                    media_id = %media_id,
                    placement = %placement,
                    error = %e,
                    "Failed to record ad view"
                );
            }
        }
    }

    /// Earnings for one video from its ledger tallies.
    pub async fn calculate_earnings(&self, media_id: MediaId) -> Result<Earnings> {
        let tallies = self.ledger.tallies(media_id).await?;
        Ok(self.rates.earnings(&tallies))
    }

    /// Per-day earnings across every video `owner_id` has uploaded.
    pub async fn creator_earnings(&self, owner_id: ViewerId) -> Result<Vec<DailyEarning>> {
        let mut tallies = Vec::new();
        for media_id in self.media.owned_media(owner_id).await? {
            tallies.extend(self.ledger.tallies(media_id).await?);
        }
        Ok(self.rates.daily(&tallies))
    }

    /// Replace a video's monetization settings on behalf of its owner.
    pub async fn update_monetization(
        &self,
        media_id: MediaId,
        owner_id: ViewerId,
        config: MonetizationConfig,
    ) -> Result<()> {
        let media = self
            .media
            .media(media_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("video {}", media_id)))?;

        if media.owner_id != owner_id {
            return Err(Error::forbidden(format!(
                "user {} does not own video {}",
                owner_id, media_id
            )));
        }

        self.media.save_monetization(media_id, &config).await?;
        tracing::info!(
            media_id = %media_id,
            enabled = config.enabled,
            placements = config.allowed.len(),
            "Updated video monetization"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use assert_matches::assert_matches;

    fn policy_with(store: &Arc<MemoryStore>) -> MonetizationPolicy {
        MonetizationPolicy::new(store.clone(), store.clone(), store.clone())
    }

    #[tokio::test]
    async fn test_plan_for_free_viewer() {
        let store = Arc::new(MemoryStore::new());
        let media = store.add_media(ViewerId::new(), Some(100.0));
        store.set_monetization(
            media.id,
            MonetizationConfig::enabled_with([PlacementType::PreRoll, PlacementType::Banner]),
        );

        let plan = policy_with(&store)
            .build_ad_plan(media.id, ViewerId::new())
            .await;
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.peek(), Some(&AdBreak::pre_roll()));
        assert!(plan.show_banner());
    }

    #[tokio::test]
    async fn test_subscriber_bypasses_all_ads() {
        let store = Arc::new(MemoryStore::new());
        let media = store.add_media(ViewerId::new(), Some(100.0));
        store.set_monetization(
            media.id,
            MonetizationConfig::enabled_with(PlacementType::ALL),
        );
        let viewer = ViewerId::new();
        store.set_subscription(viewer, true);

        let plan = policy_with(&store).build_ad_plan(media.id, viewer).await;
        assert!(plan.is_empty());
        assert!(!plan.show_banner());
    }

    #[tokio::test]
    async fn test_lookup_failure_means_no_ads() {
        let store = Arc::new(MemoryStore::new());
        let media = store.add_media(ViewerId::new(), Some(100.0));
        store.set_monetization(
            media.id,
            MonetizationConfig::enabled_with(PlacementType::ALL),
        );
        store.fail_lookups(true);

        let policy = policy_with(&store);
        let eligibility = policy.eligibility(media.id, ViewerId::new()).await;
        assert_eq!(eligibility, AdEligibility::no_ads());
        assert!(policy.plan_for(&eligibility).is_empty());
    }

    #[tokio::test]
    async fn test_media_duration_lookup() {
        let store = Arc::new(MemoryStore::new());
        let media = store.add_media(ViewerId::new(), Some(100.0));
        let unknown = store.add_media(ViewerId::new(), None);
        let policy = policy_with(&store);

        assert_eq!(policy.media_duration(media.id).await, Some(100.0));
        assert_eq!(policy.media_duration(unknown.id).await, None);
        assert_eq!(policy.media_duration(MediaId::new()).await, None);

        store.fail_lookups(true);
        assert_eq!(policy.media_duration(media.id).await, None);
    }

    #[tokio::test]
    async fn test_custom_mid_roll_fractions() {
        let store = Arc::new(MemoryStore::new());
        let media = store.add_media(ViewerId::new(), Some(100.0));
        store.set_monetization(
            media.id,
            MonetizationConfig::enabled_with([PlacementType::MidRoll]),
        );

        let plan = policy_with(&store)
            .with_mid_roll_fractions(vec![0.5])
            .build_ad_plan(media.id, ViewerId::new())
            .await;
        assert_eq!(plan.iter().copied().collect::<Vec<_>>(), vec![AdBreak::mid_roll(0.5)]);
    }

    #[tokio::test]
    async fn test_record_view_failure_is_swallowed() {
        let store = Arc::new(MemoryStore::new());
        let media = store.add_media(ViewerId::new(), None);
        let policy = policy_with(&store);

        store.fail_ledger(true);
        policy.record_view(media.id, PlacementType::PreRoll).await;
        assert!(store.records().is_empty());

        store.fail_ledger(false);
        policy.record_view(media.id, PlacementType::PreRoll).await;
        assert_eq!(store.recorded_placements(media.id), vec![PlacementType::PreRoll]);
    }

    #[tokio::test]
    async fn test_calculate_earnings() {
        let store = Arc::new(MemoryStore::new());
        let media = store.add_media(ViewerId::new(), None);
        let policy = policy_with(&store);

        policy.record_view(media.id, PlacementType::PreRoll).await;
        policy.record_view(media.id, PlacementType::MidRoll).await;

        let earnings = policy.calculate_earnings(media.id).await.unwrap();
        assert!((earnings.total - 0.025).abs() < 1e-12);
        assert_eq!(earnings.by_placement.len(), 2);
    }

    #[tokio::test]
    async fn test_creator_earnings_span_videos() {
        let store = Arc::new(MemoryStore::new());
        let owner = ViewerId::new();
        let first = store.add_media(owner, None);
        let second = store.add_media(owner, None);
        let other = store.add_media(ViewerId::new(), None);
        let policy = policy_with(&store);

        policy.record_view(first.id, PlacementType::PreRoll).await;
        policy.record_view(second.id, PlacementType::PostRoll).await;
        policy.record_view(other.id, PlacementType::MidRoll).await;

        let daily = policy.creator_earnings(owner).await.unwrap();
        assert_eq!(daily.len(), 1);
        assert!((daily[0].amount - 0.02).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_update_monetization_checks_owner() {
        let store = Arc::new(MemoryStore::new());
        let owner = ViewerId::new();
        let media = store.add_media(owner, None);
        let policy = policy_with(&store);
        let config = MonetizationConfig::enabled_with([PlacementType::Banner]);

        let err = policy
            .update_monetization(media.id, ViewerId::new(), config.clone())
            .await
            .unwrap_err();
        assert_matches!(err, Error::Forbidden(_));

        let err = policy
            .update_monetization(MediaId::new(), owner, config.clone())
            .await
            .unwrap_err();
        assert_matches!(err, Error::NotFound(_));

        policy
            .update_monetization(media.id, owner, config.clone())
            .await
            .unwrap();
        assert_eq!(store.monetization(media.id).await.unwrap(), Some(config));
    }
}
