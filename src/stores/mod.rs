//! Data-service seams used by the monetization policy.
//!
//! The policy never talks to a database directly. It holds these traits as
//! `Arc<dyn ...>` so the SQLite stores, the in-memory stores, and test fakes
//! are interchangeable.

pub mod memory;
pub mod sqlite;

use adcue_common::{
    AdViewRecord, MediaId, MediaInfo, MonetizationConfig, Result, SubscriptionStatus, ViewTally,
    ViewerId,
};
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Video metadata and monetization settings.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Look up a video. `Ok(None)` if it does not exist.
    async fn media(&self, media_id: MediaId) -> Result<Option<MediaInfo>>;

    /// Monetization settings for a video. `Ok(None)` if never configured.
    async fn monetization(&self, media_id: MediaId) -> Result<Option<MonetizationConfig>>;

    /// Replace the monetization settings for a video.
    async fn save_monetization(&self, media_id: MediaId, config: &MonetizationConfig)
        -> Result<()>;

    /// Every video uploaded by `owner_id`.
    async fn owned_media(&self, owner_id: ViewerId) -> Result<Vec<MediaId>>;
}

/// Viewer subscription status.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn subscription(&self, viewer_id: ViewerId) -> Result<SubscriptionStatus>;

    async fn set_active(&self, viewer_id: ViewerId, active: bool) -> Result<()>;
}

/// Append-only ledger of displayed ads.
#[async_trait]
pub trait AdLedger: Send + Sync {
    async fn append(&self, record: &AdViewRecord) -> Result<()>;

    /// Daily tallies for one video.
    async fn tallies(&self, media_id: MediaId) -> Result<Vec<ViewTally>>;
}
