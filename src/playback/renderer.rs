//! Ad rendering.
//!
//! The session driver hands every `PlayAd` action to an [`AdRenderer`] and
//! waits for it to finish before telling the scheduler the ad completed.

use std::time::Duration;

use adcue_common::PlacementType;
use async_trait::async_trait;

/// Default length of a simulated ad.
pub const DEFAULT_AD_DURATION: Duration = Duration::from_secs(5);

#[async_trait]
pub trait AdRenderer: Send + Sync {
    /// Show one interrupting ad. Returns once it has finished. An error
    /// means the ad was never displayed.
    async fn play(&self, placement: PlacementType) -> anyhow::Result<()>;

    /// Show the banner overlay.
    async fn show_banner(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Renderer that "plays" each ad by sleeping for a fixed duration.
#[derive(Debug, Clone)]
pub struct TimedAdRenderer {
    duration: Duration,
}

impl TimedAdRenderer {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Default for TimedAdRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_AD_DURATION)
    }
}

#[async_trait]
impl AdRenderer for TimedAdRenderer {
    async fn play(&self, placement: PlacementType) -> anyhow::Result<()> {
        tracing::info!(
            placement = %placement,
            duration_secs = self.duration.as_secs_f64(),
            "Playing ad"
        );
        tokio::time::sleep(self.duration).await;
        tracing::debug!(placement = %placement, "Ad finished");
        Ok(())
    }

    async fn show_banner(&self) -> anyhow::Result<()> {
        tracing::info!("Showing banner ad");
        Ok(())
    }
}
