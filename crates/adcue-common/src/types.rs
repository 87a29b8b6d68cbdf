//! Core domain types shared by the scheduler, the policy, and the stores.
//!
//! Placement types serialize in kebab-case (`pre-roll`, `mid-roll`, ...) so the
//! values stored in `video_monetization.ad_types` stay readable.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::ids::{MediaId, ViewerId};

/// Category of ad break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementType {
    /// Shown before content starts.
    PreRoll,
    /// Shown during content, at a fraction of the duration.
    MidRoll,
    /// Shown after content ends.
    PostRoll,
    /// Persistent overlay, not tied to playback position.
    Banner,
}

impl PlacementType {
    /// Every placement type, in catalog order.
    pub const ALL: [PlacementType; 4] = [
        PlacementType::PreRoll,
        PlacementType::MidRoll,
        PlacementType::PostRoll,
        PlacementType::Banner,
    ];

    /// The kebab-case name used in storage and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreRoll => "pre-roll",
            Self::MidRoll => "mid-roll",
            Self::PostRoll => "post-roll",
            Self::Banner => "banner",
        }
    }
}

impl fmt::Display for PlacementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlacementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre-roll" => Ok(Self::PreRoll),
            "mid-roll" => Ok(Self::MidRoll),
            "post-roll" => Ok(Self::PostRoll),
            "banner" => Ok(Self::Banner),
            _ => Err(format!("Invalid placement type: {}", s)),
        }
    }
}

/// State of a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Session created, playback not started.
    Idle,
    /// Content is playing.
    Playing,
    /// Content is paused by the viewer.
    Paused,
    /// Content is suspended while an ad break plays.
    PlayingAd,
    /// Content (and any post-roll) finished.
    Ended,
    /// The playback source failed. Terminal.
    Errored,
}

impl PlaybackState {
    /// Whether no further transitions can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended | Self::Errored)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Playing => write!(f, "playing"),
            Self::Paused => write!(f, "paused"),
            Self::PlayingAd => write!(f, "playing_ad"),
            Self::Ended => write!(f, "ended"),
            Self::Errored => write!(f, "errored"),
        }
    }
}

/// Per-video monetization settings, owned by the video's creator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonetizationConfig {
    /// Master switch for ads on this video.
    pub enabled: bool,
    /// Placement types the owner allows.
    #[serde(rename = "ad_types", default)]
    pub allowed: BTreeSet<PlacementType>,
}

impl MonetizationConfig {
    /// An enabled config allowing the given placements.
    pub fn enabled_with(placements: impl IntoIterator<Item = PlacementType>) -> Self {
        Self {
            enabled: true,
            allowed: placements.into_iter().collect(),
        }
    }

    /// Whether ads of `placement` may run on this video.
    pub fn allows(&self, placement: PlacementType) -> bool {
        self.enabled && self.allowed.contains(&placement)
    }
}

/// A viewer's subscription status. Active subscribers never see ads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    pub active: bool,
}

/// Metadata about a video the scheduler and policy care about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub id: MediaId,
    pub owner_id: ViewerId,
    pub duration_secs: Option<f64>,
}

/// Append-only fact: one ad was displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdViewRecord {
    pub media_id: MediaId,
    pub placement: PlacementType,
    pub timestamp: DateTime<Utc>,
}

impl AdViewRecord {
    /// A record stamped with the current time.
    pub fn now(media_id: MediaId, placement: PlacementType) -> Self {
        Self {
            media_id,
            placement,
            timestamp: Utc::now(),
        }
    }
}

/// Ledger row: views of one placement on one video for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewTally {
    pub media_id: MediaId,
    pub placement: PlacementType,
    pub date: NaiveDate,
    pub views: u64,
}
