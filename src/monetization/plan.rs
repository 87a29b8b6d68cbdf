//! Ad break plans and the eligibility snapshot they are built from.

use adcue_common::{MonetizationConfig, PlacementType};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Mid-roll positions used when no override is configured.
pub const DEFAULT_MID_ROLL_FRACTIONS: [f64; 3] = [0.25, 0.5, 0.75];

/// One pending ad break.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdBreak {
    pub placement: PlacementType,
    /// Fraction of the duration at which a mid-roll fires. `None` for
    /// pre-roll and post-roll, which fire at the stream boundaries.
    pub trigger_fraction: Option<f64>,
}

impl AdBreak {
    pub fn pre_roll() -> Self {
        Self {
            placement: PlacementType::PreRoll,
            trigger_fraction: None,
        }
    }

    pub fn mid_roll(fraction: f64) -> Self {
        Self {
            placement: PlacementType::MidRoll,
            trigger_fraction: Some(fraction),
        }
    }

    pub fn post_roll() -> Self {
        Self {
            placement: PlacementType::PostRoll,
            trigger_fraction: None,
        }
    }
}

/// What a viewer may see on a given video, captured when the session starts.
///
/// The scheduler asks this snapshot before every break, so a viewer who
/// subscribes mid-session stops seeing ads once the snapshot is replaced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdEligibility {
    pub subscribed: bool,
    pub config: Option<MonetizationConfig>,
}

impl AdEligibility {
    /// The fail-safe answer used when a lookup fails: no ads at all.
    pub fn no_ads() -> Self {
        Self::default()
    }

    pub fn should_show_ad(&self, placement: PlacementType) -> bool {
        if self.subscribed {
            return false;
        }
        self.config
            .as_ref()
            .map(|config| config.allows(placement))
            .unwrap_or(false)
    }
}

/// Ordered queue of pending ad breaks for one session, plus the banner flag.
///
/// Entries only ever leave from the front, so a consumed mid-roll can never
/// fire again no matter how the playback position moves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdBreakPlan {
    queue: VecDeque<AdBreak>,
    show_banner: bool,
}

impl AdBreakPlan {
    /// A plan with no ads of any kind.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a plan in catalog order (pre-roll, mid-rolls, post-roll),
    /// keeping only the placements `eligibility` allows.
    pub fn from_eligibility(eligibility: &AdEligibility, mid_roll_fractions: &[f64]) -> Self {
        let mut queue = VecDeque::new();

        if eligibility.should_show_ad(PlacementType::PreRoll) {
            queue.push_back(AdBreak::pre_roll());
        }
        if eligibility.should_show_ad(PlacementType::MidRoll) {
            queue.extend(mid_roll_fractions.iter().copied().map(AdBreak::mid_roll));
        }
        if eligibility.should_show_ad(PlacementType::PostRoll) {
            queue.push_back(AdBreak::post_roll());
        }

        Self {
            queue,
            show_banner: eligibility.should_show_ad(PlacementType::Banner),
        }
    }

    /// Build a plan from explicit breaks. Used by tests and callers that
    /// already know the schedule.
    pub fn from_breaks(breaks: impl IntoIterator<Item = AdBreak>, show_banner: bool) -> Self {
        Self {
            queue: breaks.into_iter().collect(),
            show_banner,
        }
    }

    pub fn show_banner(&self) -> bool {
        self.show_banner
    }

    /// The next break that has not fired.
    pub fn peek(&self) -> Option<&AdBreak> {
        self.queue.front()
    }

    /// Remove and return the next break.
    pub fn pop(&mut self) -> Option<AdBreak> {
        self.queue.pop_front()
    }

    /// Drop every mid-roll still pending. Called when the stream ends before
    /// they were reached.
    pub fn discard_mid_rolls(&mut self) -> usize {
        let before = self.queue.len();
        self.queue.retain(|b| b.placement != PlacementType::MidRoll);
        before - self.queue.len()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AdBreak> {
        self.queue.iter()
    }
}
