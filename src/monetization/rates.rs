//! Revenue-per-view rates and earnings aggregation.
//!
//! Everything here is a pure function of ledger tallies and the rate table.

use adcue_common::{PlacementType, ViewTally};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Revenue per displayed ad, in dollars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    #[serde(default = "default_pre_roll")]
    pub pre_roll: f64,
    #[serde(default = "default_mid_roll")]
    pub mid_roll: f64,
    #[serde(default = "default_post_roll")]
    pub post_roll: f64,
    #[serde(default = "default_banner")]
    pub banner: f64,
}

fn default_pre_roll() -> f64 {
    0.01
}
fn default_mid_roll() -> f64 {
    0.015
}
fn default_post_roll() -> f64 {
    0.01
}
fn default_banner() -> f64 {
    0.005
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            pre_roll: default_pre_roll(),
            mid_roll: default_mid_roll(),
            post_roll: default_post_roll(),
            banner: default_banner(),
        }
    }
}

/// Earnings for one video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Earnings {
    pub total: f64,
    pub by_placement: BTreeMap<PlacementType, f64>,
}

/// Earnings for one day, across every tally passed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEarning {
    pub date: NaiveDate,
    pub amount: f64,
}

impl RateTable {
    pub fn rate(&self, placement: PlacementType) -> f64 {
        match placement {
            PlacementType::PreRoll => self.pre_roll,
            PlacementType::MidRoll => self.mid_roll,
            PlacementType::PostRoll => self.post_roll,
            PlacementType::Banner => self.banner,
        }
    }

    fn amount(&self, tally: &ViewTally) -> f64 {
        self.rate(tally.placement) * tally.views as f64
    }

    /// Total and per-placement earnings for a set of tallies.
    pub fn earnings(&self, tallies: &[ViewTally]) -> Earnings {
        let mut earnings = Earnings::default();
        for tally in tallies {
            let amount = self.amount(tally);
            earnings.total += amount;
            *earnings.by_placement.entry(tally.placement).or_insert(0.0) += amount;
        }
        earnings
    }

    /// Earnings grouped by day, oldest first.
    pub fn daily(&self, tallies: &[ViewTally]) -> Vec<DailyEarning> {
        let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for tally in tallies {
            *by_day.entry(tally.date).or_insert(0.0) += self.amount(tally);
        }
        by_day
            .into_iter()
            .map(|(date, amount)| DailyEarning { date, amount })
            .collect()
    }
}
