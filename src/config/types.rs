use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::monetization::{RateTable, DEFAULT_MID_ROLL_FRACTIONS};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub ads: AdsConfig,

    #[serde(default)]
    pub rates: RateTable,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite database file. `~` is expanded.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("adcue.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl DatabaseConfig {
    pub fn resolved_path(&self) -> PathBuf {
        let raw = self.path.to_string_lossy();
        PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdsConfig {
    /// How long a simulated ad plays.
    #[serde(default = "default_ad_duration")]
    pub duration_secs: f64,

    /// Where mid-rolls fire, as fractions of the content duration.
    #[serde(default = "default_mid_roll_fractions")]
    pub mid_roll_fractions: Vec<f64>,
}

/// Longest ad length a config or command line may ask for.
pub const MAX_AD_DURATION_SECS: f64 = 3600.0;

fn default_ad_duration() -> f64 {
    5.0
}

fn default_mid_roll_fractions() -> Vec<f64> {
    DEFAULT_MID_ROLL_FRACTIONS.to_vec()
}

impl Default for AdsConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_ad_duration(),
            mid_roll_fractions: default_mid_roll_fractions(),
        }
    }
}

impl AdsConfig {
    /// The ad length as a [`Duration`]. Values a `Duration` cannot hold
    /// fall back to the default length.
    pub fn ad_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.duration_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_ad_duration()))
    }
}
