mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./adcue.toml",
        "~/.config/adcue/config.toml",
        "/etc/adcue/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if !config.ads.duration_secs.is_finite() || config.ads.duration_secs <= 0.0 {
        anyhow::bail!(
            "Ad duration must be positive, got {}",
            config.ads.duration_secs
        );
    }
    if config.ads.duration_secs > MAX_AD_DURATION_SECS {
        anyhow::bail!(
            "Ad duration cannot exceed {}s, got {}",
            MAX_AD_DURATION_SECS,
            config.ads.duration_secs
        );
    }

    let mut previous: Option<f64> = None;
    for &fraction in &config.ads.mid_roll_fractions {
        if !(0.0..=1.0).contains(&fraction) {
            anyhow::bail!("Mid-roll fraction {} is outside [0, 1]", fraction);
        }
        if let Some(prev) = previous {
            if fraction <= prev {
                anyhow::bail!(
                    "Mid-roll fractions must be strictly increasing ({} follows {})",
                    fraction,
                    prev
                );
            }
        }
        previous = Some(fraction);
    }

    let rates = &config.rates;
    for (name, rate) in [
        ("pre_roll", rates.pre_roll),
        ("mid_roll", rates.mid_roll),
        ("post_roll", rates.post_roll),
        ("banner", rates.banner),
    ] {
        if !rate.is_finite() || rate < 0.0 {
            anyhow::bail!("Rate for {} cannot be negative, got {}", name, rate);
        }
    }

    if config.database.path.as_os_str().is_empty() {
        anyhow::bail!("Database path cannot be empty");
    }

    Ok(())
}
