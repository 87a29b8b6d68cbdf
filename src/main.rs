mod cli;

use adcue::{
    config::{self, Config},
    monetization::MonetizationPolicy,
    playback::{SessionDriver, SimulatedPlayback, SimulationSettings, TimedAdRenderer},
    stores::{MediaStore, SqliteStore, SubscriptionStore},
};
use adcue_common::{MediaId, MonetizationConfig, PlacementType, ViewerId};
use adcue_db::pool::{get_conn, init_pool};
use adcue_db::queries::videos;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "adcue=trace,adcue_db=debug,adcue_common=debug".to_string()
        } else {
            "adcue=info,adcue_db=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::AddVideo { owner, duration } => {
            let config = config::load_config_or_default(config_path)?;
            add_video(&config, owner, duration)
        }
        Commands::Monetize {
            media,
            owner,
            disable,
            types,
        } => {
            let config = config::load_config_or_default(config_path)?;
            let store = open_store(&config)?;
            let policy = build_policy(&store, &config);
            let settings = MonetizationConfig {
                enabled: !disable,
                allowed: types.into_iter().collect(),
            };

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(policy.update_monetization(media, owner, settings.clone()))
                .with_context(|| format!("Failed to update monetization for {}", media))?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
        Commands::Subscribe { viewer, cancel } => {
            let config = config::load_config_or_default(config_path)?;
            let store = open_store(&config)?;

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(store.set_active(viewer, !cancel))?;
            println!(
                "Subscription for {} is now {}",
                viewer,
                if cancel { "cancelled" } else { "active" }
            );
            Ok(())
        }
        Commands::Simulate {
            media,
            viewer,
            duration,
            step,
            ad_secs,
        } => {
            let config = config::load_config_or_default(config_path)?;
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(simulate(&config, media, viewer, duration, step, ad_secs))
        }
        Commands::Earnings { media, owner } => {
            let config = config::load_config_or_default(config_path)?;
            let store = open_store(&config)?;
            let policy = build_policy(&store, &config);

            let rt = tokio::runtime::Runtime::new()?;
            let json = match (media, owner) {
                (Some(media), _) => {
                    let earnings = rt.block_on(policy.calculate_earnings(media))?;
                    serde_json::to_string_pretty(&earnings)?
                }
                (None, Some(owner)) => {
                    let daily = rt.block_on(policy.creator_earnings(owner))?;
                    serde_json::to_string_pretty(&daily)?
                }
                (None, None) => anyhow::bail!("Pass either --media or --owner"),
            };
            println!("{}", json);
            Ok(())
        }
        Commands::Validate { file } => {
            let path = file.or_else(|| cli.config.clone());
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("adcue {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open_store(config: &Config) -> Result<SqliteStore> {
    let db_path = config.database.resolved_path();
    let db_path_str = db_path.to_string_lossy();
    tracing::debug!("Opening database at {}", db_path_str);
    let pool = init_pool(&db_path_str)
        .with_context(|| format!("Failed to open database {}", db_path_str))?;
    Ok(SqliteStore::new(pool))
}

fn build_policy(store: &SqliteStore, config: &Config) -> Arc<MonetizationPolicy> {
    let store = Arc::new(store.clone());
    Arc::new(
        MonetizationPolicy::new(store.clone(), store.clone(), store)
            .with_rates(config.rates)
            .with_mid_roll_fractions(config.ads.mid_roll_fractions.clone()),
    )
}

fn add_video(config: &Config, owner: ViewerId, duration: Option<f64>) -> Result<()> {
    let store = open_store(config)?;
    let conn = get_conn(store.pool())?;
    let video = videos::create_video(&conn, owner, duration)?;

    tracing::info!(media_id = %video.id, owner_id = %owner, "Registered video");
    println!("{}", video.id);
    Ok(())
}

async fn simulate(
    config: &Config,
    media: MediaId,
    viewer: ViewerId,
    duration: Option<f64>,
    step: f64,
    ad_secs: Option<f64>,
) -> Result<()> {
    if !step.is_finite() || step <= 0.0 {
        anyhow::bail!("Step must be positive, got {}", step);
    }
    let ad_duration = match ad_secs {
        Some(secs) if secs.is_finite() && secs > 0.0 && secs <= config::MAX_AD_DURATION_SECS => {
            Duration::from_secs_f64(secs)
        }
        Some(secs) => anyhow::bail!(
            "Ad length must be in (0, {}], got {}",
            config::MAX_AD_DURATION_SECS,
            secs
        ),
        None => config.ads.ad_duration(),
    };

    let store = open_store(config)?;
    let info = store
        .media(media)
        .await?
        .with_context(|| format!("Video not found: {}", media))?;

    let duration = match (duration, info.duration_secs) {
        (Some(d), None) => {
            // First time the length is known; keep it for later sessions.
            let pool = store.pool().clone();
            tokio::task::spawn_blocking(move || {
                let conn = get_conn(&pool)?;
                videos::set_duration(&conn, media, d)
            })
            .await??;
            d
        }
        (Some(d), Some(_)) => d,
        (None, Some(d)) => d,
        (None, None) => anyhow::bail!("Video {} has no duration, pass --duration", media),
    };

    let cancel = CancellationToken::new();
    let settings = SimulationSettings {
        duration_secs: duration,
        step_secs: step,
        tick: Duration::from_secs(1),
        fail_at_secs: None,
    };
    let (source, events) = SimulatedPlayback::spawn(settings, cancel.clone());

    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling session");
            ctrl_c_cancel.cancel();
        }
    });

    let policy = build_policy(&store, config);
    let driver = SessionDriver::prepare(
        policy,
        Arc::new(TimedAdRenderer::new(ad_duration)),
        Arc::new(source),
        media,
        viewer,
    )
    .await
    .with_cancellation(cancel.clone());

    let summary = driver.run(events).await?;
    cancel.cancel();

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_config(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            print_config(&Config::default());
        }
    }

    Ok(())
}

fn print_config(config: &Config) {
    println!("  Database: {}", config.database.resolved_path().display());
    println!("  Ad duration: {}s", config.ads.duration_secs);
    println!("  Mid-roll fractions: {:?}", config.ads.mid_roll_fractions);
    for placement in PlacementType::ALL {
        println!("  Rate {}: {}", placement, config.rates.rate(placement));
    }
}
