use adcue_common::{MediaId, PlacementType, ViewerId};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "adcue")]
#[command(author, version, about = "Ad-break scheduling and monetization for video playback")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a video and print its id
    AddVideo {
        /// Owner of the video
        #[arg(long)]
        owner: ViewerId,

        /// Content duration in seconds
        #[arg(long)]
        duration: Option<f64>,
    },

    /// Change a video's monetization settings
    Monetize {
        #[arg(long)]
        media: MediaId,

        /// Must be the video's owner
        #[arg(long)]
        owner: ViewerId,

        /// Turn ads off for this video
        #[arg(long)]
        disable: bool,

        /// Allowed ad types, e.g. pre-roll,mid-roll
        #[arg(long, value_delimiter = ',')]
        types: Vec<PlacementType>,
    },

    /// Activate or cancel a viewer's subscription
    Subscribe {
        #[arg(long)]
        viewer: ViewerId,

        /// Cancel instead of activating
        #[arg(long)]
        cancel: bool,
    },

    /// Play a simulated session and record the ads shown
    Simulate {
        #[arg(long)]
        media: MediaId,

        #[arg(long)]
        viewer: ViewerId,

        /// Content duration in seconds (defaults to the stored duration)
        #[arg(long)]
        duration: Option<f64>,

        /// Media seconds advanced per progress report
        #[arg(long, default_value = "1")]
        step: f64,

        /// Ad length in seconds (defaults to the configured value)
        #[arg(long)]
        ad_secs: Option<f64>,
    },

    /// Show earnings for a video or for everything an owner uploaded
    Earnings {
        #[arg(long, conflicts_with = "owner", required_unless_present = "owner")]
        media: Option<MediaId>,

        #[arg(long)]
        owner: Option<ViewerId>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        #[arg(value_name = "CONFIG")]
        file: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
