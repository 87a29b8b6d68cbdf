//! Adcue - ad-break scheduling and monetization for video playback
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod monetization;
pub mod playback;
pub mod stores;
