//! Playback sources: the content player the scheduler drives.
//!
//! A source accepts play, pause and seek commands and reports what happens to
//! it as a stream of [`PlaybackEvent`]s on an mpsc channel.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::scheduler::ProgressReport;

/// Something the content player reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PlaybackEvent {
    Progress(ProgressReport),
    Paused,
    Resumed,
    Ended,
    Error { message: String },
}

#[async_trait]
pub trait PlaybackSource: Send + Sync {
    async fn play(&self) -> anyhow::Result<()>;

    async fn pause(&self) -> anyhow::Result<()>;

    async fn seek(&self, position_secs: f64) -> anyhow::Result<()>;
}

/// Settings for [`SimulatedPlayback`].
#[derive(Debug, Clone)]
pub struct SimulationSettings {
    pub duration_secs: f64,
    /// Media time advanced per tick.
    pub step_secs: f64,
    /// Wall-clock time between ticks.
    pub tick: Duration,
    /// Report a source error once playback reaches this position.
    pub fail_at_secs: Option<f64>,
}

impl SimulationSettings {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            duration_secs,
            step_secs: 1.0,
            tick: Duration::from_secs(1),
            fail_at_secs: None,
        }
    }
}

#[derive(Debug, Default)]
struct SimState {
    position_secs: f64,
    playing: bool,
    finished: bool,
}

/// A source that advances a clock while playing and emits a progress report
/// on every tick, followed by `Ended` at the end of the content.
#[derive(Debug, Clone)]
pub struct SimulatedPlayback {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedPlayback {
    /// Start the simulation clock. The source stays stopped until the first
    /// `play` command. The clock task exits when `cancel` fires, the content
    /// finishes, or the receiver is dropped.
    pub fn spawn(
        settings: SimulationSettings,
        cancel: CancellationToken,
    ) -> (Self, mpsc::Receiver<PlaybackEvent>) {
        let (tx, rx) = mpsc::channel(64);
        let state = Arc::new(Mutex::new(SimState::default()));
        let source = Self {
            state: state.clone(),
        };

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(settings.tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {}
                }

                let events = {
                    let mut st = state.lock();
                    if !st.playing || st.finished {
                        continue;
                    }
                    advance(&mut st, &settings)
                };

                for event in events {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }

                if state.lock().finished {
                    break;
                }
            }
            tracing::debug!("Simulated playback clock stopped");
        });

        (source, rx)
    }

    pub fn position_secs(&self) -> f64 {
        self.state.lock().position_secs
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }
}

fn advance(st: &mut SimState, settings: &SimulationSettings) -> Vec<PlaybackEvent> {
    let next = (st.position_secs + settings.step_secs).min(settings.duration_secs);

    if let Some(fail_at) = settings.fail_at_secs {
        if next >= fail_at {
            st.position_secs = fail_at;
            st.playing = false;
            st.finished = true;
            return vec![PlaybackEvent::Error {
                message: format!("simulated failure at {:.1}s", fail_at),
            }];
        }
    }

    st.position_secs = next;
    let mut events = vec![PlaybackEvent::Progress(ProgressReport::with_duration(
        next,
        settings.duration_secs,
    ))];
    if next >= settings.duration_secs {
        st.playing = false;
        st.finished = true;
        events.push(PlaybackEvent::Ended);
    }
    events
}

#[async_trait]
impl PlaybackSource for SimulatedPlayback {
    async fn play(&self) -> anyhow::Result<()> {
        self.state.lock().playing = true;
        Ok(())
    }

    async fn pause(&self) -> anyhow::Result<()> {
        self.state.lock().playing = false;
        Ok(())
    }

    async fn seek(&self, position_secs: f64) -> anyhow::Result<()> {
        if !position_secs.is_finite() || position_secs < 0.0 {
            anyhow::bail!("invalid seek position {}", position_secs);
        }
        self.state.lock().position_secs = position_secs;
        Ok(())
    }
}
