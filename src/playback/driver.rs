//! Async driver that connects a playback source, an ad renderer, and the
//! monetization policy to an [`AdScheduler`].
//!
//! The driver owns the scheduler and feeds it one event at a time from a
//! single task, so no two transitions ever interleave. Ads render on spawned
//! tasks and report back over a channel tagged with their [`AdTicket`].

use std::collections::VecDeque;
use std::sync::Arc;

use adcue_common::{MediaId, PlacementType, PlaybackState, SessionId, ViewerId};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::renderer::AdRenderer;
use super::scheduler::{AdScheduler, AdTicket, PlaybackError, SchedulerAction};
use super::source::{PlaybackEvent, PlaybackSource};
use crate::monetization::MonetizationPolicy;

/// How a session finished.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub media_id: MediaId,
    pub state: PlaybackState,
    pub position_secs: f64,
    pub cancelled: bool,
    /// Placements that were displayed, in order. Ledger writes are best
    /// effort, so this can list ads whose record was dropped.
    pub ads_shown: Vec<PlacementType>,
}

struct AdFinished {
    ticket: AdTicket,
    displayed: bool,
}

pub struct SessionDriver {
    scheduler: AdScheduler,
    policy: Arc<MonetizationPolicy>,
    renderer: Arc<dyn AdRenderer>,
    source: Arc<dyn PlaybackSource>,
    cancel: CancellationToken,
    ads_shown: Vec<PlacementType>,
}

impl SessionDriver {
    pub fn new(
        scheduler: AdScheduler,
        policy: Arc<MonetizationPolicy>,
        renderer: Arc<dyn AdRenderer>,
        source: Arc<dyn PlaybackSource>,
    ) -> Self {
        Self {
            scheduler,
            policy,
            renderer,
            source,
            cancel: CancellationToken::new(),
            ads_shown: Vec::new(),
        }
    }

    /// Look up the viewer's eligibility and build a driver for a fresh
    /// session on `media_id`.
    pub async fn prepare(
        policy: Arc<MonetizationPolicy>,
        renderer: Arc<dyn AdRenderer>,
        source: Arc<dyn PlaybackSource>,
        media_id: MediaId,
        viewer_id: ViewerId,
    ) -> Self {
        let eligibility = policy.eligibility(media_id, viewer_id).await;
        let plan = policy.plan_for(&eligibility);
        let duration_secs = policy.media_duration(media_id).await;
        tracing::info!(
            media_id = %media_id,
            viewer_id = %viewer_id,
            subscribed = eligibility.subscribed,
            breaks = plan.len(),
            banner = plan.show_banner(),
            ?duration_secs,
            "Prepared ad plan"
        );
        let scheduler = AdScheduler::new(media_id, plan, eligibility).with_duration(duration_secs);
        Self::new(scheduler, policy, renderer, source)
    }

    /// Use an external token to cancel the session.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn scheduler(&self) -> &AdScheduler {
        &self.scheduler
    }

    /// Run the session until content (and any post-roll) ends, the session
    /// is cancelled, or the source reports an error.
    ///
    /// A closed event channel is treated like a cancellation once no ad is
    /// left playing.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<PlaybackEvent>,
    ) -> Result<SessionSummary, PlaybackError> {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<AdFinished>();
        // Stops in-flight ad tasks once the session is over.
        let ads_cancel = self.cancel.child_token();
        let _ads_guard = ads_cancel.clone().drop_guard();

        tracing::info!(
            session_id = %self.scheduler.session_id(),
            media_id = %self.scheduler.media_id(),
            "Starting playback session"
        );

        let actions = self.scheduler.start()?;
        self.apply(actions, &done_tx, &ads_cancel).await;

        let cancel = self.cancel.clone();
        let mut source_closed = false;
        while self.scheduler.state() != PlaybackState::Ended {
            // A finished source can still be waiting on its post-roll.
            if source_closed && self.scheduler.state() != PlaybackState::PlayingAd {
                tracing::debug!(
                    session_id = %self.scheduler.session_id(),
                    "Playback source closed"
                );
                self.scheduler.cancel();
                break;
            }

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    self.scheduler.cancel();
                    break;
                }
                Some(finished) = done_rx.recv() => {
                    let actions = if finished.displayed {
                        self.scheduler.on_ad_completed(finished.ticket)
                    } else {
                        self.scheduler.on_ad_failed(finished.ticket)
                    };
                    self.apply(actions, &done_tx, &ads_cancel).await;
                }
                event = events.recv(), if !source_closed => {
                    let Some(event) = event else {
                        source_closed = true;
                        continue;
                    };
                    let actions = match event {
                        PlaybackEvent::Progress(report) => self.scheduler.on_progress(report),
                        PlaybackEvent::Paused => {
                            self.scheduler.on_paused();
                            Vec::new()
                        }
                        PlaybackEvent::Resumed => {
                            self.scheduler.on_resumed();
                            Vec::new()
                        }
                        PlaybackEvent::Ended => self.scheduler.on_ended(),
                        PlaybackEvent::Error { message } => {
                            return Err(self.scheduler.on_error(message));
                        }
                    };
                    self.apply(actions, &done_tx, &ads_cancel).await;
                }
            }
        }

        let summary = SessionSummary {
            session_id: self.scheduler.session_id(),
            media_id: self.scheduler.media_id(),
            state: self.scheduler.state(),
            position_secs: self.scheduler.position_secs(),
            cancelled: self.scheduler.is_cancelled(),
            ads_shown: self.ads_shown,
        };
        tracing::info!(
            session_id = %summary.session_id,
            state = %summary.state,
            cancelled = summary.cancelled,
            ads = summary.ads_shown.len(),
            "Playback session finished"
        );
        Ok(summary)
    }

    async fn apply(
        &mut self,
        actions: Vec<SchedulerAction>,
        done: &mpsc::UnboundedSender<AdFinished>,
        ads_cancel: &CancellationToken,
    ) {
        let mut pending: VecDeque<SchedulerAction> = actions.into();
        while let Some(action) = pending.pop_front() {
            tracing::debug!(session_id = %self.scheduler.session_id(), ?action, "Applying action");
            match action {
                SchedulerAction::Pause => {
                    if let Err(e) = self.source.pause().await {
                        tracing::warn!(error = %e, "Failed to pause playback source");
                    }
                }
                SchedulerAction::ResumeAt { position_secs } => {
                    if let Err(e) = self.resume_source(position_secs).await {
                        tracing::warn!(
                            position_secs,
                            error = %e,
                            "Failed to resume playback source"
                        );
                    }
                }
                SchedulerAction::ShowBanner => match self.renderer.show_banner().await {
                    Ok(()) => {
                        for follow_up in self.scheduler.on_banner_shown().into_iter().rev() {
                            pending.push_front(follow_up);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to show banner, not recording it");
                    }
                },
                SchedulerAction::PlayAd { ticket, placement } => {
                    self.spawn_ad(ticket, placement, done.clone(), ads_cancel.clone());
                }
                SchedulerAction::RecordView { placement } => {
                    self.ads_shown.push(placement);
                    self.policy
                        .record_view(self.scheduler.media_id(), placement)
                        .await;
                }
            }
        }
    }

    async fn resume_source(&self, position_secs: f64) -> anyhow::Result<()> {
        self.source.seek(position_secs).await?;
        self.source.play().await
    }

    fn spawn_ad(
        &self,
        ticket: AdTicket,
        placement: PlacementType,
        done: mpsc::UnboundedSender<AdFinished>,
        cancel: CancellationToken,
    ) {
        let renderer = self.renderer.clone();
        tokio::spawn(async move {
            let displayed = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                result = renderer.play(placement) => match result {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(
                            ticket = %ticket,
                            placement = %placement,
                            error = %e,
                            "Ad renderer failed"
                        );
                        false
                    }
                },
            };
            // The driver may already be gone.
            let _ = done.send(AdFinished { ticket, displayed });
        });
    }
}
