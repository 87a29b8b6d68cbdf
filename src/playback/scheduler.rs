//! Ad break scheduling for a single playback session.
//!
//! [`AdScheduler`] is a synchronous state machine. Each lifecycle event
//! (start, progress, pause, end, ad completion, error) is applied to the
//! current state and returns the [`SchedulerAction`]s the caller must carry
//! out: pausing the source, showing an ad, resuming at an offset, recording
//! an impression. The scheduler itself performs no I/O and never blocks.
//!
//! Ad breaks are identified by an [`AdTicket`]. A completion that carries a
//! ticket other than the active one (duplicate, stale, or arriving after the
//! session was cancelled) is ignored.

use adcue_common::{MediaId, PlacementType, PlaybackState, SessionId};
use serde::{Deserialize, Serialize};

use crate::monetization::{AdBreakPlan, AdEligibility};

/// Identifies one ad break within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdTicket(u64);

impl AdTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for AdTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ad#{}", self.0)
    }
}

/// A position report from the playback source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub position_secs: f64,
    /// Total duration, once the source knows it.
    pub duration_secs: Option<f64>,
}

impl ProgressReport {
    pub fn at(position_secs: f64) -> Self {
        Self {
            position_secs,
            duration_secs: None,
        }
    }

    pub fn with_duration(position_secs: f64, duration_secs: f64) -> Self {
        Self {
            position_secs,
            duration_secs: Some(duration_secs),
        }
    }
}

/// Work the caller must perform after a transition, in order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SchedulerAction {
    /// Suspend content playback.
    Pause,
    /// Seek to `position_secs` and play.
    ResumeAt { position_secs: f64 },
    /// Show the banner overlay, then confirm with
    /// [`AdScheduler::on_banner_shown`].
    ShowBanner,
    /// Render an ad and report back with the ticket when it finishes.
    PlayAd {
        ticket: AdTicket,
        placement: PlacementType,
    },
    /// Append an impression to the ledger.
    RecordView { placement: PlacementType },
}

/// Errors surfaced by the scheduler.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaybackError {
    /// The playback source failed. The session is over.
    #[error("Playback source error: {0}")]
    Source(String),

    /// The event is not valid in the current state.
    #[error("Cannot {event} while {state}")]
    InvalidTransition {
        event: &'static str,
        state: PlaybackState,
    },
}

#[derive(Debug, Clone, Copy)]
struct ActiveBreak {
    ticket: AdTicket,
    placement: PlacementType,
    /// Content position to resume from once the ad is done.
    resume_at: f64,
}

#[derive(Debug)]
pub struct AdScheduler {
    session_id: SessionId,
    media_id: MediaId,
    state: PlaybackState,
    position_secs: f64,
    duration_secs: Option<f64>,
    plan: AdBreakPlan,
    eligibility: AdEligibility,
    active: Option<ActiveBreak>,
    /// Most recent report received while an ad was playing.
    buffered: Option<ProgressReport>,
    /// Banner requested but not yet confirmed on screen.
    banner_pending: bool,
    next_ticket: u64,
    cancelled: bool,
}

impl AdScheduler {
    pub fn new(media_id: MediaId, plan: AdBreakPlan, eligibility: AdEligibility) -> Self {
        Self {
            session_id: SessionId::new(),
            media_id,
            state: PlaybackState::Idle,
            position_secs: 0.0,
            duration_secs: None,
            plan,
            eligibility,
            active: None,
            buffered: None,
            banner_pending: false,
            next_ticket: 0,
            cancelled: false,
        }
    }

    /// Seed the duration when the content store already knows it.
    pub fn with_duration(mut self, duration_secs: Option<f64>) -> Self {
        self.adopt_duration(duration_secs);
        self
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn media_id(&self) -> MediaId {
        self.media_id
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn position_secs(&self) -> f64 {
        self.position_secs
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.duration_secs
    }

    pub fn plan(&self) -> &AdBreakPlan {
        &self.plan
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Ticket of the ad break currently playing, if any.
    pub fn active_ticket(&self) -> Option<AdTicket> {
        self.active.map(|a| a.ticket)
    }

    /// Replace the eligibility snapshot, e.g. after the viewer subscribes.
    /// Breaks already queued are checked against the new snapshot when they
    /// come due.
    pub fn update_eligibility(&mut self, eligibility: AdEligibility) {
        self.eligibility = eligibility;
    }

    /// Start playback. Shows the banner if planned, then either plays the
    /// pre-roll or starts content from the beginning.
    pub fn start(&mut self) -> Result<Vec<SchedulerAction>, PlaybackError> {
        if self.state != PlaybackState::Idle || self.cancelled {
            return Err(PlaybackError::InvalidTransition {
                event: "start",
                state: self.state,
            });
        }

        let mut actions = Vec::new();

        if self.plan.show_banner() && self.eligibility.should_show_ad(PlacementType::Banner) {
            self.banner_pending = true;
            actions.push(SchedulerAction::ShowBanner);
        }

        if self
            .plan
            .peek()
            .is_some_and(|b| b.placement == PlacementType::PreRoll)
        {
            self.plan.pop();
            if self.eligibility.should_show_ad(PlacementType::PreRoll) {
                actions.push(self.begin_break(PlacementType::PreRoll, 0.0));
                return Ok(actions);
            }
            tracing::debug!(session_id = %self.session_id, "Pre-roll no longer eligible, skipped");
        }

        self.state = PlaybackState::Playing;
        actions.push(SchedulerAction::ResumeAt { position_secs: 0.0 });
        Ok(actions)
    }

    /// The banner requested at start is on screen. Returns its `RecordView`
    /// the first time only; a banner that failed to show is never confirmed
    /// and never recorded.
    pub fn on_banner_shown(&mut self) -> Vec<SchedulerAction> {
        if self.cancelled || !self.banner_pending {
            return Vec::new();
        }
        self.banner_pending = false;
        vec![SchedulerAction::RecordView {
            placement: PlacementType::Banner,
        }]
    }

    /// Apply a position report.
    ///
    /// Fires at most one mid-roll per report: the next unconsumed one whose
    /// trigger fraction has been reached. Reports that land while an ad is
    /// playing are buffered, keeping only the latest.
    pub fn on_progress(&mut self, report: ProgressReport) -> Vec<SchedulerAction> {
        if self.cancelled || self.state.is_terminal() {
            return Vec::new();
        }

        match self.state {
            PlaybackState::Idle => {
                self.adopt_duration(report.duration_secs);
                Vec::new()
            }
            PlaybackState::PlayingAd => {
                self.buffered = Some(report);
                Vec::new()
            }
            PlaybackState::Playing | PlaybackState::Paused => {
                self.adopt_duration(report.duration_secs);
                if report.position_secs.is_finite() && report.position_secs >= 0.0 {
                    self.position_secs = report.position_secs;
                }
                self.fire_due_mid_roll()
            }
            PlaybackState::Ended | PlaybackState::Errored => Vec::new(),
        }
    }

    /// The viewer paused content.
    pub fn on_paused(&mut self) {
        if !self.cancelled && self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// The viewer resumed content.
    pub fn on_resumed(&mut self) {
        if !self.cancelled && self.state == PlaybackState::Paused {
            self.state = PlaybackState::Playing;
        }
    }

    /// Content reached end of stream.
    ///
    /// Mid-rolls that were never reached are dropped. A queued post-roll
    /// plays; otherwise the session ends.
    pub fn on_ended(&mut self) -> Vec<SchedulerAction> {
        if self.cancelled
            || !matches!(self.state, PlaybackState::Playing | PlaybackState::Paused)
        {
            tracing::debug!(
                session_id = %self.session_id,
                state = %self.state,
                "Ignoring end of stream"
            );
            return Vec::new();
        }

        if let Some(duration) = self.duration_secs {
            self.position_secs = duration;
        }

        let dropped = self.plan.discard_mid_rolls();
        if dropped > 0 {
            tracing::debug!(
                session_id = %self.session_id,
                dropped,
                "Stream ended before remaining mid-rolls"
            );
        }

        if self
            .plan
            .peek()
            .is_some_and(|b| b.placement == PlacementType::PostRoll)
        {
            self.plan.pop();
            if self.eligibility.should_show_ad(PlacementType::PostRoll) {
                let position = self.position_secs;
                return vec![self.begin_break(PlacementType::PostRoll, position)];
            }
            tracing::debug!(session_id = %self.session_id, "Post-roll no longer eligible, skipped");
        }

        self.state = PlaybackState::Ended;
        Vec::new()
    }

    /// The ad renderer finished showing the ad for `ticket`.
    pub fn on_ad_completed(&mut self, ticket: AdTicket) -> Vec<SchedulerAction> {
        self.finish_break(ticket, true)
    }

    /// The ad renderer could not show the ad for `ticket`. Playback resumes
    /// as if the ad had finished, but no impression is recorded.
    pub fn on_ad_failed(&mut self, ticket: AdTicket) -> Vec<SchedulerAction> {
        self.finish_break(ticket, false)
    }

    /// The playback source failed. Moves to the terminal `Errored` state and
    /// abandons any ad break in flight.
    pub fn on_error(&mut self, message: impl Into<String>) -> PlaybackError {
        let message = message.into();
        if let Some(active) = self.active.take() {
            tracing::debug!(
                session_id = %self.session_id,
                ticket = %active.ticket,
                "Abandoning ad break after source error"
            );
        }
        self.buffered = None;
        self.state = PlaybackState::Errored;
        tracing::warn!(
            session_id = %self.session_id,
            media_id = %self.media_id,
            error = %message,
            "Playback source failed"
        );
        PlaybackError::Source(message)
    }

    /// The viewer left. Every later event is a no-op, and an ad in flight is
    /// never recorded.
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        self.buffered = None;
        if let Some(active) = self.active.take() {
            tracing::info!(
                session_id = %self.session_id,
                ticket = %active.ticket,
                placement = %active.placement,
                "Session cancelled during ad break"
            );
        }
    }

    fn adopt_duration(&mut self, duration_secs: Option<f64>) {
        if let Some(d) = duration_secs.filter(|d| d.is_finite() && *d > 0.0) {
            self.duration_secs = Some(d);
        }
    }

    fn progress_fraction(&self) -> Option<f64> {
        self.duration_secs.map(|d| self.position_secs / d)
    }

    fn fire_due_mid_roll(&mut self) -> Vec<SchedulerAction> {
        let Some(fraction) = self.progress_fraction() else {
            return Vec::new();
        };

        while let Some(next) = self.plan.peek().copied() {
            let due = next.placement == PlacementType::MidRoll
                && next.trigger_fraction.is_some_and(|t| fraction >= t);
            if !due {
                break;
            }
            self.plan.pop();

            if self.eligibility.should_show_ad(PlacementType::MidRoll) {
                let position = self.position_secs;
                return vec![
                    SchedulerAction::Pause,
                    self.begin_break(PlacementType::MidRoll, position),
                ];
            }
            tracing::debug!(
                session_id = %self.session_id,
                trigger = ?next.trigger_fraction,
                "Mid-roll no longer eligible, skipped"
            );
        }

        Vec::new()
    }

    fn begin_break(&mut self, placement: PlacementType, resume_at: f64) -> SchedulerAction {
        debug_assert!(self.active.is_none(), "ad breaks must not overlap");

        let ticket = AdTicket(self.next_ticket);
        self.next_ticket += 1;
        self.active = Some(ActiveBreak {
            ticket,
            placement,
            resume_at,
        });
        self.state = PlaybackState::PlayingAd;

        tracing::info!(
            session_id = %self.session_id,
            media_id = %self.media_id,
            ticket = %ticket,
            placement = %placement,
            position_secs = resume_at,
            "Starting ad break"
        );

        SchedulerAction::PlayAd { ticket, placement }
    }

    fn finish_break(&mut self, ticket: AdTicket, displayed: bool) -> Vec<SchedulerAction> {
        if self.cancelled {
            tracing::debug!(
                session_id = %self.session_id,
                ticket = %ticket,
                "Ad finished after cancel"
            );
            return Vec::new();
        }

        let active = match self.active {
            Some(active) if active.ticket == ticket && self.state == PlaybackState::PlayingAd => {
                active
            }
            _ => {
                tracing::debug!(
                    session_id = %self.session_id,
                    ticket = %ticket,
                    "Stale ad completion ignored"
                );
                return Vec::new();
            }
        };
        self.active = None;

        // Only the duration survives; the position predates the resume point.
        if let Some(report) = self.buffered.take() {
            self.adopt_duration(report.duration_secs);
        }

        let mut actions = Vec::new();
        match active.placement {
            PlacementType::PostRoll => {
                self.state = PlaybackState::Ended;
            }
            _ => {
                self.position_secs = active.resume_at;
                self.state = PlaybackState::Playing;
                actions.push(SchedulerAction::ResumeAt {
                    position_secs: active.resume_at,
                });
            }
        }

        if displayed {
            actions.push(SchedulerAction::RecordView {
                placement: active.placement,
            });
        } else {
            tracing::warn!(
                session_id = %self.session_id,
                placement = %active.placement,
                "Ad failed to render, resuming without recording"
            );
        }

        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monetization::AdBreak;
    use adcue_common::MonetizationConfig;
    use assert_matches::assert_matches;

    fn all_eligible() -> AdEligibility {
        AdEligibility {
            subscribed: false,
            config: Some(MonetizationConfig::enabled_with(PlacementType::ALL)),
        }
    }

    fn scheduler(breaks: Vec<AdBreak>, banner: bool) -> AdScheduler {
        AdScheduler::new(
            MediaId::new(),
            AdBreakPlan::from_breaks(breaks, banner),
            all_eligible(),
        )
        .with_duration(Some(100.0))
    }

    fn ticket_of(actions: &[SchedulerAction]) -> AdTicket {
        actions
            .iter()
            .find_map(|a| match a {
                SchedulerAction::PlayAd { ticket, .. } => Some(*ticket),
                _ => None,
            })
            .expect("expected a PlayAd action")
    }

    fn placements_recorded(actions: &[SchedulerAction]) -> Vec<PlacementType> {
        actions
            .iter()
            .filter_map(|a| match a {
                SchedulerAction::RecordView { placement } => Some(*placement),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_start_without_ads_plays_from_zero() {
        let mut s = scheduler(vec![], false);
        let actions = s.start().unwrap();
        assert_eq!(actions, vec![SchedulerAction::ResumeAt { position_secs: 0.0 }]);
        assert_eq!(s.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut s = scheduler(vec![], false);
        s.start().unwrap();
        assert_matches!(
            s.start(),
            Err(PlaybackError::InvalidTransition { event: "start", .. })
        );
    }

    #[test]
    fn test_pre_roll_then_content_from_zero() {
        let mut s = scheduler(vec![AdBreak::pre_roll()], false);
        let actions = s.start().unwrap();
        assert_eq!(s.state(), PlaybackState::PlayingAd);
        assert!(placements_recorded(&actions).is_empty());

        let actions = s.on_ad_completed(ticket_of(&actions));
        assert_eq!(
            actions,
            vec![
                SchedulerAction::ResumeAt { position_secs: 0.0 },
                SchedulerAction::RecordView {
                    placement: PlacementType::PreRoll
                },
            ]
        );
        assert_eq!(s.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_banner_shown_once_at_start() {
        let mut s = scheduler(vec![AdBreak::pre_roll()], true);
        let actions = s.start().unwrap();
        assert_eq!(actions[0], SchedulerAction::ShowBanner);
        assert!(placements_recorded(&actions).is_empty());

        assert_eq!(
            placements_recorded(&s.on_banner_shown()),
            vec![PlacementType::Banner]
        );
        assert!(s.on_banner_shown().is_empty());

        let actions = s.on_ad_completed(ticket_of(&actions));
        assert!(!actions.contains(&SchedulerAction::ShowBanner));
    }

    #[test]
    fn test_banner_never_confirmed_is_not_recorded() {
        let mut unplanned = scheduler(vec![], false);
        unplanned.start().unwrap();
        assert!(unplanned.on_banner_shown().is_empty());

        let mut s = scheduler(vec![], true);
        s.start().unwrap();
        s.cancel();
        assert!(s.on_banner_shown().is_empty());
    }

    #[test]
    fn test_full_session_order() {
        let mut s = scheduler(
            vec![AdBreak::pre_roll(), AdBreak::mid_roll(0.5), AdBreak::post_roll()],
            false,
        );
        let mut fired = Vec::new();
        let mut recorded = Vec::new();

        let actions = s.start().unwrap();
        fired.push(PlacementType::PreRoll);
        recorded.extend(placements_recorded(&s.on_ad_completed(ticket_of(&actions))));

        assert!(s.on_progress(ProgressReport::at(0.0)).is_empty());
        assert!(s.on_progress(ProgressReport::at(10.0)).is_empty());

        let actions = s.on_progress(ProgressReport::at(50.0));
        assert_eq!(actions[0], SchedulerAction::Pause);
        fired.push(PlacementType::MidRoll);
        recorded.extend(placements_recorded(&s.on_ad_completed(ticket_of(&actions))));

        assert!(s.on_progress(ProgressReport::at(100.0)).is_empty());
        assert!(!recorded.contains(&PlacementType::PostRoll));

        let actions = s.on_ended();
        assert_eq!(s.state(), PlaybackState::PlayingAd);
        fired.push(PlacementType::PostRoll);
        recorded.extend(placements_recorded(&s.on_ad_completed(ticket_of(&actions))));

        assert_eq!(
            fired,
            vec![PlacementType::PreRoll, PlacementType::MidRoll, PlacementType::PostRoll]
        );
        assert_eq!(recorded, fired);
        assert_eq!(s.state(), PlaybackState::Ended);
    }

    #[test]
    fn test_mid_roll_resumes_at_interruption() {
        let mut s = scheduler(vec![AdBreak::mid_roll(0.25)], false);
        s.start().unwrap();

        let actions = s.on_progress(ProgressReport::at(27.3));
        let ticket = ticket_of(&actions);
        assert_eq!(s.state(), PlaybackState::PlayingAd);

        let actions = s.on_ad_completed(ticket);
        assert_eq!(actions[0], SchedulerAction::ResumeAt { position_secs: 27.3 });
        assert_eq!(s.position_secs(), 27.3);
        assert_eq!(s.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_mid_roll_fires_once_for_duplicate_reports() {
        let mut s = scheduler(vec![AdBreak::mid_roll(0.5)], false);
        s.start().unwrap();

        let actions = s.on_progress(ProgressReport::at(50.0));
        let ticket = ticket_of(&actions);
        // Reports keep arriving while the ad plays
        assert!(s.on_progress(ProgressReport::at(50.0)).is_empty());
        assert!(s.on_progress(ProgressReport::at(50.0)).is_empty());
        s.on_ad_completed(ticket);

        assert!(s.on_progress(ProgressReport::at(50.0)).is_empty());
        assert!(s.on_progress(ProgressReport::at(60.0)).is_empty());
        assert!(s.plan().is_empty());
    }

    #[test]
    fn test_not_before_trigger() {
        let mut s = scheduler(vec![AdBreak::mid_roll(0.5)], false);
        s.start().unwrap();
        assert!(s.on_progress(ProgressReport::at(49.9)).is_empty());
        assert_eq!(s.state(), PlaybackState::Playing);
        assert_eq!(s.plan().len(), 1);
    }

    #[test]
    fn test_seek_past_two_fires_one_per_update() {
        let mut s = scheduler(
            vec![AdBreak::mid_roll(0.25), AdBreak::mid_roll(0.5), AdBreak::mid_roll(0.75)],
            false,
        );
        s.start().unwrap();

        let actions = s.on_progress(ProgressReport::at(60.0));
        assert_eq!(actions.len(), 2);
        s.on_ad_completed(ticket_of(&actions));
        assert_eq!(s.position_secs(), 60.0);

        // The 0.5 entry is still due on the next report
        let actions = s.on_progress(ProgressReport::at(60.5));
        assert_eq!(s.state(), PlaybackState::PlayingAd);
        s.on_ad_completed(ticket_of(&actions));

        assert!(s.on_progress(ProgressReport::at(61.0)).is_empty());
        assert_eq!(s.plan().len(), 1);
    }

    #[test]
    fn test_backward_seek_never_refires() {
        let mut s = scheduler(vec![AdBreak::mid_roll(0.25), AdBreak::mid_roll(0.5)], false);
        s.start().unwrap();

        let actions = s.on_progress(ProgressReport::at(30.0));
        s.on_ad_completed(ticket_of(&actions));

        assert!(s.on_progress(ProgressReport::at(5.0)).is_empty());
        assert_eq!(s.position_secs(), 5.0);
        assert!(s.on_progress(ProgressReport::at(30.0)).is_empty());
        assert_eq!(s.plan().len(), 1);
    }

    #[test]
    fn test_unknown_duration_defers_mid_rolls() {
        let mut s = AdScheduler::new(
            MediaId::new(),
            AdBreakPlan::from_breaks(vec![AdBreak::mid_roll(0.5)], false),
            all_eligible(),
        );
        s.start().unwrap();

        assert!(s.on_progress(ProgressReport::at(500.0)).is_empty());
        let actions = s.on_progress(ProgressReport::with_duration(501.0, 600.0));
        assert_eq!(actions.len(), 2);
        assert_eq!(s.duration_secs(), Some(600.0));
    }

    #[test]
    fn test_stale_and_duplicate_completions_ignored() {
        let mut s = scheduler(vec![AdBreak::pre_roll(), AdBreak::mid_roll(0.5)], false);
        let first = ticket_of(&s.start().unwrap());
        assert_eq!(s.on_ad_completed(first).len(), 2);
        assert!(s.on_ad_completed(first).is_empty());

        let actions = s.on_progress(ProgressReport::at(50.0));
        let second = ticket_of(&actions);
        assert_ne!(first, second);
        assert!(s.on_ad_completed(first).is_empty());
        assert_eq!(s.state(), PlaybackState::PlayingAd);
        assert_eq!(s.active_ticket(), Some(second));
    }

    #[test]
    fn test_buffered_report_duration_adopted_position_discarded() {
        let mut s = AdScheduler::new(
            MediaId::new(),
            AdBreakPlan::from_breaks(vec![AdBreak::pre_roll()], false),
            all_eligible(),
        );
        let ticket = ticket_of(&s.start().unwrap());

        s.on_progress(ProgressReport::with_duration(3.0, 90.0));
        s.on_progress(ProgressReport::with_duration(4.0, 120.0));
        s.on_ad_completed(ticket);

        assert_eq!(s.duration_secs(), Some(120.0));
        assert_eq!(s.position_secs(), 0.0);
    }

    #[test]
    fn test_ended_without_post_roll() {
        let mut s = scheduler(vec![AdBreak::mid_roll(0.75)], false);
        s.start().unwrap();
        s.on_progress(ProgressReport::at(40.0));

        assert!(s.on_ended().is_empty());
        assert_eq!(s.state(), PlaybackState::Ended);
        assert!(s.plan().is_empty());
        assert_eq!(s.position_secs(), 100.0);
    }

    #[test]
    fn test_post_roll_not_triggered_by_progress() {
        let mut s = scheduler(vec![AdBreak::post_roll()], false);
        s.start().unwrap();
        assert!(s.on_progress(ProgressReport::at(100.0)).is_empty());
        assert_eq!(s.state(), PlaybackState::Playing);

        let actions = s.on_ended();
        assert_matches!(
            actions.as_slice(),
            [SchedulerAction::PlayAd {
                placement: PlacementType::PostRoll,
                ..
            }]
        );
    }

    #[test]
    fn test_denied_at_fire_time() {
        let mut s = scheduler(
            vec![AdBreak::pre_roll(), AdBreak::mid_roll(0.5), AdBreak::post_roll()],
            false,
        );
        let ticket = ticket_of(&s.start().unwrap());
        s.on_ad_completed(ticket);

        // Viewer subscribed mid-session
        s.update_eligibility(AdEligibility {
            subscribed: true,
            config: None,
        });

        assert!(s.on_progress(ProgressReport::at(50.0)).is_empty());
        assert_eq!(s.state(), PlaybackState::Playing);
        assert!(s.on_ended().is_empty());
        assert_eq!(s.state(), PlaybackState::Ended);
    }

    #[test]
    fn test_ad_failure_resumes_without_record() {
        let mut s = scheduler(vec![AdBreak::mid_roll(0.5)], false);
        s.start().unwrap();
        let ticket = ticket_of(&s.on_progress(ProgressReport::at(55.0)));

        let actions = s.on_ad_failed(ticket);
        assert_eq!(actions, vec![SchedulerAction::ResumeAt { position_secs: 55.0 }]);
        assert_eq!(s.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_cancel_during_ad_suppresses_record() {
        let mut s = scheduler(vec![AdBreak::pre_roll()], false);
        let ticket = ticket_of(&s.start().unwrap());

        s.cancel();
        assert!(s.on_ad_completed(ticket).is_empty());
        assert!(s.on_progress(ProgressReport::at(10.0)).is_empty());
        assert!(s.is_cancelled());
        assert_eq!(s.active_ticket(), None);
    }

    #[test]
    fn test_error_is_terminal() {
        let mut s = scheduler(vec![AdBreak::mid_roll(0.5), AdBreak::post_roll()], false);
        s.start().unwrap();
        let ticket = ticket_of(&s.on_progress(ProgressReport::at(50.0)));

        let err = s.on_error("decoder failed");
        assert_eq!(err, PlaybackError::Source("decoder failed".to_string()));
        assert_eq!(s.state(), PlaybackState::Errored);

        assert!(s.on_ad_completed(ticket).is_empty());
        assert!(s.on_progress(ProgressReport::at(60.0)).is_empty());
        assert!(s.on_ended().is_empty());
        assert_eq!(s.state(), PlaybackState::Errored);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut s = scheduler(vec![AdBreak::mid_roll(0.5)], false);
        s.start().unwrap();

        s.on_paused();
        assert_eq!(s.state(), PlaybackState::Paused);

        // Seeking while paused can still cross a trigger
        let actions = s.on_progress(ProgressReport::at(70.0));
        assert_eq!(s.state(), PlaybackState::PlayingAd);
        s.on_ad_completed(ticket_of(&actions));
        assert_eq!(s.state(), PlaybackState::Playing);

        s.on_paused();
        s.on_resumed();
        assert_eq!(s.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_no_overlapping_breaks() {
        let mut s = scheduler(
            vec![
                AdBreak::pre_roll(),
                AdBreak::mid_roll(0.25),
                AdBreak::mid_roll(0.5),
                AdBreak::post_roll(),
            ],
            true,
        );
        let mut events: Vec<Vec<SchedulerAction>> = vec![s.start().unwrap()];
        // Everything arrives while the pre-roll is still playing
        events.push(s.on_progress(ProgressReport::at(60.0)));
        events.push(s.on_ended());

        let ads: usize = events
            .iter()
            .flatten()
            .filter(|a| matches!(a, SchedulerAction::PlayAd { .. }))
            .count();
        assert_eq!(ads, 1);
        assert_eq!(s.state(), PlaybackState::PlayingAd);
    }
}
