//! Workout session controller.
//!
//! Pages: Welcome -> Plan -> Workout -> Rest -> (Workout | Finished), with
//! Dashboard reachable from anywhere and CaptureFailed entered when the pose
//! source dies mid-workout. All mutation goes through `&mut WorkoutSession`
//! on the loop thread, one frame or one event at a time.

use crate::announcer::{announce_or_log, Announcer, LogAnnouncer};
use crate::coach::{text_or_fallback, Coach, MotivationContext, OfflineCoach};
use crate::error::SessionError;
use crate::exercise::{ExercisePlanItem, TargetKind, WorkoutPlan};
use crate::planner::{plan_or_fallback, OfflinePlanner, PlanSource, Planner};
use crate::pose::{PoseSnapshot, Side};
use crate::profile::UserProfile;
use crate::tracker::{ExerciseTracker, Feedback, FrameOutcome};
use crate::visibility::VisibilityGate;
use chrono::{DateTime, Local};
use std::fmt::Display;
use tracing::{debug, info, warn};

pub const DEFAULT_REST_TICKS: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Page {
    Welcome,
    Plan,
    Workout,
    Rest,
    Finished,
    Dashboard,
    CaptureFailed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Rest countdown length, one tick per time unit
    pub rest_ticks: u32,
    pub gate: VisibilityGate,
    pub side: Side,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rest_ticks: DEFAULT_REST_TICKS,
            gate: VisibilityGate::default(),
            side: Side::Left,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub current_index: usize,
    pub page: Page,
    pub feedback: Feedback,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            current_index: 0,
            page: Page::Welcome,
            feedback: Feedback::info("What's your fitness goal today?"),
        }
    }
}

/// How one exercise ended, recorded when it leaves the Workout page
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseResult {
    pub name: String,
    pub kind: TargetKind,
    pub target: u32,
    pub reps: u32,
    pub hold_secs: f64,
    pub skipped: bool,
    pub finished_at: DateTime<Local>,
}

impl ExerciseResult {
    fn from_tracker(tracker: &ExerciseTracker, skipped: bool) -> Self {
        let item = tracker.item();
        Self {
            name: item.name.clone(),
            kind: item.kind,
            target: item.target,
            reps: tracker.rep_count(),
            hold_secs: tracker.elapsed_hold_time(),
            skipped,
            finished_at: Local::now(),
        }
    }
}

/// The external services a session talks to
pub struct Collaborators {
    pub planner: Box<dyn Planner>,
    pub coach: Box<dyn Coach>,
    pub announcer: Box<dyn Announcer>,
}

impl Collaborators {
    /// No model, canned phrases, log-only speech
    pub fn offline() -> Self {
        Self {
            planner: Box::new(OfflinePlanner),
            coach: Box::new(OfflineCoach::new()),
            announcer: Box::new(LogAnnouncer),
        }
    }
}

pub struct WorkoutSession {
    config: SessionConfig,
    collaborators: Collaborators,
    state: SessionState,
    profile: Option<UserProfile>,
    plan: Option<WorkoutPlan>,
    plan_source: Option<PlanSource>,
    advice: Option<String>,
    tracker: Option<ExerciseTracker>,
    awaiting_ready: bool,
    rest_remaining: u32,
    last_pose: Option<PoseSnapshot>,
    capture_error: Option<String>,
    results: Vec<ExerciseResult>,
}

impl WorkoutSession {
    pub fn new(config: SessionConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
            state: SessionState::default(),
            profile: None,
            plan: None,
            plan_source: None,
            advice: None,
            tracker: None,
            awaiting_ready: false,
            rest_remaining: 0,
            last_pose: None,
            capture_error: None,
            results: Vec::new(),
        }
    }

    fn expect_page(&self, page: Page, action: &'static str) -> Result<(), SessionError> {
        if self.state.page == page {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                action,
                page: self.state.page,
            })
        }
    }

    fn announce(&self, text: &str) {
        announce_or_log(self.collaborators.announcer.as_ref(), text);
    }

    /// Welcome -> Plan. Always ends with a plan: generated or the fallback.
    pub fn submit_profile(&mut self, profile: UserProfile) -> Result<(), SessionError> {
        self.expect_page(Page::Welcome, "generate a plan")?;
        profile.validate()?;

        let (plan, source) = plan_or_fallback(self.collaborators.planner.as_ref(), &profile);
        let advice = text_or_fallback(self.collaborators.coach.nutrition_advice(&profile));
        info!(goal = %profile.goal, exercises = plan.len(), ?source, "plan ready");

        self.state.feedback = match source {
            PlanSource::Generated => Feedback::success("Your plan is ready!"),
            PlanSource::Fallback => {
                Feedback::warning("Couldn't reach the planner, here's a starter plan instead.")
            }
        };
        self.plan = Some(plan);
        self.plan_source = Some(source);
        self.advice = Some(advice);
        self.profile = Some(profile);
        self.state.page = Page::Plan;
        Ok(())
    }

    /// Plan -> Workout for the first exercise
    pub fn start_workout(&mut self) -> Result<(), SessionError> {
        self.expect_page(Page::Plan, "start the workout")?;
        self.state.current_index = 0;
        self.enter_workout();
        if let Some(item) = self.current_item() {
            let text = format!("Let's go! First up: {item}");
            self.announce(&text);
            self.state.feedback = Feedback::info(text);
        }
        Ok(())
    }

    fn enter_workout(&mut self) {
        let Some(item) = self
            .plan
            .as_ref()
            .and_then(|p| p.get(self.state.current_index))
            .cloned()
        else {
            warn!(index = self.state.current_index, "no plan item to track");
            return;
        };

        debug!(index = self.state.current_index, exercise = %item.name, "entering workout");
        self.awaiting_ready = item.kind == TargetKind::Time;
        self.tracker = Some(ExerciseTracker::new(item, self.config.gate, self.config.side));
        self.last_pose = None;
        self.capture_error = None;
        self.state.page = Page::Workout;
    }

    /// Time based exercises wait for this before any frame is sampled
    pub fn acknowledge_ready(&mut self) -> Result<(), SessionError> {
        self.expect_page(Page::Workout, "start the timer")?;
        if self.awaiting_ready {
            self.awaiting_ready = false;
            self.state.feedback = Feedback::info("Timer starts when you're in position");
        }
        Ok(())
    }

    /// Feed one frame to the active tracker.
    ///
    /// Returns `None` (frame discarded) outside the Workout page or while a
    /// timed exercise waits for the ready acknowledgment.
    pub fn process_frame(&mut self, pose: Option<&PoseSnapshot>, now: f64) -> Option<FrameOutcome> {
        if self.state.page != Page::Workout || self.awaiting_ready {
            return None;
        }
        let tracker = self.tracker.as_mut()?;

        self.last_pose = pose.cloned();
        let outcome = tracker.update(pose, now);
        let reps = tracker.rep_count();

        self.state.feedback = outcome.feedback.clone();
        if outcome.rep_completed {
            announce_or_log(self.collaborators.announcer.as_ref(), &reps.to_string());
        }
        if outcome.complete {
            info!(exercise = %self.current_item().map(|i| i.name.as_str()).unwrap_or("?"), "exercise complete");
            self.enter_rest(false);
        }
        Some(outcome)
    }

    /// Workout -> Rest without meeting the target
    pub fn skip(&mut self) -> Result<(), SessionError> {
        self.expect_page(Page::Workout, "skip")?;
        info!(index = self.state.current_index, "exercise skipped");
        self.enter_rest(true);
        Ok(())
    }

    fn enter_rest(&mut self, skipped: bool) {
        if let Some(tracker) = &self.tracker {
            self.results
                .push(ExerciseResult::from_tracker(tracker, skipped));
        }
        self.awaiting_ready = false;
        self.rest_remaining = self.config.rest_ticks;
        self.state.page = Page::Rest;

        if self.rest_remaining == 0 {
            self.advance();
            return;
        }
        self.state.feedback = self.rest_message();
        self.announce(&format!("Rest for {} seconds", self.rest_remaining));
    }

    fn rest_message(&self) -> Feedback {
        match self.next_item() {
            Some(next) => Feedback::info(format!(
                "Rest: {}s. Next up: {next}",
                self.rest_remaining
            )),
            None => Feedback::info(format!(
                "Rest: {}s. That was the last one!",
                self.rest_remaining
            )),
        }
    }

    /// One rest countdown tick
    pub fn tick(&mut self) -> Result<(), SessionError> {
        self.expect_page(Page::Rest, "count down")?;
        self.rest_remaining = self.rest_remaining.saturating_sub(1);
        if self.rest_remaining == 0 {
            self.advance();
        } else {
            self.state.feedback = self.rest_message();
        }
        Ok(())
    }

    fn advance(&mut self) {
        let total = self.plan.as_ref().map_or(0, WorkoutPlan::len);
        if self.state.current_index + 1 >= total {
            self.finish();
            return;
        }

        self.state.current_index += 1;
        self.enter_workout();

        let goal = self
            .profile
            .as_ref()
            .map(|p| p.goal.clone())
            .unwrap_or_default();
        let exercise = self
            .current_item()
            .map(|i| i.name.clone())
            .unwrap_or_default();
        let message = text_or_fallback(self.collaborators.coach.motivation(&MotivationContext {
            goal: &goal,
            exercise: &exercise,
            completed: self.state.current_index,
            total,
        }));
        self.announce(&message);
        self.state.feedback = Feedback::success(message);
    }

    fn finish(&mut self) {
        info!(exercises = self.results.len(), "workout finished");
        self.tracker = None;
        self.last_pose = None;
        self.rest_remaining = 0;
        self.state.page = Page::Finished;
        self.state.feedback = Feedback::success("Workout complete! Amazing job!");
        self.announce("Workout complete! Amazing job!");
    }

    /// Start over from Welcome, discarding plan, counters and timers.
    /// Accepted from any page.
    pub fn restart(&mut self) {
        debug!(from = %self.state.page, "session restart");
        self.state = SessionState::default();
        self.profile = None;
        self.plan = None;
        self.plan_source = None;
        self.advice = None;
        self.tracker = None;
        self.awaiting_ready = false;
        self.rest_remaining = 0;
        self.last_pose = None;
        self.capture_error = None;
    }

    /// Jump to the history dashboard from any page. Any running workout or rest
    /// countdown is abandoned when the dashboard is closed.
    pub fn open_dashboard(&mut self) {
        self.state.page = Page::Dashboard;
    }

    /// Dashboard -> Welcome
    pub fn close_dashboard(&mut self) -> Result<(), SessionError> {
        self.expect_page(Page::Dashboard, "close the dashboard")?;
        self.restart();
        Ok(())
    }

    /// The pose source failed; stop sampling and show the error
    pub fn capture_failed(&mut self, reason: impl Display) -> Result<(), SessionError> {
        self.expect_page(Page::Workout, "report a capture failure")?;
        let reason = reason.to_string();
        warn!("capture failed: {reason}");
        self.state.feedback = Feedback::warning(format!("Camera problem: {reason}"));
        self.capture_error = Some(reason);
        self.state.page = Page::CaptureFailed;
        Ok(())
    }

    /// CaptureFailed -> Workout, restarting the current exercise
    pub fn retry_capture(&mut self) -> Result<(), SessionError> {
        self.expect_page(Page::CaptureFailed, "retry the camera")?;
        self.enter_workout();
        self.state.feedback = Feedback::info("Camera back on. Let's continue!");
        Ok(())
    }

    /// Results recorded since the last call
    pub fn drain_results(&mut self) -> Vec<ExerciseResult> {
        std::mem::take(&mut self.results)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn page(&self) -> Page {
        self.state.page
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn feedback(&self) -> &Feedback {
        &self.state.feedback
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn plan(&self) -> Option<&WorkoutPlan> {
        self.plan.as_ref()
    }

    pub fn plan_source(&self) -> Option<PlanSource> {
        self.plan_source
    }

    pub fn advice(&self) -> Option<&str> {
        self.advice.as_deref()
    }

    pub fn tracker(&self) -> Option<&ExerciseTracker> {
        self.tracker.as_ref()
    }

    pub fn current_item(&self) -> Option<&ExercisePlanItem> {
        self.plan.as_ref()?.get(self.state.current_index)
    }

    pub fn next_item(&self) -> Option<&ExercisePlanItem> {
        self.plan.as_ref()?.get(self.state.current_index + 1)
    }

    pub fn rep_count(&self) -> u32 {
        self.tracker.as_ref().map_or(0, ExerciseTracker::rep_count)
    }

    pub fn elapsed_hold_time(&self) -> f64 {
        self.tracker
            .as_ref()
            .map_or(0.0, ExerciseTracker::elapsed_hold_time)
    }

    pub fn rest_remaining(&self) -> u32 {
        self.rest_remaining
    }

    pub fn is_awaiting_ready(&self) -> bool {
        self.awaiting_ready
    }

    /// True when the host should acquire and feed frames
    pub fn is_sampling(&self) -> bool {
        self.state.page == Page::Workout && !self.awaiting_ready
    }

    /// Landmarks of the last processed frame, for the overlay
    pub fn last_pose(&self) -> Option<&PoseSnapshot> {
        self.last_pose.as_ref()
    }

    pub fn capture_error(&self) -> Option<&str> {
        self.capture_error.as_deref()
    }
}
