//! Per-exercise rep counting and hold timing.
//!
//! Every exercise is a two-phase (Up/Down) debounced state machine over one
//! or two signals. A rep is only counted on the transition into the counting
//! phase, so holding a position never re-increments.

use crate::exercise::{ExerciseKind, ExercisePlanItem, TargetKind};
use crate::geometry::angle;
use crate::pose::{Joint, Point, PoseSnapshot, Side};
use crate::visibility::VisibilityGate;
use itertools::Itertools;
use std::fmt::Debug;
use tracing::{debug, trace};

const SQUAT_UP_DEG: f64 = 165.0;
const SQUAT_DOWN_DEG: f64 = 90.0;
const LUNGE_UP_DEG: f64 = 160.0;
const LUNGE_DOWN_DEG: f64 = 100.0;
const PUSH_UP_UP_DEG: f64 = 160.0;
const PUSH_UP_DOWN_DEG: f64 = 90.0;
const PLANK_MIN_DEG: f64 = 155.0;
const PLANK_MAX_DEG: f64 = 195.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum Stage {
    #[default]
    Unknown,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feedback {
    pub text: String,
    pub severity: Severity,
}

impl Feedback {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Info,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Success,
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Warning,
        }
    }
}

/// Mutable counting state for the exercise currently being tracked
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackerState {
    pub stage: Stage,
    pub rep_count: u32,
    pub elapsed_hold_time: f64,
    pub hold_timer_running: bool,
    pub last_sample_timestamp: Option<f64>,
}

/// What a rule did with one visible frame
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub feedback: Feedback,
    pub rep_completed: bool,
    pub hold_delta: f64,
}

impl Evaluation {
    fn feedback(feedback: Feedback) -> Self {
        Self {
            feedback,
            rep_completed: false,
            hold_delta: 0.0,
        }
    }

    fn rep(state: &TrackerState) -> Self {
        Self {
            feedback: Feedback::success(format!("Good rep! {}", state.rep_count)),
            rep_completed: true,
            hold_delta: 0.0,
        }
    }
}

/// Result of feeding one frame to the tracker
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub feedback: Feedback,
    /// False when the frame had no detection or failed the visibility gate
    pub visible: bool,
    pub rep_completed: bool,
    pub hold_delta: f64,
    /// Completion predicate evaluated after this frame
    pub complete: bool,
}

/// One counting rule per exercise variant
pub trait TrackingRule: Debug + Send {
    /// Joints that must pass the visibility gate before `evaluate` runs
    fn required_joints(&self) -> Vec<Joint>;

    /// Advance `state` for a frame whose required joints are all visible
    fn evaluate(&self, pose: &PoseSnapshot, state: &mut TrackerState, now: f64) -> Evaluation;

    /// False for exercises without a rule; those never complete
    fn is_trackable(&self) -> bool {
        true
    }
}

fn points(pose: &PoseSnapshot, a: Joint, b: Joint, c: Joint) -> Option<(Point, Point, Point)> {
    Some((pose.point(a)?, pose.point(b)?, pose.point(c)?))
}

fn lost_track() -> Evaluation {
    Evaluation::feedback(Feedback::info("Lost track of you, hold still"))
}

/// Shared Up/Down debounce for the angle based rules
fn debounce_angle(
    state: &mut TrackerState,
    angle: f64,
    up_above: f64,
    down_below: f64,
    cues: &AngleCues,
) -> Evaluation {
    if angle > up_above {
        state.stage = Stage::Up;
        return Evaluation::feedback(Feedback::info(cues.at_top));
    }

    if angle < down_below && state.stage == Stage::Up {
        state.stage = Stage::Down;
        state.rep_count += 1;
        return Evaluation::rep(state);
    }

    let feedback = match state.stage {
        Stage::Up => Feedback::warning(cues.go_lower),
        Stage::Down => Feedback::info(cues.come_up),
        Stage::Unknown => Feedback::info(cues.start),
    };
    Evaluation::feedback(feedback)
}

struct AngleCues {
    start: &'static str,
    at_top: &'static str,
    go_lower: &'static str,
    come_up: &'static str,
}

#[derive(Debug)]
pub struct SquatRule {
    side: Side,
}

impl TrackingRule for SquatRule {
    fn required_joints(&self) -> Vec<Joint> {
        vec![self.side.hip(), self.side.knee(), self.side.ankle()]
    }

    fn evaluate(&self, pose: &PoseSnapshot, state: &mut TrackerState, _now: f64) -> Evaluation {
        let Some((hip, knee, ankle)) =
            points(pose, self.side.hip(), self.side.knee(), self.side.ankle())
        else {
            return lost_track();
        };
        let knee_angle = angle(hip, knee, ankle);
        trace!(knee_angle, "squat sample");

        debounce_angle(
            state,
            knee_angle,
            SQUAT_UP_DEG,
            SQUAT_DOWN_DEG,
            &AngleCues {
                start: "Stand up straight to begin",
                at_top: "Squat down",
                go_lower: "Go lower!",
                come_up: "Drive back up",
            },
        )
    }
}

#[derive(Debug)]
pub struct PushUpRule {
    side: Side,
}

impl TrackingRule for PushUpRule {
    fn required_joints(&self) -> Vec<Joint> {
        vec![self.side.shoulder(), self.side.elbow(), self.side.wrist()]
    }

    fn evaluate(&self, pose: &PoseSnapshot, state: &mut TrackerState, _now: f64) -> Evaluation {
        let Some((shoulder, elbow, wrist)) =
            points(pose, self.side.shoulder(), self.side.elbow(), self.side.wrist())
        else {
            return lost_track();
        };
        let elbow_angle = angle(shoulder, elbow, wrist);
        trace!(elbow_angle, "push-up sample");

        debounce_angle(
            state,
            elbow_angle,
            PUSH_UP_UP_DEG,
            PUSH_UP_DOWN_DEG,
            &AngleCues {
                start: "Straighten your arms to begin",
                at_top: "Lower your chest",
                go_lower: "Go lower!",
                come_up: "Push back up",
            },
        )
    }
}

/// Tracks both legs; the lowest knee angle drives the phase
#[derive(Debug)]
pub struct LungeRule;

impl TrackingRule for LungeRule {
    fn required_joints(&self) -> Vec<Joint> {
        [Side::Left, Side::Right]
            .into_iter()
            .flat_map(|s| [s.hip(), s.knee(), s.ankle()])
            .collect()
    }

    fn evaluate(&self, pose: &PoseSnapshot, state: &mut TrackerState, _now: f64) -> Evaluation {
        let knee_angles: Option<Vec<f64>> = [Side::Left, Side::Right]
            .into_iter()
            .map(|s| points(pose, s.hip(), s.knee(), s.ankle()).map(|(h, k, a)| angle(h, k, a)))
            .collect();
        let Some(knee_angles) = knee_angles else {
            return lost_track();
        };
        let Some((lowest, highest)) = knee_angles.into_iter().minmax().into_option() else {
            return lost_track();
        };
        trace!(lowest, highest, "lunge sample");

        // both legs straight
        if lowest > LUNGE_UP_DEG {
            state.stage = Stage::Up;
            return Evaluation::feedback(Feedback::info("Step into a lunge"));
        }

        if lowest < LUNGE_DOWN_DEG && state.stage == Stage::Up {
            state.stage = Stage::Down;
            state.rep_count += 1;
            return Evaluation::rep(state);
        }

        let feedback = match state.stage {
            Stage::Up => Feedback::warning("Go lower!"),
            Stage::Down if highest > LUNGE_UP_DEG => Feedback::info("Bring your feet together"),
            Stage::Down => Feedback::info("Push back to standing"),
            Stage::Unknown => Feedback::info("Stand tall to begin"),
        };
        Evaluation::feedback(feedback)
    }
}

/// Arms-down sets `Down`; raising the arms from `Down` counts the rep.
///
/// The phase names are the reverse of the other rules: the rep lands on the
/// Down -> Up transition.
#[derive(Debug)]
pub struct JumpingJackRule {
    side: Side,
}

impl TrackingRule for JumpingJackRule {
    fn required_joints(&self) -> Vec<Joint> {
        vec![self.side.shoulder(), self.side.wrist()]
    }

    fn evaluate(&self, pose: &PoseSnapshot, state: &mut TrackerState, _now: f64) -> Evaluation {
        let (Some(shoulder), Some(wrist)) =
            (pose.point(self.side.shoulder()), pose.point(self.side.wrist()))
        else {
            return lost_track();
        };

        // image y grows downwards
        if wrist.1 > shoulder.1 {
            state.stage = Stage::Down;
            return Evaluation::feedback(Feedback::info("Arms up!"));
        }

        if wrist.1 < shoulder.1 && state.stage == Stage::Down {
            state.stage = Stage::Up;
            state.rep_count += 1;
            return Evaluation::rep(state);
        }

        Evaluation::feedback(Feedback::info("Bring your arms down"))
    }
}

#[derive(Debug)]
pub struct PlankRule {
    side: Side,
}

impl TrackingRule for PlankRule {
    fn required_joints(&self) -> Vec<Joint> {
        vec![self.side.shoulder(), self.side.hip(), self.side.ankle()]
    }

    fn evaluate(&self, pose: &PoseSnapshot, state: &mut TrackerState, now: f64) -> Evaluation {
        let Some((shoulder, hip, ankle)) =
            points(pose, self.side.shoulder(), self.side.hip(), self.side.ankle())
        else {
            return lost_track();
        };
        let body_angle = angle(shoulder, hip, ankle);
        trace!(body_angle, "plank sample");

        if (PLANK_MIN_DEG..=PLANK_MAX_DEG).contains(&body_angle) {
            let delta = match (state.hold_timer_running, state.last_sample_timestamp) {
                (true, Some(last)) => (now - last).max(0.0),
                _ => 0.0,
            };
            state.elapsed_hold_time += delta;
            state.hold_timer_running = true;
            state.last_sample_timestamp = Some(now);

            Evaluation {
                feedback: Feedback::success(format!("Hold it! {:.1}s", state.elapsed_hold_time)),
                rep_completed: false,
                hold_delta: delta,
            }
        } else {
            state.hold_timer_running = false;
            state.last_sample_timestamp = None;
            Evaluation::feedback(Feedback::warning("Straighten your body"))
        }
    }
}

/// Rule for names outside the vocabulary. Never counts anything.
#[derive(Debug)]
pub struct UntrackedRule {
    name: String,
}

impl TrackingRule for UntrackedRule {
    fn required_joints(&self) -> Vec<Joint> {
        Vec::new()
    }

    fn evaluate(&self, _pose: &PoseSnapshot, _state: &mut TrackerState, _now: f64) -> Evaluation {
        Evaluation::feedback(Feedback::info(format!(
            "I can't track {} yet. Press s to skip.",
            self.name
        )))
    }

    fn is_trackable(&self) -> bool {
        false
    }
}

/// Pick the rule for an exercise once, when the plan item is loaded
pub fn rule_for(item: &ExercisePlanItem, side: Side) -> Box<dyn TrackingRule> {
    match item.exercise() {
        Some(ExerciseKind::BodyweightSquats) => Box::new(SquatRule { side }),
        Some(ExerciseKind::PushUps) => Box::new(PushUpRule { side }),
        Some(ExerciseKind::Lunges) => Box::new(LungeRule),
        Some(ExerciseKind::JumpingJacks) => Box::new(JumpingJackRule { side }),
        Some(ExerciseKind::Plank) => Box::new(PlankRule { side }),
        None => Box::new(UntrackedRule {
            name: item.name.clone(),
        }),
    }
}

/// Drives one plan item's rule over a stream of frames
#[derive(Debug)]
pub struct ExerciseTracker {
    item: ExercisePlanItem,
    rule: Box<dyn TrackingRule>,
    gate: VisibilityGate,
    state: TrackerState,
    feedback: Feedback,
    /// Set when the last frame was not evaluated; a running hold restarts from the next visible frame
    resync: bool,
}

impl ExerciseTracker {
    pub fn new(item: ExercisePlanItem, gate: VisibilityGate, side: Side) -> Self {
        let rule = rule_for(&item, side);
        debug!(exercise = %item.name, trackable = rule.is_trackable(), "tracker loaded");
        Self {
            item,
            rule,
            gate,
            state: TrackerState::default(),
            feedback: Feedback::info("Getting ready..."),
            resync: false,
        }
    }

    /// Feed one frame. `None` means the pose model found nobody.
    pub fn update(&mut self, pose: Option<&PoseSnapshot>, now: f64) -> FrameOutcome {
        let joints = self.rule.required_joints();
        let visible_pose = pose.filter(|p| !p.is_empty() && self.gate.is_visible(p, &joints));

        let Some(pose) = visible_pose else {
            self.feedback = Feedback::info(self.not_visible_message(pose, &joints));
            self.resync = true;
            return FrameOutcome {
                feedback: self.feedback.clone(),
                visible: false,
                rep_completed: false,
                hold_delta: 0.0,
                complete: self.is_complete(),
            };
        };

        if std::mem::take(&mut self.resync) && self.state.hold_timer_running {
            self.state.last_sample_timestamp = Some(now);
        }
        let evaluation = self.rule.evaluate(pose, &mut self.state, now);
        if evaluation.rep_completed {
            debug!(exercise = %self.item.name, reps = self.state.rep_count, "rep counted");
        }
        self.feedback = evaluation.feedback.clone();

        FrameOutcome {
            feedback: evaluation.feedback,
            visible: true,
            rep_completed: evaluation.rep_completed,
            hold_delta: evaluation.hold_delta,
            complete: self.is_complete(),
        }
    }

    fn not_visible_message(&self, pose: Option<&PoseSnapshot>, joints: &[Joint]) -> String {
        match pose {
            Some(p) if !p.is_empty() => {
                let hidden = self.gate.hidden(p, joints);
                format!(
                    "Step back, I can't see your {}",
                    hidden.iter().map(Joint::label).join(", ")
                )
            }
            _ => "Step back, I can't see you".to_string(),
        }
    }

    /// Completion predicate; stays true once reached
    pub fn is_complete(&self) -> bool {
        if !self.rule.is_trackable() {
            return false;
        }
        match self.item.kind {
            TargetKind::Reps => self.state.rep_count >= self.item.target,
            TargetKind::Time => self.state.elapsed_hold_time >= f64::from(self.item.target),
        }
    }

    pub fn is_trackable(&self) -> bool {
        self.rule.is_trackable()
    }

    pub fn item(&self) -> &ExercisePlanItem {
        &self.item
    }

    /// Joints the active rule gates on
    pub fn required_joints(&self) -> Vec<Joint> {
        self.rule.required_joints()
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    pub fn rep_count(&self) -> u32 {
        self.state.rep_count
    }

    pub fn elapsed_hold_time(&self) -> f64 {
        self.state.elapsed_hold_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Landmark;

    const VIS: f64 = 0.95;

    /// Left leg with the knee bent to roughly `deg` degrees
    fn leg_at(deg: f64) -> PoseSnapshot {
        let knee = (0.5, 0.6);
        let hip = (0.5, 0.4);
        // ankle rotated away from the hip->knee ray
        let theta = (90.0 + (180.0 - deg)).to_radians();
        let ankle = (knee.0 + 0.2 * theta.cos(), knee.1 + 0.2 * theta.sin());
        PoseSnapshot::new()
            .with(Joint::LeftHip, Landmark::new(hip.0, hip.1, VIS))
            .with(Joint::LeftKnee, Landmark::new(knee.0, knee.1, VIS))
            .with(Joint::LeftAnkle, Landmark::new(ankle.0, ankle.1, VIS))
    }

    fn squat_tracker(target: u32) -> ExerciseTracker {
        ExerciseTracker::new(
            ExercisePlanItem::reps(ExerciseKind::BodyweightSquats, target),
            VisibilityGate::default(),
            Side::Left,
        )
    }

    #[test]
    fn leg_fixture_produces_requested_angle() {
        for deg in [170.0, 120.0, 80.0] {
            let pose = leg_at(deg);
            let measured = angle(
                pose.point(Joint::LeftHip).unwrap(),
                pose.point(Joint::LeftKnee).unwrap(),
                pose.point(Joint::LeftAnkle).unwrap(),
            );
            assert!((measured - deg).abs() < 1e-6, "{measured} vs {deg}");
        }
    }

    #[test]
    fn squat_counts_one_rep_per_cycle() {
        let mut tracker = squat_tracker(10);
        let mut t = 0.0;
        let mut feed = |tracker: &mut ExerciseTracker, deg: f64| {
            t += 0.1;
            tracker.update(Some(&leg_at(deg)), t)
        };

        feed(&mut tracker, 170.0);
        assert_eq!(tracker.state().stage, Stage::Up);

        let outcome = feed(&mut tracker, 80.0);
        assert!(outcome.rep_completed);
        assert_eq!(outcome.feedback.severity, Severity::Success);

        // staying down must not count again
        for _ in 0..25 {
            let outcome = feed(&mut tracker, 80.0);
            assert!(!outcome.rep_completed);
        }
        feed(&mut tracker, 170.0);
        assert_eq!(tracker.rep_count(), 1);
    }

    #[test]
    fn squat_needs_to_start_from_up() {
        let mut tracker = squat_tracker(10);
        tracker.update(Some(&leg_at(80.0)), 0.0);
        assert_eq!(tracker.rep_count(), 0);
        assert_eq!(tracker.state().stage, Stage::Unknown);
    }

    #[test]
    fn go_lower_between_thresholds() {
        let mut tracker = squat_tracker(10);
        tracker.update(Some(&leg_at(170.0)), 0.0);
        let outcome = tracker.update(Some(&leg_at(120.0)), 0.1);
        assert_eq!(outcome.feedback, Feedback::warning("Go lower!"));
        assert_eq!(tracker.rep_count(), 0);
    }

    #[test]
    fn reps_target_completes_on_tenth_cycle() {
        let mut tracker = squat_tracker(10);
        let mut t = 0.0;
        for cycle in 1..=10 {
            tracker.update(Some(&leg_at(170.0)), t);
            t += 0.5;
            let outcome = tracker.update(Some(&leg_at(80.0)), t);
            t += 0.5;
            assert_eq!(outcome.complete, cycle == 10, "cycle {cycle}");
        }
        // idempotent
        assert!(tracker.is_complete());
        tracker.update(Some(&leg_at(170.0)), t);
        assert!(tracker.is_complete());
    }

    #[test]
    fn hidden_joint_leaves_state_untouched() {
        let mut tracker = squat_tracker(10);
        tracker.update(Some(&leg_at(170.0)), 0.0);
        let before = tracker.state().clone();

        let mut pose = leg_at(80.0);
        pose = pose.with(Joint::LeftKnee, Landmark::new(0.5, 0.6, 0.3));
        let outcome = tracker.update(Some(&pose), 0.1);

        assert!(!outcome.visible);
        assert_eq!(tracker.state(), &before);
        assert_eq!(outcome.feedback.severity, Severity::Info);
        assert!(outcome.feedback.text.contains("left knee"));
    }

    #[test]
    fn no_detection_leaves_state_untouched() {
        let mut tracker = squat_tracker(10);
        tracker.update(Some(&leg_at(170.0)), 0.0);
        let before = tracker.state().clone();

        let outcome = tracker.update(None, 0.1);
        assert!(!outcome.visible);
        assert_eq!(outcome.feedback.text, "Step back, I can't see you");
        assert_eq!(tracker.state(), &before);

        let outcome = tracker.update(Some(&PoseSnapshot::new()), 0.2);
        assert!(!outcome.visible);
        assert_eq!(tracker.state(), &before);
    }

    fn arm(side: Side, deg: f64, visibility: f64) -> [(Joint, Landmark); 3] {
        let elbow = (0.5, 0.5);
        let shoulder = (0.3, 0.5);
        let theta = (180.0 - deg).to_radians();
        let wrist = (elbow.0 + 0.2 * theta.cos(), elbow.1 + 0.2 * theta.sin());
        [
            (side.shoulder(), Landmark::new(shoulder.0, shoulder.1, visibility)),
            (side.elbow(), Landmark::new(elbow.0, elbow.1, visibility)),
            (side.wrist(), Landmark::new(wrist.0, wrist.1, visibility)),
        ]
    }

    #[test]
    fn push_up_cycle() {
        let mut tracker = ExerciseTracker::new(
            ExercisePlanItem::reps(ExerciseKind::PushUps, 2),
            VisibilityGate::default(),
            Side::Right,
        );
        let up: PoseSnapshot = arm(Side::Right, 170.0, VIS).into_iter().collect();
        let mid: PoseSnapshot = arm(Side::Right, 120.0, VIS).into_iter().collect();
        let down: PoseSnapshot = arm(Side::Right, 80.0, VIS).into_iter().collect();

        tracker.update(Some(&up), 0.0);
        assert_eq!(tracker.update(Some(&mid), 0.1).feedback.text, "Go lower!");
        assert!(tracker.update(Some(&down), 0.2).rep_completed);
        tracker.update(Some(&up), 0.3);
        let outcome = tracker.update(Some(&down), 0.4);
        assert!(outcome.complete);
        assert_eq!(tracker.rep_count(), 2);
    }

    #[test]
    fn push_up_ignores_other_side() {
        let mut tracker = ExerciseTracker::new(
            ExercisePlanItem::reps(ExerciseKind::PushUps, 2),
            VisibilityGate::default(),
            Side::Left,
        );
        let right_only: PoseSnapshot = arm(Side::Right, 170.0, VIS).into_iter().collect();
        let outcome = tracker.update(Some(&right_only), 0.0);
        assert!(!outcome.visible);
        assert_eq!(tracker.state(), &TrackerState::default());
    }

    fn lunge_pose(left: f64, right: f64) -> PoseSnapshot {
        let mut pose = PoseSnapshot::new();
        for (side, deg, x) in [(Side::Left, left, 0.4), (Side::Right, right, 0.6)] {
            let hip = (x, 0.4);
            let knee = (x, 0.6);
            let theta = (90.0 + (180.0 - deg)).to_radians();
            let ankle = (knee.0 + 0.2 * theta.cos(), knee.1 + 0.2 * theta.sin());
            pose = pose
                .with(side.hip(), Landmark::new(hip.0, hip.1, VIS))
                .with(side.knee(), Landmark::new(knee.0, knee.1, VIS))
                .with(side.ankle(), Landmark::new(ankle.0, ankle.1, VIS));
        }
        pose
    }

    #[test]
    fn lunge_counts_when_either_knee_drops() {
        let mut tracker = ExerciseTracker::new(
            ExercisePlanItem::reps(ExerciseKind::Lunges, 5),
            VisibilityGate::default(),
            Side::Left,
        );

        tracker.update(Some(&lunge_pose(170.0, 170.0)), 0.0);
        assert_eq!(tracker.state().stage, Stage::Up);

        // only one leg straight is not "up"
        let outcome = tracker.update(Some(&lunge_pose(170.0, 130.0)), 0.1);
        assert_eq!(outcome.feedback.text, "Go lower!");

        assert!(tracker.update(Some(&lunge_pose(170.0, 95.0)), 0.2).rep_completed);
        assert!(!tracker.update(Some(&lunge_pose(90.0, 90.0)), 0.3).rep_completed);
        tracker.update(Some(&lunge_pose(170.0, 170.0)), 0.4);
        assert!(tracker.update(Some(&lunge_pose(95.0, 170.0)), 0.5).rep_completed);
        assert_eq!(tracker.rep_count(), 2);
    }

    fn arms(wrist_y: f64) -> PoseSnapshot {
        PoseSnapshot::new()
            .with(Joint::LeftShoulder, Landmark::new(0.4, 0.4, VIS))
            .with(Joint::LeftWrist, Landmark::new(0.3, wrist_y, VIS))
    }

    #[test]
    fn jumping_jack_counts_on_arms_raised_after_down() {
        let mut tracker = ExerciseTracker::new(
            ExercisePlanItem::reps(ExerciseKind::JumpingJacks, 20),
            VisibilityGate::default(),
            Side::Left,
        );

        // raised before ever being down: nothing
        assert!(!tracker.update(Some(&arms(0.2)), 0.0).rep_completed);
        assert_eq!(tracker.rep_count(), 0);

        tracker.update(Some(&arms(0.6)), 0.1);
        assert_eq!(tracker.state().stage, Stage::Down);

        let outcome = tracker.update(Some(&arms(0.2)), 0.2);
        assert!(outcome.rep_completed);
        assert_eq!(tracker.state().stage, Stage::Up);

        // arms held up
        assert!(!tracker.update(Some(&arms(0.2)), 0.3).rep_completed);
        assert_eq!(tracker.rep_count(), 1);
    }

    fn body(bend_deg: f64) -> PoseSnapshot {
        let hip = (0.5, 0.5);
        let shoulder = (0.2, 0.5);
        let theta = (180.0 - bend_deg).to_radians();
        let ankle = (hip.0 + 0.3 * theta.cos(), hip.1 + 0.3 * theta.sin());
        PoseSnapshot::new()
            .with(Joint::LeftShoulder, Landmark::new(shoulder.0, shoulder.1, VIS))
            .with(Joint::LeftHip, Landmark::new(hip.0, hip.1, VIS))
            .with(Joint::LeftAnkle, Landmark::new(ankle.0, ankle.1, VIS))
    }

    fn plank_tracker(target: u32) -> ExerciseTracker {
        ExerciseTracker::new(
            ExercisePlanItem::timed(ExerciseKind::Plank, target),
            VisibilityGate::default(),
            Side::Left,
        )
    }

    #[test]
    fn plank_accumulates_only_in_range() {
        let mut tracker = plank_tracker(30);

        tracker.update(Some(&body(175.0)), 0.0);
        assert!(tracker.state().hold_timer_running);
        assert_eq!(tracker.elapsed_hold_time(), 0.0);

        tracker.update(Some(&body(172.0)), 1.0);
        tracker.update(Some(&body(178.0)), 2.5);
        assert!((tracker.elapsed_hold_time() - 2.5).abs() < 1e-9);

        // sagging hips freeze the clock
        let outcome = tracker.update(Some(&body(130.0)), 3.0);
        assert_eq!(outcome.feedback.severity, Severity::Warning);
        assert!(!tracker.state().hold_timer_running);
        assert!((tracker.elapsed_hold_time() - 2.5).abs() < 1e-9);

        // re-entering resumes without counting the gap
        tracker.update(Some(&body(176.0)), 10.0);
        assert!((tracker.elapsed_hold_time() - 2.5).abs() < 1e-9);
        let outcome = tracker.update(Some(&body(176.0)), 11.0);
        assert!((outcome.hold_delta - 1.0).abs() < 1e-9);
        assert!((tracker.elapsed_hold_time() - 3.5).abs() < 1e-9);
    }

    #[test]
    fn plank_hidden_frames_do_not_stop_the_clock_state() {
        let mut tracker = plank_tracker(30);
        tracker.update(Some(&body(175.0)), 0.0);
        tracker.update(Some(&body(175.0)), 1.0);
        let before = tracker.state().clone();

        tracker.update(None, 2.0);
        assert_eq!(tracker.state(), &before);
    }

    #[test]
    fn plank_time_out_of_view_is_not_credited() {
        let mut tracker = plank_tracker(30);
        tracker.update(Some(&body(175.0)), 0.0);
        tracker.update(Some(&body(175.0)), 1.0);
        for t in 2..30 {
            tracker.update(None, f64::from(t));
        }

        let back = tracker.update(Some(&body(175.0)), 30.0);
        assert_eq!(back.hold_delta, 0.0);
        assert!(!back.complete);
        assert!((tracker.elapsed_hold_time() - 1.0).abs() < 1e-9);

        tracker.update(Some(&body(175.0)), 32.0);
        assert!((tracker.elapsed_hold_time() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn plank_gap_after_hidden_joints_is_not_credited() {
        let mut tracker = plank_tracker(30);
        tracker.update(Some(&body(175.0)), 0.0);
        tracker.update(Some(&body(175.0)), 2.0);
        tracker.update(Some(&PoseSnapshot::new()), 20.0);
        tracker.update(Some(&body(175.0)), 25.0);
        assert!((tracker.elapsed_hold_time() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn plank_ignores_time_going_backwards() {
        let mut tracker = plank_tracker(30);
        tracker.update(Some(&body(175.0)), 5.0);
        tracker.update(Some(&body(175.0)), 4.0);
        assert_eq!(tracker.elapsed_hold_time(), 0.0);
    }

    #[test]
    fn time_target_never_completes_early() {
        let mut tracker = plank_tracker(30);
        let mut t = 0.0;
        while t < 29.5 {
            let outcome = tracker.update(Some(&body(175.0)), t);
            assert!(!outcome.complete, "completed early at {t}");
            t += 0.5;
        }
        let mut done = false;
        for _ in 0..4 {
            done = tracker.update(Some(&body(175.0)), t).complete;
            t += 0.5;
        }
        assert!(done);
        assert!(tracker.elapsed_hold_time() >= 30.0);
    }

    #[test]
    fn untracked_exercise_never_completes() {
        let item = ExercisePlanItem::new("Burpees", TargetKind::Reps, 0);
        let mut tracker = ExerciseTracker::new(item, VisibilityGate::default(), Side::Left);

        assert!(!tracker.is_trackable());
        let outcome = tracker.update(Some(&leg_at(170.0)), 0.0);
        assert!(!outcome.complete);
        assert!(outcome.feedback.text.contains("Burpees"));
        assert!(!tracker.is_complete());
    }

    #[test]
    fn every_rule_ignores_low_visibility() {
        let items = [
            ExercisePlanItem::reps(ExerciseKind::BodyweightSquats, 5),
            ExercisePlanItem::reps(ExerciseKind::PushUps, 5),
            ExercisePlanItem::reps(ExerciseKind::Lunges, 5),
            ExercisePlanItem::reps(ExerciseKind::JumpingJacks, 5),
            ExercisePlanItem::timed(ExerciseKind::Plank, 5),
        ];
        let dim: PoseSnapshot = Joint::ALL
            .into_iter()
            .map(|j| (j, Landmark::new(0.5, 0.5, 0.2)))
            .collect();

        for item in items {
            let mut tracker = ExerciseTracker::new(item, VisibilityGate::default(), Side::Left);
            let outcome = tracker.update(Some(&dim), 1.0);
            assert!(!outcome.visible);
            assert_eq!(tracker.state(), &TrackerState::default());
        }
    }
}
