use crate::error::PlannerError;
use crate::exercise::{ExerciseKind, ExercisePlanItem, TargetKind, WorkoutPlan};
use crate::profile::UserProfile;
use serde::Deserialize;
use tracing::{info, warn};

/// Produces a workout plan for a user's goal
pub trait Planner {
    fn generate_plan(&self, profile: &UserProfile) -> Result<WorkoutPlan, PlannerError>;
}

/// Where the session's plan came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSource {
    Generated,
    Fallback,
}

/// Ask the planner, substituting the fixed fallback plan on any failure
pub fn plan_or_fallback(planner: &dyn Planner, profile: &UserProfile) -> (WorkoutPlan, PlanSource) {
    match planner.generate_plan(profile) {
        Ok(plan) => {
            info!(exercises = plan.len(), "plan generated");
            (plan, PlanSource::Generated)
        }
        Err(e) => {
            warn!("plan generation failed, using fallback plan: {e}");
            (WorkoutPlan::fallback(), PlanSource::Fallback)
        }
    }
}

/// Planner that never reaches a model; the session always gets the fallback plan
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflinePlanner;

impl Planner for OfflinePlanner {
    fn generate_plan(&self, _profile: &UserProfile) -> Result<WorkoutPlan, PlannerError> {
        Err(PlannerError::Unavailable("offline mode".into()))
    }
}

/// Prompt asking the model for a JSON plan
pub fn plan_prompt(profile: &UserProfile) -> String {
    format!(
        "You are GYM BRO, a world-class AI fitness coach. The user's profile is ({profile}).\n\
         Create a simple 3-exercise beginner bodyweight workout routine using only these \
         exercises: {vocabulary}.\n\
         IMPORTANT: Respond with ONLY a JSON array and nothing else. Each element must look like \
         {{\"exercise\": \"Bodyweight Squats\", \"type\": \"reps\", \"target\": 15}}. \
         Use \"type\": \"time\" with a target in seconds for Plank, \"reps\" otherwise.",
        profile = profile.describe(),
        vocabulary = ExerciseKind::vocabulary(),
    )
}

#[derive(Debug, Deserialize)]
struct RawPlanItem {
    exercise: String,
    #[serde(rename = "type")]
    kind: String,
    target: i64,
}

/// Extract and validate the plan array from a model answer.
///
/// The answer may wrap the array in prose or code fences. Structural problems
/// (no array, empty list, unknown type, non-positive target, a type that
/// contradicts how a known exercise is measured) reject the whole plan.
/// Unknown exercise names are kept; they simply cannot be tracked.
pub fn parse_plan_response(text: &str) -> Result<WorkoutPlan, PlannerError> {
    let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) else {
        return Err(PlannerError::Malformed("no JSON array in response".into()));
    };
    if end < start {
        return Err(PlannerError::Malformed("no JSON array in response".into()));
    }

    let raw: Vec<RawPlanItem> = serde_json::from_str(&text[start..=end])
        .map_err(|e| PlannerError::Malformed(e.to_string()))?;

    let items = raw
        .into_iter()
        .map(validate_item)
        .collect::<Result<Vec<_>, _>>()?;

    WorkoutPlan::new(items).ok_or(PlannerError::Empty)
}

fn validate_item(raw: RawPlanItem) -> Result<ExercisePlanItem, PlannerError> {
    let kind = match raw.kind.trim().to_ascii_lowercase().as_str() {
        "reps" => TargetKind::Reps,
        "time" => TargetKind::Time,
        other => {
            return Err(PlannerError::Malformed(format!(
                "unknown type {other:?} for {}",
                raw.exercise
            )))
        }
    };

    let target = u32::try_from(raw.target)
        .ok()
        .filter(|t| *t > 0)
        .ok_or_else(|| {
            PlannerError::Malformed(format!("invalid target {} for {}", raw.target, raw.exercise))
        })?;

    // canonicalize known names so the plan reads the same as the vocabulary
    let name = match ExerciseKind::from_name(&raw.exercise) {
        Some(exercise) if exercise.measure() != kind => {
            return Err(PlannerError::Malformed(format!(
                "{} cannot be measured in {kind}",
                exercise.name()
            )))
        }
        Some(exercise) => exercise.name().to_string(),
        None => {
            warn!(exercise = %raw.exercise, "planner suggested an untrackable exercise");
            raw.exercise.trim().to_string()
        }
    };

    Ok(ExercisePlanItem::new(name, kind, target))
}
