use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of exercises that have a tracking rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExerciseKind {
    BodyweightSquats,
    PushUps,
    Plank,
    JumpingJacks,
    Lunges,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 5] = [
        ExerciseKind::BodyweightSquats,
        ExerciseKind::PushUps,
        ExerciseKind::Plank,
        ExerciseKind::JumpingJacks,
        ExerciseKind::Lunges,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ExerciseKind::BodyweightSquats => "Bodyweight Squats",
            ExerciseKind::PushUps => "Push-ups",
            ExerciseKind::Plank => "Plank",
            ExerciseKind::JumpingJacks => "Jumping Jacks",
            ExerciseKind::Lunges => "Lunges",
        }
    }

    /// Exact vocabulary match, ignoring case and surrounding whitespace
    pub fn from_name(name: &str) -> Option<ExerciseKind> {
        let wanted = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(wanted))
    }

    /// How this exercise is measured
    pub fn measure(&self) -> TargetKind {
        match self {
            ExerciseKind::Plank => TargetKind::Time,
            _ => TargetKind::Reps,
        }
    }

    /// Vocabulary as shown to the planner model
    pub fn vocabulary() -> String {
        Self::ALL.iter().map(|k| k.name()).join(", ")
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TargetKind {
    Reps,
    Time,
}

/// One exercise entry of a workout plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExercisePlanItem {
    pub name: String,
    pub kind: TargetKind,
    pub target: u32,
}

impl ExercisePlanItem {
    pub fn new(name: impl Into<String>, kind: TargetKind, target: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            target,
        }
    }

    pub fn reps(exercise: ExerciseKind, target: u32) -> Self {
        Self::new(exercise.name(), TargetKind::Reps, target)
    }

    pub fn timed(exercise: ExerciseKind, target: u32) -> Self {
        Self::new(exercise.name(), TargetKind::Time, target)
    }

    /// The tracking rule this item maps to, if its name is in the vocabulary
    pub fn exercise(&self) -> Option<ExerciseKind> {
        ExerciseKind::from_name(&self.name)
    }

    /// Short description such as "10 reps" or "30s hold"
    pub fn target_label(&self) -> String {
        match self.kind {
            TargetKind::Reps => format!("{} reps", self.target),
            TargetKind::Time => format!("{}s hold", self.target),
        }
    }
}

impl fmt::Display for ExercisePlanItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.target_label())
    }
}

/// Ordered, non-empty list of exercises for one session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutPlan {
    items: Vec<ExercisePlanItem>,
}

impl WorkoutPlan {
    /// Returns `None` for an empty list
    pub fn new(items: Vec<ExercisePlanItem>) -> Option<Self> {
        if items.is_empty() {
            None
        } else {
            Some(Self { items })
        }
    }

    /// Deterministic plan used whenever the planner cannot produce one
    pub fn fallback() -> Self {
        Self {
            items: vec![
                ExercisePlanItem::reps(ExerciseKind::BodyweightSquats, 10),
                ExercisePlanItem::reps(ExerciseKind::JumpingJacks, 20),
                ExercisePlanItem::timed(ExerciseKind::Plank, 30),
            ],
        }
    }

    pub fn items(&self) -> &[ExercisePlanItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&ExercisePlanItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Never true for a constructed plan
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExercisePlanItem> {
        self.items.iter()
    }
}
