use crate::error::ProfileError;
use serde::{Deserialize, Serialize};

const AGE_RANGE: (f64, f64) = (10.0, 100.0);
const WEIGHT_RANGE_KG: (f64, f64) = (25.0, 300.0);
const HEIGHT_RANGE_CM: (f64, f64) = (100.0, 250.0);

/// What the user told us on the welcome page
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub goal: String,
    pub age: Option<u32>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
}

impl UserProfile {
    pub fn with_goal(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            ..Self::default()
        }
    }

    /// Goal must be non-empty; body metrics are optional but must be plausible
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.goal.trim().is_empty() {
            return Err(ProfileError::EmptyGoal);
        }
        check_range("age", self.age.map(f64::from), AGE_RANGE)?;
        check_range("weight", self.weight_kg, WEIGHT_RANGE_KG)?;
        check_range("height", self.height_cm, HEIGHT_RANGE_CM)?;
        Ok(())
    }

    /// Body mass index when both weight and height are known
    pub fn bmi(&self) -> Option<f64> {
        let weight = self.weight_kg?;
        let height_m = self.height_cm? / 100.0;
        Some(weight / (height_m * height_m))
    }

    /// One line summary fed into planner prompts
    pub fn describe(&self) -> String {
        let mut parts = vec![format!("goal: {}", self.goal.trim())];
        if let Some(age) = self.age {
            parts.push(format!("age: {age}"));
        }
        if let Some(weight) = self.weight_kg {
            parts.push(format!("weight: {weight:.0} kg"));
        }
        if let Some(height) = self.height_cm {
            parts.push(format!("height: {height:.0} cm"));
        }
        parts.join(", ")
    }
}

fn check_range(
    field: &'static str,
    value: Option<f64>,
    (min, max): (f64, f64),
) -> Result<(), ProfileError> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(ProfileError::OutOfRange { field, min, max }),
        _ => Ok(()),
    }
}

/// Parse an optional numeric form field; blank means "not given"
pub fn parse_optional<T: std::str::FromStr>(
    field: &'static str,
    raw: &str,
) -> Result<Option<T>, ProfileError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<T>()
        .map(Some)
        .map_err(|_| ProfileError::NotANumber { field })
}
