use crate::error::PlannerError;
use crate::profile::UserProfile;
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::warn;

static COACH_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/coach");

/// Said whenever the coach has nothing better to offer
pub const FALLBACK_MESSAGE: &str = "Great work! Keep pushing.";

/// Inputs for a between-exercise pep talk
#[derive(Debug, Clone, Copy)]
pub struct MotivationContext<'a> {
    pub goal: &'a str,
    /// The exercise about to start
    pub exercise: &'a str,
    pub completed: usize,
    pub total: usize,
}

/// Short free-text generator for motivation and nutrition advice
pub trait Coach {
    fn motivation(&self, ctx: &MotivationContext) -> Result<String, PlannerError>;
    fn nutrition_advice(&self, profile: &UserProfile) -> Result<String, PlannerError>;
}

/// Use the generated text, or the generic fallback on failure or blank output
pub fn text_or_fallback(result: Result<String, PlannerError>) -> String {
    match result {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => FALLBACK_MESSAGE.to_string(),
        Err(e) => {
            warn!("coach text unavailable, using fallback: {e}");
            FALLBACK_MESSAGE.to_string()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Phrasebook {
    motivation: Vec<String>,
    nutrition: Vec<NutritionTopic>,
    general: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct NutritionTopic {
    keywords: Vec<String>,
    tips: Vec<String>,
}

fn load_phrasebook() -> Result<Phrasebook, PlannerError> {
    let contents = COACH_DIR
        .get_file("phrases.json")
        .and_then(|f| f.contents_utf8())
        .ok_or_else(|| PlannerError::Unavailable("phrasebook missing".into()))?;
    serde_json::from_str(contents).map_err(|e| PlannerError::Malformed(e.to_string()))
}

/// Canned phrases bundled with the binary; works without a model
#[derive(Debug, Default)]
pub struct OfflineCoach {
    phrases: Phrasebook,
}

impl OfflineCoach {
    pub fn new() -> Self {
        let phrases = load_phrasebook().unwrap_or_else(|e| {
            warn!("could not load coach phrases: {e}");
            Phrasebook::default()
        });
        Self { phrases }
    }
}

impl Coach for OfflineCoach {
    fn motivation(&self, ctx: &MotivationContext) -> Result<String, PlannerError> {
        let template = self
            .phrases
            .motivation
            .choose(&mut rand::thread_rng())
            .ok_or(PlannerError::Empty)?;

        Ok(template
            .replace("{done}", &ctx.completed.to_string())
            .replace("{total}", &ctx.total.to_string())
            .replace("{exercise}", ctx.exercise)
            .replace("{goal}", ctx.goal.trim()))
    }

    fn nutrition_advice(&self, profile: &UserProfile) -> Result<String, PlannerError> {
        let goal = profile.goal.to_lowercase();
        let tips = self
            .phrases
            .nutrition
            .iter()
            .find(|topic| topic.keywords.iter().any(|k| goal.contains(k.as_str())))
            .map(|topic| &topic.tips)
            .unwrap_or(&self.phrases.general);

        tips.choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(PlannerError::Empty)
    }
}
