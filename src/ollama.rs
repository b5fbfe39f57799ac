//! Planner and coach backed by a local Ollama server.
//!
//! Uses the non-streaming `/api/chat` endpoint with a blocking client; the
//! session treats every failure here as "use the fallback".

use crate::coach::{Coach, MotivationContext};
use crate::error::PlannerError;
use crate::exercise::WorkoutPlan;
use crate::planner::{parse_plan_response, plan_prompt, Planner};
use crate::profile::UserProfile;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "gemma:2b";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Coach text is requested between exercises, on the UI thread
const COACH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, PlannerError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("gymbro/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    /// Send a single user prompt and return the assistant's reply
    pub fn ask(&self, prompt: &str) -> Result<String, PlannerError> {
        self.ask_within(prompt, REQUEST_TIMEOUT)
    }

    fn ask_within(&self, prompt: &str, timeout: Duration) -> Result<String, PlannerError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".into(),
                content: prompt.to_string(),
            }],
            stream: false,
        };

        debug!(url = %self.chat_url(), model = %self.model, ?timeout, "sending chat request");
        let response: ChatResponse = self
            .client
            .post(self.chat_url())
            .timeout(timeout)
            .json(&request)
            .send()?
            .error_for_status()?
            .json()?;

        Ok(response.message.content)
    }
}

impl Planner for OllamaClient {
    fn generate_plan(&self, profile: &UserProfile) -> Result<WorkoutPlan, PlannerError> {
        let answer = self.ask(&plan_prompt(profile))?;
        parse_plan_response(&answer)
    }
}

impl Coach for OllamaClient {
    fn motivation(&self, ctx: &MotivationContext) -> Result<String, PlannerError> {
        self.ask_within(
            &format!(
                "You are GYM BRO, an upbeat fitness coach. The user wants to {goal}. They have \
                 finished {done} of {total} exercises and {exercise} is next. Reply with one \
                 short, energetic sentence of encouragement and nothing else.",
                goal = ctx.goal.trim(),
                done = ctx.completed,
                total = ctx.total,
                exercise = ctx.exercise,
            ),
            COACH_TIMEOUT,
        )
    }

    fn nutrition_advice(&self, profile: &UserProfile) -> Result<String, PlannerError> {
        self.ask_within(
            &format!(
                "You are GYM BRO, a friendly fitness coach. Give two short, practical nutrition \
                 tips for someone with this profile ({}). Plain text, no lists, under 60 words.",
                profile.describe()
            ),
            COACH_TIMEOUT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coach::text_or_fallback;
    use crate::planner::{plan_or_fallback, PlanSource};
    use std::net::TcpListener;
    use std::time::Instant;

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = OllamaClient::new("http://localhost:11434/", DEFAULT_MODEL).unwrap();
        assert_eq!(client.chat_url(), "http://localhost:11434/api/chat");
        assert_eq!(client.model(), "gemma:2b");
    }

    #[test]
    fn request_shape() {
        let request = ChatRequest {
            model: "gemma:2b",
            messages: vec![ChatMessage {
                role: "user".into(),
                content: "hi".into(),
            }],
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gemma:2b");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn unreachable_server_falls_back() {
        // port 9 (discard) is not an Ollama server
        let client = OllamaClient::new("http://127.0.0.1:9", DEFAULT_MODEL).unwrap();
        let profile = UserProfile::with_goal("get fit");

        let (plan, source) = plan_or_fallback(&client, &profile);
        assert_eq!(source, PlanSource::Fallback);
        assert_eq!(plan, WorkoutPlan::fallback());
        assert_eq!(
            text_or_fallback(client.nutrition_advice(&profile)),
            crate::coach::FALLBACK_MESSAGE
        );
    }

    #[test]
    fn silent_server_does_not_stall_coach_for_long() {
        // accepts connections into the backlog but never answers
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let client = OllamaClient::new(url, DEFAULT_MODEL).unwrap();
        let ctx = MotivationContext {
            goal: "get fit",
            exercise: "Plank",
            completed: 1,
            total: 3,
        };

        let started = Instant::now();
        assert!(client.motivation(&ctx).is_err());
        assert!(started.elapsed() < COACH_TIMEOUT * 3);
        assert!(COACH_TIMEOUT < REQUEST_TIMEOUT);
        drop(listener);
    }
}
