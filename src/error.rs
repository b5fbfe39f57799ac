//! Error types shared across the crate.
//!
//! Collaborator errors (`PlannerError`, `AnnounceError`) are always caught at
//! the call site and replaced by a fallback; only `CaptureError` changes what
//! the user sees.

use crate::session::Page;
use thiserror::Error;

/// Application level error for the binary and the persistence layer
#[derive(Debug, Error)]
pub enum GymBroError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Logging setup failed: {0}")]
    Logging(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

pub type Result<T> = std::result::Result<T, GymBroError>;

/// Failure to acquire the next pose frame. Terminal for the workout loop.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("pose stream read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed pose frame on line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("pose stream ended")]
    StreamEnded,
}

/// Failure of the plan / advice generators
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("planner request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("planner unavailable: {0}")]
    Unavailable(String),

    #[error("planner returned no exercises")]
    Empty,

    #[error("planner returned a malformed plan: {0}")]
    Malformed(String),
}

/// Failure of the speech/announcement sink
#[derive(Debug, Error)]
pub enum AnnounceError {
    #[error("failed to launch speech command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("speech command is empty")]
    EmptyCommand,
}

/// Rejected user input on the welcome form
#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("Please enter a fitness goal.")]
    EmptyGoal,

    #[error("{field} must be a number")]
    NotANumber { field: &'static str },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
}

/// Rejected session transition; the session state is left untouched
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("cannot {action} while on the {page:?} page")]
    InvalidTransition { action: &'static str, page: Page },

    #[error(transparent)]
    Profile(#[from] ProfileError),
}
