// Pose tracking, the workout session and its collaborators. The terminal UI
// lives in the binary; nothing here depends on it.
pub mod announcer;
pub mod app_dirs;
pub mod celebration;
pub mod coach;
pub mod config;
pub mod error;
pub mod exercise;
pub mod geometry;
pub mod logging;
pub mod ollama;
pub mod planner;
pub mod pose;
pub mod pose_source;
pub mod profile;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod tracker;
pub mod visibility;
