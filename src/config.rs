use crate::app_dirs::AppDirs;
use crate::ollama::{DEFAULT_MODEL, DEFAULT_OLLAMA_URL};
use crate::pose::Side;
use crate::session::SessionConfig;
use crate::visibility::{VisibilityGate, DEFAULT_VISIBILITY_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub visibility_threshold: f64,
    pub rest_secs: u32,
    /// Process every Nth pose frame
    pub frame_skip: u32,
    pub tracked_side: Side,
    pub ollama_url: String,
    pub ollama_model: String,
    /// Never contact the model; fallback plan and canned phrases
    pub offline: bool,
    /// e.g. "espeak -s 160"; announcements only go to the log when unset
    pub speech_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            rest_secs: 15,
            frame_skip: 1,
            tracked_side: Side::Left,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ollama_model: DEFAULT_MODEL.to_string(),
            offline: false,
            speech_command: None,
        }
    }
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            rest_ticks: self.rest_secs,
            gate: VisibilityGate::new(self.visibility_threshold),
            side: self.tracked_side,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("gymbro_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), "ignoring unreadable config: {e}");
            Config::default()
        })
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nested").join("config.json"));
        let cfg = Config {
            visibility_threshold: 0.75,
            rest_secs: 5,
            frame_skip: 2,
            tracked_side: Side::Right,
            ollama_url: "http://gpu-box:11434".into(),
            ollama_model: "llama3".into(),
            offline: true,
            speech_command: Some("espeak".into()),
        };
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn missing_or_corrupt_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());

        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"rest_secs": 30, "tracked_side": "right"}"#).unwrap();

        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.rest_secs, 30);
        assert_eq!(cfg.tracked_side, Side::Right);
        assert_eq!(cfg.visibility_threshold, 0.6);
        assert_eq!(cfg.ollama_model, "gemma:2b");
    }

    #[test]
    fn session_config_reflects_fields() {
        let cfg = Config {
            visibility_threshold: 0.8,
            rest_secs: 7,
            tracked_side: Side::Right,
            ..Config::default()
        };
        let session = cfg.session_config();
        assert_eq!(session.rest_ticks, 7);
        assert_eq!(session.gate.threshold(), 0.8);
        assert_eq!(session.side, Side::Right);
    }
}
