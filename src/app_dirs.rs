use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "gymbro";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/gymbro`, or the platform data dir without a HOME
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join(APP_NAME))
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("history.db"))
    }

    pub fn log_dir() -> Option<PathBuf> {
        Self::state_dir()
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|pd| pd.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_and_logs_share_the_state_dir() {
        let (Some(state), Some(db), Some(logs)) =
            (AppDirs::state_dir(), AppDirs::db_path(), AppDirs::log_dir())
        else {
            return;
        };
        assert!(state.ends_with(APP_NAME));
        assert_eq!(db.parent(), Some(state.as_path()));
        assert_eq!(logs, state);
    }

    #[test]
    fn config_file_is_json() {
        if let Some(path) = AppDirs::config_path() {
            assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));
        }
    }
}
