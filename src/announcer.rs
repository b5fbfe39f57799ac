use crate::error::AnnounceError;
use std::process::{Command, Stdio};
use tracing::{info, warn};

/// Speech / announcement sink
pub trait Announcer {
    fn announce(&self, text: &str) -> Result<(), AnnounceError>;
}

/// Announce and swallow failures. Speech is never worth stopping a workout for.
pub fn announce_or_log(announcer: &dyn Announcer, text: &str) {
    if let Err(e) = announcer.announce(text) {
        warn!("announcement dropped: {e}");
    }
}

/// Writes announcements to the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn announce(&self, text: &str) -> Result<(), AnnounceError> {
        info!(target: "gymbro::speech", "{text}");
        Ok(())
    }
}

/// Runs an external text-to-speech program (e.g. `espeak`) with the text as
/// its last argument. The child is reaped on a background thread so the
/// frame loop never waits on speech.
#[derive(Debug, Clone)]
pub struct CommandAnnouncer {
    program: String,
    args: Vec<String>,
}

impl CommandAnnouncer {
    /// Split a command line such as `"espeak -s 160"` on whitespace
    pub fn parse(command: &str) -> Result<Self, AnnounceError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(AnnounceError::EmptyCommand)?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Announcer for CommandAnnouncer {
    fn announce(&self, text: &str) -> Result<(), AnnounceError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        std::thread::spawn(move || {
            if let Err(e) = child.wait() {
                warn!("speech command did not exit cleanly: {e}");
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        said: RefCell<Vec<String>>,
    }

    impl Announcer for Recorder {
        fn announce(&self, text: &str) -> Result<(), AnnounceError> {
            self.said.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    #[test]
    fn parse_splits_program_and_args() {
        let announcer = CommandAnnouncer::parse("espeak -s 160").unwrap();
        assert_eq!(announcer.program(), "espeak");
        assert_eq!(announcer.args, vec!["-s", "160"]);
        assert_matches!(CommandAnnouncer::parse("   "), Err(AnnounceError::EmptyCommand));
    }

    #[test]
    fn missing_program_is_logged_not_fatal() {
        let announcer = CommandAnnouncer::parse("gymbro-no-such-speech-binary").unwrap();
        assert_matches!(announcer.announce("hello"), Err(AnnounceError::Spawn(_)));
        // must not panic
        announce_or_log(&announcer, "hello");
    }

    #[test]
    fn announce_or_log_passes_text_through() {
        let recorder = Recorder::default();
        announce_or_log(&recorder, "5");
        assert_eq!(*recorder.said.borrow(), vec!["5".to_string()]);
        assert!(LogAnnouncer.announce("ok").is_ok());
    }
}
