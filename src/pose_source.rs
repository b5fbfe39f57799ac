use crate::error::CaptureError;
use crate::pose::{Joint, Landmark, PoseSnapshot};
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// One processed camera frame
#[derive(Debug, Clone, PartialEq)]
pub struct PoseFrame {
    /// Seconds on the source's own clock
    pub timestamp: f64,
    /// `None` when the pose model detected nobody
    pub pose: Option<PoseSnapshot>,
}

impl PoseFrame {
    pub fn detected(timestamp: f64, pose: PoseSnapshot) -> Self {
        Self {
            timestamp,
            pose: Some(pose),
        }
    }

    pub fn empty(timestamp: f64) -> Self {
        Self {
            timestamp,
            pose: None,
        }
    }
}

/// Producer of pose frames (camera + pose model, or a recording of them)
pub trait PoseSource {
    /// Block until the next frame is available
    fn next_frame(&mut self) -> Result<PoseFrame, CaptureError>;
}

#[derive(Deserialize)]
struct RawFrame {
    t: f64,
    #[serde(default)]
    landmarks: Option<HashMap<String, Landmark>>,
}

impl From<RawFrame> for PoseFrame {
    fn from(raw: RawFrame) -> Self {
        let pose = raw.landmarks.map(|landmarks| {
            landmarks
                .into_iter()
                .filter_map(|(name, landmark)| Joint::from_name(&name).map(|j| (j, landmark)))
                .collect::<PoseSnapshot>()
        });
        Self {
            timestamp: raw.t,
            pose,
        }
    }
}

/// Parse one JSON Lines record. Names outside the joint vocabulary are dropped.
pub fn parse_frame(line: &str, line_no: usize) -> Result<PoseFrame, CaptureError> {
    serde_json::from_str::<RawFrame>(line)
        .map(PoseFrame::from)
        .map_err(|source| CaptureError::Malformed {
            line: line_no,
            source,
        })
}

/// Reads frames from a JSON Lines stream: a recorded file, or a FIFO that a
/// pose model process writes to.
///
/// With pacing enabled the source sleeps so frames are handed out no faster
/// than their timestamps say they were captured.
pub struct ReplayPoseSource<R: BufRead> {
    reader: R,
    line_no: usize,
    pace: bool,
    clock: Option<(Instant, f64)>,
}

impl ReplayPoseSource<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P, pace: bool) -> Result<Self, CaptureError> {
        let file = File::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), pace, "opened pose stream");
        Ok(Self::from_reader(BufReader::new(file), pace))
    }
}

impl<R: BufRead> ReplayPoseSource<R> {
    pub fn from_reader(reader: R, pace: bool) -> Self {
        Self {
            reader,
            line_no: 0,
            pace,
            clock: None,
        }
    }

    fn wait_for(&mut self, timestamp: f64) {
        if !self.pace {
            return;
        }
        match self.clock {
            None => self.clock = Some((Instant::now(), timestamp)),
            Some((started, first)) => {
                let due = Duration::try_from_secs_f64((timestamp - first).max(0.0))
                    .ok()
                    .and_then(|offset| started.checked_add(offset));
                let Some(due) = due else {
                    warn!(line = self.line_no, timestamp, "timestamp out of range, not pacing frame");
                    return;
                };
                let now = Instant::now();
                if due > now {
                    std::thread::sleep(due - now);
                }
            }
        }
    }
}

impl<R: BufRead> PoseSource for ReplayPoseSource<R> {
    fn next_frame(&mut self) -> Result<PoseFrame, CaptureError> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(CaptureError::StreamEnded);
            }
            self.line_no += 1;
            if !line.trim().is_empty() {
                break;
            }
        }

        let frame = parse_frame(line.trim(), self.line_no).inspect_err(|e| {
            warn!("{e}");
        })?;
        self.wait_for(frame.timestamp);
        Ok(frame)
    }
}

/// In-memory frames, handed out in order. Runs dry with `StreamEnded`.
#[derive(Debug, Default)]
pub struct ScriptedPoseSource {
    frames: VecDeque<PoseFrame>,
}

impl ScriptedPoseSource {
    pub fn new(frames: impl IntoIterator<Item = PoseFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn push(&mut self, frame: PoseFrame) {
        self.frames.push_back(frame);
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl PoseSource for ScriptedPoseSource {
    fn next_frame(&mut self) -> Result<PoseFrame, CaptureError> {
        self.frames.pop_front().ok_or(CaptureError::StreamEnded)
    }
}

/// Throughput policy: only every Nth acquired frame reaches the tracker
#[derive(Debug, Clone)]
pub struct FrameSkipper {
    every: u32,
    seen: u64,
}

impl FrameSkipper {
    pub fn new(every: u32) -> Self {
        Self {
            every: every.max(1),
            seen: 0,
        }
    }

    /// True when this frame should be processed
    pub fn admit(&mut self) -> bool {
        let admit = self.seen % u64::from(self.every) == 0;
        self.seen += 1;
        admit
    }

    pub fn reset(&mut self) {
        self.seen = 0;
    }
}
