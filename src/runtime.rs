use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Everything the workout loop reacts to besides pose frames
#[derive(Clone, Debug)]
pub enum WorkoutEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Where key and resize events come from
pub trait EventSource: Send + 'static {
    /// Wait at most `timeout` for the next event.
    /// `Err(Timeout)` when nothing arrived in time.
    fn recv_timeout(&self, timeout: Duration) -> Result<WorkoutEvent, RecvTimeoutError>;

    /// Next queued event without blocking
    fn try_recv(&self) -> Option<WorkoutEvent>;
}

fn try_recv_from(rx: &Receiver<WorkoutEvent>) -> Option<WorkoutEvent> {
    match rx.try_recv() {
        Ok(ev) => Some(ev),
        Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
    }
}

/// Terminal input read on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<WorkoutEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) => tx.send(WorkoutEvent::Key(key)),
                Ok(CtEvent::Resize(_, _)) => tx.send(WorkoutEvent::Resize),
                Ok(_) => Ok(()),
                Err(e) => {
                    tracing::warn!("terminal event reader stopped: {e}");
                    break;
                }
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<WorkoutEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn try_recv(&self) -> Option<WorkoutEvent> {
        try_recv_from(&self.rx)
    }
}

/// Loop cadence
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Constant loop cadence
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed event source for headless tests
pub struct TestEventSource {
    rx: Receiver<WorkoutEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<WorkoutEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<WorkoutEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn try_recv(&self) -> Option<WorkoutEvent> {
        try_recv_from(&self.rx)
    }
}

/// Hands the loop one event (or tick) per call
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Next event, or `Tick` once the tick interval passes without one
    pub fn step(&self) -> WorkoutEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                WorkoutEvent::Tick
            }
        }
    }

    /// All events queued right now. Used between pose frames, where the
    /// frame source does the pacing.
    pub fn drain(&self) -> Vec<WorkoutEvent> {
        std::iter::from_fn(|| self.event_source.try_recv()).collect()
    }

    pub fn tick_interval(&self) -> Duration {
        self.ticker.interval()
    }
}

/// Turns wall-clock time into whole rest countdown ticks.
///
/// The redraw tick is much shorter than a rest tick; `due` reports how many
/// full periods elapsed since the last accounted one and carries the rest.
#[derive(Debug, Clone)]
pub struct RestClock {
    period: Duration,
    last: Option<Instant>,
}

impl RestClock {
    pub fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn due(&mut self, now: Instant) -> u32 {
        let Some(last) = self.last else {
            self.last = Some(now);
            return 0;
        };
        if self.period.is_zero() {
            self.last = Some(now);
            return 0;
        }

        let elapsed = now.saturating_duration_since(last);
        let ticks = (elapsed.as_nanos() / self.period.as_nanos()) as u32;
        if ticks > 0 {
            self.last = Some(last + self.period * ticks);
        }
        ticks
    }

    /// Forget the reference point; the next `due` call starts a new period
    pub fn reset(&mut self) {
        self.last = None;
    }
}
