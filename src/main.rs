mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use gymbro::{
    announcer::{Announcer, CommandAnnouncer, LogAnnouncer},
    app_dirs::AppDirs,
    celebration::Celebration,
    coach::OfflineCoach,
    config::{Config, ConfigStore, FileConfigStore},
    error::{CaptureError, ProfileError, SessionError},
    logging::init_logging,
    ollama::OllamaClient,
    planner::OfflinePlanner,
    pose::Side,
    pose_source::{FrameSkipper, PoseSource, ReplayPoseSource},
    profile::{parse_optional, UserProfile},
    runtime::{CrosstermEventSource, EventSource, FixedTicker, RestClock, Runner, Ticker, WorkoutEvent},
    session::{Collaborators, ExerciseResult, Page, WorkoutSession},
    stats::{ExerciseSummary, StatsDb},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

const TICK_RATE_MS: u64 = 100;
const REST_TICK: Duration = Duration::from_secs(1);
const DASHBOARD_RECENT: usize = 50;

/// terminal workout coach that counts your reps from a pose stream
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal workout coach. Feed it body landmarks as JSON Lines (one frame per line, from a recording or a pose model writing to a pipe) and it plans a workout, counts reps and hold time, runs your rest timers and keeps a history of every exercise."
)]
pub struct Cli {
    /// JSON Lines pose stream to read frames from (file or named pipe)
    #[clap(short = 'p', long)]
    poses: Option<PathBuf>,

    /// fitness goal; skips straight to the plan page
    #[clap(short = 'g', long)]
    goal: Option<String>,

    /// never contact the planner model; use the starter plan and built-in coaching
    #[clap(long)]
    offline: bool,

    /// landmark visibility needed before a frame counts (0.0 - 1.0)
    #[clap(short = 't', long)]
    threshold: Option<f64>,

    /// seconds of rest between exercises
    #[clap(short = 'r', long)]
    rest_secs: Option<u32>,

    /// only process every Nth pose frame
    #[clap(long)]
    frame_skip: Option<u32>,

    /// body side watched by single-side exercises
    #[clap(long, value_enum)]
    side: Option<Side>,

    /// read the pose stream as fast as possible instead of at recorded speed
    #[clap(long)]
    no_pace: bool,

    /// text-to-speech command, the announcement is passed as the last argument (e.g. "espeak -s 160")
    #[clap(long)]
    speech_command: Option<String>,

    /// base URL of the Ollama server
    #[clap(long)]
    ollama_url: Option<String>,

    /// Ollama model used for plans and coaching
    #[clap(short = 'm', long)]
    model: Option<String>,

    /// write the workout history as CSV to this file and exit
    #[clap(long)]
    export_history: Option<PathBuf>,

    /// store the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Command line values win over the stored config
    fn apply(&self, cfg: &mut Config) {
        if let Some(threshold) = self.threshold {
            cfg.visibility_threshold = threshold.clamp(0.0, 1.0);
        }
        if let Some(rest) = self.rest_secs {
            cfg.rest_secs = rest;
        }
        if let Some(skip) = self.frame_skip {
            cfg.frame_skip = skip.max(1);
        }
        if let Some(side) = self.side {
            cfg.tracked_side = side;
        }
        if let Some(cmd) = &self.speech_command {
            cfg.speech_command = Some(cmd.clone());
        }
        if let Some(url) = &self.ollama_url {
            cfg.ollama_url = url.clone();
        }
        if let Some(model) = &self.model {
            cfg.ollama_model = model.clone();
        }
        if self.offline {
            cfg.offline = true;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Goal,
    Age,
    Weight,
    Height,
}

impl FormField {
    pub const ALL: [FormField; 4] = [
        FormField::Goal,
        FormField::Age,
        FormField::Weight,
        FormField::Height,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Goal => "Fitness goal",
            FormField::Age => "Age (optional)",
            FormField::Weight => "Weight kg (optional)",
            FormField::Height => "Height cm (optional)",
        }
    }

    fn next(self) -> Self {
        match self {
            FormField::Goal => FormField::Age,
            FormField::Age => FormField::Weight,
            FormField::Weight => FormField::Height,
            FormField::Height => FormField::Goal,
        }
    }

    fn prev(self) -> Self {
        match self {
            FormField::Goal => FormField::Height,
            FormField::Age => FormField::Goal,
            FormField::Weight => FormField::Age,
            FormField::Height => FormField::Weight,
        }
    }
}

/// Welcome page input
#[derive(Debug, Default)]
pub struct ProfileForm {
    pub goal: String,
    pub age: String,
    pub weight: String,
    pub height: String,
    pub focus: FormField,
    pub error: Option<String>,
}

impl ProfileForm {
    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Goal => &self.goal,
            FormField::Age => &self.age,
            FormField::Weight => &self.weight,
            FormField::Height => &self.height,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            FormField::Goal => &mut self.goal,
            FormField::Age => &mut self.age,
            FormField::Weight => &mut self.weight,
            FormField::Height => &mut self.height,
        }
    }

    pub fn push(&mut self, c: char) {
        let numeric = self.focus != FormField::Goal;
        if numeric && !(c.is_ascii_digit() || c == '.') {
            return;
        }
        self.focused_mut().push(c);
        self.error = None;
    }

    pub fn pop(&mut self) {
        self.focused_mut().pop();
    }

    pub fn next_field(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn prev_field(&mut self) {
        self.focus = self.focus.prev();
    }

    pub fn to_profile(&self) -> Result<UserProfile, ProfileError> {
        let profile = UserProfile {
            goal: self.goal.trim().to_string(),
            age: parse_optional("age", &self.age)?,
            weight_kg: parse_optional("weight", &self.weight)?,
            height_cm: parse_optional("height", &self.height)?,
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Default)]
pub struct DashboardState {
    pub summary: Vec<ExerciseSummary>,
    pub recent: Vec<ExerciseResult>,
    pub scroll_offset: usize,
}

/// Opens a fresh pose source; called on first use and after a capture failure
pub type SourceFactory = Box<dyn Fn() -> Result<Box<dyn PoseSource>, CaptureError>>;

pub struct App {
    pub session: WorkoutSession,
    pub form: ProfileForm,
    pub history: Option<StatsDb>,
    pub dashboard: DashboardState,
    pub celebration: Celebration,
    frame_skipper: FrameSkipper,
    rest_clock: RestClock,
    open_source: SourceFactory,
    pose_source: Option<Box<dyn PoseSource>>,
    size: (u16, u16),
}

impl App {
    pub fn new(
        session: WorkoutSession,
        history: Option<StatsDb>,
        open_source: SourceFactory,
        frame_skip: u32,
    ) -> Self {
        Self {
            session,
            form: ProfileForm::default(),
            history,
            dashboard: DashboardState::default(),
            celebration: Celebration::new(),
            frame_skipper: FrameSkipper::new(frame_skip),
            rest_clock: RestClock::new(REST_TICK),
            open_source,
            pose_source: None,
            size: (80, 24),
        }
    }

    /// Run a session action, then react to whatever page it left us on
    fn transition<F>(&mut self, action: F)
    where
        F: FnOnce(&mut WorkoutSession) -> Result<(), SessionError>,
    {
        let prev = self.position();
        if let Err(e) = action(&mut self.session) {
            debug!("ignored: {e}");
        }
        self.sync(prev);
    }

    fn position(&self) -> (Page, usize) {
        (self.session.page(), self.session.current_index())
    }

    fn sync(&mut self, (prev, prev_index): (Page, usize)) {
        let results = self.session.drain_results();
        if !results.is_empty() {
            if let Some(db) = self.history.as_mut() {
                if let Err(e) = db.record_results_batch(&results) {
                    warn!("failed to save workout history: {e}");
                }
            }
        }

        let page = self.session.page();
        if page == Page::Workout && self.session.current_index() != prev_index {
            self.frame_skipper.reset();
        }
        if page == prev {
            return;
        }
        debug!(%prev, %page, "page change");
        match page {
            Page::Workout => self.frame_skipper.reset(),
            Page::Rest => self.rest_clock.reset(),
            Page::Finished => self.celebration.start(self.size.0, self.size.1),
            Page::Dashboard => self.refresh_dashboard(),
            Page::Welcome => {
                self.form.reset();
                self.celebration.stop();
                self.pose_source = None;
            }
            Page::CaptureFailed => self.pose_source = None,
            Page::Plan => {}
        }
    }

    fn refresh_dashboard(&mut self) {
        self.dashboard.scroll_offset = 0;
        let Some(db) = self.history.as_ref() else {
            return;
        };
        self.dashboard.summary = db.exercise_summary().unwrap_or_else(|e| {
            warn!("failed to load history summary: {e}");
            Vec::new()
        });
        self.dashboard.recent = db.recent_results(DASHBOARD_RECENT).unwrap_or_else(|e| {
            warn!("failed to load recent history: {e}");
            Vec::new()
        });
    }

    pub fn submit_form(&mut self) {
        match self.form.to_profile() {
            Ok(profile) => {
                self.form.error = None;
                let prev = self.position();
                if let Err(e) = self.session.submit_profile(profile) {
                    self.form.error = Some(e.to_string());
                }
                self.sync(prev);
            }
            Err(e) => self.form.error = Some(e.to_string()),
        }
    }

    /// Pull one frame from the pose source and feed it to the session
    pub fn sample_frame(&mut self) {
        if self.pose_source.is_none() {
            match (self.open_source)() {
                Ok(source) => self.pose_source = Some(source),
                Err(e) => {
                    self.transition(move |s| s.capture_failed(e));
                    return;
                }
            }
        }
        let Some(source) = self.pose_source.as_mut() else {
            return;
        };

        match source.next_frame() {
            Ok(frame) => {
                if self.frame_skipper.admit() {
                    let prev = self.position();
                    self.session
                        .process_frame(frame.pose.as_ref(), frame.timestamp);
                    self.sync(prev);
                }
            }
            Err(e) => self.transition(move |s| s.capture_failed(e)),
        }
    }

    pub fn on_tick(&mut self, now: Instant) {
        if self.session.page() == Page::Rest {
            for _ in 0..self.rest_clock.due(now) {
                if self.session.page() != Page::Rest {
                    break;
                }
                self.transition(WorkoutSession::tick);
            }
        }
        self.celebration.update(TICK_RATE_MS as f64 / 1000.0);
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.size = (width, height);
    }

    /// Handle a key press. Returns true when the app should quit.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.kind == KeyEventKind::Release {
            return false;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        if key.code == KeyCode::F(2) {
            self.open_dashboard();
            return false;
        }

        match self.session.page() {
            Page::Welcome => match key.code {
                KeyCode::Esc => return true,
                KeyCode::Enter => self.submit_form(),
                KeyCode::Tab | KeyCode::Down => self.form.next_field(),
                KeyCode::BackTab | KeyCode::Up => self.form.prev_field(),
                KeyCode::Backspace => self.form.pop(),
                KeyCode::Char(c) => self.form.push(c),
                _ => {}
            },
            Page::Plan => match key.code {
                KeyCode::Esc => return true,
                KeyCode::Enter => self.transition(WorkoutSession::start_workout),
                KeyCode::Char('r') | KeyCode::Backspace => self.restart(),
                KeyCode::Char('h') => self.open_dashboard(),
                _ => {}
            },
            Page::Workout => match key.code {
                KeyCode::Esc => return true,
                KeyCode::Enter => self.transition(WorkoutSession::acknowledge_ready),
                KeyCode::Char('s') => self.transition(WorkoutSession::skip),
                KeyCode::Char('r') => self.restart(),
                _ => {}
            },
            Page::Rest => match key.code {
                KeyCode::Esc => return true,
                KeyCode::Char('r') => self.restart(),
                _ => {}
            },
            Page::Finished => match key.code {
                KeyCode::Esc => return true,
                KeyCode::Enter | KeyCode::Char('r') => self.restart(),
                KeyCode::Char('h') => self.open_dashboard(),
                _ => {}
            },
            Page::Dashboard => match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('b') => {
                    self.transition(WorkoutSession::close_dashboard)
                }
                KeyCode::Up => {
                    self.dashboard.scroll_offset = self.dashboard.scroll_offset.saturating_sub(1)
                }
                KeyCode::Down => {
                    if self.dashboard.scroll_offset + 1 < self.dashboard.recent.len() {
                        self.dashboard.scroll_offset += 1;
                    }
                }
                KeyCode::Home => self.dashboard.scroll_offset = 0,
                _ => {}
            },
            Page::CaptureFailed => match key.code {
                KeyCode::Esc => return true,
                KeyCode::Enter | KeyCode::Char('t') => {
                    self.transition(WorkoutSession::retry_capture)
                }
                KeyCode::Char('r') => self.restart(),
                _ => {}
            },
        }
        false
    }

    fn restart(&mut self) {
        self.transition(|s| {
            s.restart();
            Ok(())
        });
    }

    fn open_dashboard(&mut self) {
        self.transition(|s| {
            s.open_dashboard();
            Ok(())
        });
    }
}

fn collaborators(cfg: &Config) -> Collaborators {
    let announcer: Box<dyn Announcer> = match cfg.speech_command.as_deref() {
        Some(cmd) => match CommandAnnouncer::parse(cmd) {
            Ok(speech) => Box::new(speech),
            Err(e) => {
                warn!("speech disabled: {e}");
                Box::new(LogAnnouncer)
            }
        },
        None => Box::new(LogAnnouncer),
    };

    if cfg.offline {
        info!("offline mode, using starter plan and built-in coaching");
        return Collaborators {
            planner: Box::new(OfflinePlanner),
            coach: Box::new(OfflineCoach::new()),
            announcer,
        };
    }

    match OllamaClient::new(&cfg.ollama_url, &cfg.ollama_model) {
        Ok(client) => {
            info!(url = %cfg.ollama_url, model = %client.model(), "using ollama planner");
            Collaborators {
                planner: Box::new(client.clone()),
                coach: Box::new(client),
                announcer,
            }
        }
        Err(e) => {
            warn!("ollama client unavailable, going offline: {e}");
            Collaborators {
                planner: Box::new(OfflinePlanner),
                coach: Box::new(OfflineCoach::new()),
                announcer,
            }
        }
    }
}

fn replay_source(path: Option<PathBuf>, pace: bool) -> SourceFactory {
    Box::new(move || -> Result<Box<dyn PoseSource>, CaptureError> {
        match &path {
            Some(path) => Ok(Box::new(ReplayPoseSource::open(path, pace)?)),
            None => Err(CaptureError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "no pose stream given (start with --poses <FILE>)",
            ))),
        }
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply(&mut config);
    if cli.save_config {
        store.save(&config)?;
    }

    if let Some(log_dir) = AppDirs::log_dir() {
        if let Err(e) = init_logging(&log_dir) {
            eprintln!("logging disabled: {e}");
        }
    }

    if let Some(path) = &cli.export_history {
        let db = StatsDb::new()?;
        let rows = db.export_csv(File::create(path)?)?;
        println!("exported {rows} results to {}", path.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let history = StatsDb::new()
        .inspect_err(|e| warn!("workout history disabled: {e}"))
        .ok();
    let session = WorkoutSession::new(config.session_config(), collaborators(&config));
    let mut app = App::new(
        session,
        history,
        replay_source(cli.poses.clone(), !cli.no_pace),
        config.frame_skip,
    );

    if let Some(goal) = &cli.goal {
        app.form.goal = goal.clone();
        app.submit_form();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    loop {
        let size = terminal.size()?;
        app.set_size(size.width, size.height);
        terminal.draw(|f| ui::draw(app, f))?;

        // while sampling the pose source paces the loop
        let events = if app.session.is_sampling() {
            app.sample_frame();
            runner.drain()
        } else {
            vec![runner.step()]
        };

        for event in events {
            match event {
                WorkoutEvent::Tick => app.on_tick(Instant::now()),
                WorkoutEvent::Resize => {}
                WorkoutEvent::Key(key) => {
                    if app.on_key(key) {
                        return Ok(());
                    }
                }
            }
        }
    }
}
