mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

use sesh::app_dirs::AppDirs;
use sesh::audio::{Cue, CuePlayer};
use sesh::celebration::Celebration;
use sesh::config::{Config, ConfigStore, FileConfigStore};
use sesh::engine::{CountdownEngine, EngineEvent};
use sesh::history;
use sesh::plan::{clamp_duration, clamp_sessions, SessionPlan, DURATION_STEP};
use sesh::runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner, TickClock};

const TICK_RATE_MS: u64 = 100;
const MAX_NAME_LEN: usize = 40;

/// minimal interval training timer for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A minimal interval training timer: configure a name, a number of work sessions and a per-session duration, then run a live countdown that cues every session boundary audibly."
)]
pub struct Cli {
    /// training name shown during the run
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// number of work sessions
    #[clap(short = 's', long)]
    sessions: Option<u32>,

    /// seconds per session
    #[clap(short = 'd', long)]
    duration: Option<u64>,

    /// cue waveform played at session boundaries
    #[clap(long, value_enum)]
    cue: Option<Cue>,

    /// sound file to play instead of the synthesized cue
    #[clap(long)]
    sound: Option<PathBuf>,

    /// disable audio entirely
    #[clap(long)]
    mute: bool,

    /// start counting down immediately, skipping the setup screen
    #[clap(long)]
    auto_start: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Setup,
    Running,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupField {
    Name,
    Sessions,
    Duration,
}

/// Editable state behind the setup screen. Edits here never touch a run in
/// progress; values are snapshotted into a plan at start.
#[derive(Debug, Clone)]
pub struct SetupForm {
    pub name: String,
    pub sessions: u32,
    pub duration_secs: u64,
    pub focus: SetupField,
}

impl SetupForm {
    fn from_config(cfg: &Config) -> Self {
        Self {
            name: cfg.name.clone(),
            sessions: clamp_sessions(cfg.sessions),
            duration_secs: clamp_duration(cfg.duration_secs),
            focus: SetupField::Name,
        }
    }

    pub fn next_field(&mut self) {
        self.focus = match self.focus {
            SetupField::Name => SetupField::Sessions,
            SetupField::Sessions => SetupField::Duration,
            SetupField::Duration => SetupField::Name,
        };
    }

    pub fn prev_field(&mut self) {
        self.focus = match self.focus {
            SetupField::Name => SetupField::Duration,
            SetupField::Sessions => SetupField::Name,
            SetupField::Duration => SetupField::Sessions,
        };
    }

    pub fn increment(&mut self) {
        match self.focus {
            SetupField::Name => {}
            SetupField::Sessions => self.sessions = clamp_sessions(self.sessions + 1),
            SetupField::Duration => {
                self.duration_secs = clamp_duration(self.duration_secs + DURATION_STEP)
            }
        }
    }

    pub fn decrement(&mut self) {
        match self.focus {
            SetupField::Name => {}
            SetupField::Sessions => self.sessions = clamp_sessions(self.sessions.saturating_sub(1)),
            SetupField::Duration => {
                self.duration_secs = clamp_duration(self.duration_secs.saturating_sub(DURATION_STEP))
            }
        }
    }

    pub fn push_char(&mut self, c: char) {
        if self.focus == SetupField::Name && self.name.chars().count() < MAX_NAME_LEN {
            self.name.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.focus == SetupField::Name {
            self.name.pop();
        }
    }
}

pub struct App {
    pub engine: CountdownEngine,
    pub cue_player: CuePlayer,
    pub celebration: Celebration,
    pub state: AppState,
    pub setup: SetupForm,
    /// Plan of the run shown on the summary screen; the engine is already
    /// back in idle by the time the screen renders.
    pub summary: Option<SessionPlan>,
    pub warning: Option<String>,
    pub auto_start: bool,
    pub run_log: Option<PathBuf>,
    cue: Cue,
    mute: bool,
    store: FileConfigStore,
    clock: TickClock,
}

impl App {
    pub fn new(cli: Cli, store: FileConfigStore) -> Self {
        let cfg = store.load();
        let cue = cli
            .cue
            .or_else(|| Cue::from_name(&cfg.cue))
            .unwrap_or(Cue::Beep);
        let mute = cli.mute || cfg.mute;
        let cue_player = if mute {
            CuePlayer::disabled()
        } else {
            CuePlayer::new(cue, cli.sound.as_deref())
        };

        let mut setup = SetupForm::from_config(&cfg);
        if let Some(name) = cli.name {
            setup.name = name;
        }
        if let Some(sessions) = cli.sessions {
            setup.sessions = clamp_sessions(sessions);
        }
        if let Some(duration) = cli.duration {
            setup.duration_secs = clamp_duration(duration);
        }

        Self {
            engine: CountdownEngine::new(),
            cue_player,
            celebration: Celebration::new(),
            state: AppState::Setup,
            setup,
            summary: None,
            warning: None,
            auto_start: cli.auto_start,
            run_log: AppDirs::log_path(),
            cue,
            mute,
            store,
            clock: TickClock::new(),
        }
    }

    /// Snapshot the setup form into a plan and start the countdown. On
    /// rejection the warning line is set and the app stays on the setup
    /// screen with the engine idle.
    pub fn try_start(&mut self) {
        let attempt = SessionPlan::new(
            self.setup.name.trim(),
            self.setup.sessions,
            self.setup.duration_secs,
        )
        .and_then(|plan| self.engine.start(plan));

        match attempt {
            Ok(_) => {
                self.warning = None;
                self.summary = None;
                self.state = AppState::Running;
                self.clock.reset();
                let _ = self.store.save(&self.current_config());
            }
            Err(err) => {
                self.warning = Some(err.to_string());
                self.state = AppState::Setup;
            }
        }
    }

    /// Abort the run and go back to the setup screen.
    pub fn stop_run(&mut self) {
        if let Some(EngineEvent::TrainingStopped) = self.engine.stop() {
            self.state = AppState::Setup;
        }
    }

    /// Leave the summary screen for another round.
    pub fn back_to_setup(&mut self) {
        let _ = self.engine.stop();
        self.summary = None;
        self.state = AppState::Setup;
    }

    /// Runtime tick handler: measure real elapsed time and advance.
    pub fn on_tick(&mut self, width: u16, height: u16) {
        let elapsed = self.clock.take_whole_secs();
        if elapsed > 0 {
            self.advance(elapsed, width, height);
        } else {
            self.celebration.update();
        }
    }

    /// Advance the countdown by a measured number of seconds and react to
    /// whatever boundaries it crossed.
    pub fn advance(&mut self, elapsed_secs: u64, width: u16, height: u16) {
        for event in self.engine.tick(elapsed_secs) {
            match event {
                EngineEvent::SessionEnded { .. } => self.cue_player.play(),
                EngineEvent::SessionStarted { .. } => {}
                EngineEvent::TrainingCompleted => {
                    if let Some(plan) = self.engine.plan().cloned() {
                        if let Some(path) = &self.run_log {
                            let _ = history::append_completed_to(&plan, path);
                        }
                        self.summary = Some(plan);
                    }
                    self.state = AppState::Summary;
                    self.celebration.start(width, height);
                }
                EngineEvent::TrainingStopped => {}
            }
        }
        self.celebration.update();
    }

    /// What the setup screen's sound line should say.
    pub fn sound_label(&self) -> String {
        if !self.cue_player.is_enabled() {
            "off".to_string()
        } else if self.cue_player.has_custom_sound() {
            "custom".to_string()
        } else {
            self.cue.to_string().to_lowercase()
        }
    }

    fn current_config(&self) -> Config {
        Config {
            name: self.setup.name.clone(),
            sessions: self.setup.sessions,
            duration_secs: self.setup.duration_secs,
            cue: self.cue.to_string().to_lowercase(),
            mute: self.mute,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(cli, FileConfigStore::new());
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    if app.auto_start {
        app.try_start();
    }

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            AppEvent::Tick => {
                let size = terminal.size().unwrap_or_default();
                app.on_tick(size.width, size.height);
            }
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
                {
                    break;
                }

                match app.state {
                    AppState::Setup => match key.code {
                        KeyCode::Esc => break,
                        KeyCode::Enter => app.try_start(),
                        KeyCode::Tab | KeyCode::Down => app.setup.next_field(),
                        KeyCode::BackTab | KeyCode::Up => app.setup.prev_field(),
                        KeyCode::Right => app.setup.increment(),
                        KeyCode::Left => app.setup.decrement(),
                        KeyCode::Char('+') if app.setup.focus != SetupField::Name => {
                            app.setup.increment()
                        }
                        KeyCode::Char('-') if app.setup.focus != SetupField::Name => {
                            app.setup.decrement()
                        }
                        KeyCode::Backspace => app.setup.backspace(),
                        KeyCode::Char(c) => app.setup.push_char(c),
                        _ => {}
                    },
                    AppState::Running => match key.code {
                        KeyCode::Esc | KeyCode::Char('s') => app.stop_run(),
                        _ => {}
                    },
                    AppState::Summary => match key.code {
                        KeyCode::Esc | KeyCode::Char('q') => break,
                        KeyCode::Enter | KeyCode::Char('r') => app.back_to_setup(),
                        _ => {}
                    },
                }
            }
        }
    }

    Ok(())
}
