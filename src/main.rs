pub mod ui;

use flinch::{
    app_dirs::AppDirs,
    celebration::Celebration,
    clock::{Clock, Millis, SystemClock},
    config::{Config, ConfigStore, FileConfigStore},
    content::{ContentPack, Language},
    history::{HistoryDb, SessionRecord},
    logging,
    runtime::{is_tap, CrosstermEventSource, FixedTicker, FlinchEvent, Runner},
    sequencer::{Sequencer, Signal},
    session::SessionConfig,
    timer::TimerQueue,
    Report,
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};
use webbrowser::Browser;

const HISTORY_LIMIT: usize = 200;

/// reaction time tui: wait for green, press space, get graded
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal reaction time test. Each round waits a random delay, then signals; press space as fast as you can. Five rounds are averaged, graded and kept in your history."
)]
pub struct Cli {
    /// number of rounds per session
    #[clap(short = 'r', long)]
    rounds: Option<usize>,

    /// shortest random wait before the signal, in milliseconds
    #[clap(long)]
    min_wait: Option<Millis>,

    /// longest random wait before the signal, in milliseconds
    #[clap(long)]
    max_wait: Option<Millis>,

    /// pause after pressing too early, in milliseconds
    #[clap(long)]
    penalty: Option<Millis>,

    /// pause between rounds, in milliseconds
    #[clap(long)]
    pause: Option<Millis>,

    /// how often the screen polls the game clock, in milliseconds
    #[clap(long)]
    tick: Option<Millis>,

    /// language of the interface and reaction profiles
    #[clap(short = 'l', long, value_enum)]
    language: Option<Language>,

    /// seed for the random waits, for reproducible sessions
    #[clap(long)]
    seed: Option<u64>,

    /// store the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,

    /// neither read nor write session history
    #[clap(long)]
    no_history: bool,
}

impl Cli {
    /// Overlay the command line on top of the stored config
    fn apply(&self, config: Config) -> Config {
        Config {
            rounds: self.rounds.unwrap_or(config.rounds),
            min_wait_ms: self.min_wait.unwrap_or(config.min_wait_ms),
            max_wait_ms: self.max_wait.unwrap_or(config.max_wait_ms),
            penalty_ms: self.penalty.unwrap_or(config.penalty_ms),
            pause_ms: self.pause.unwrap_or(config.pause_ms),
            language: self.language.unwrap_or(config.language),
            tick_ms: self.tick.unwrap_or(config.tick_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Intro,
    Playing,
    Results,
    Profile,
    History,
}

#[derive(Debug, Default)]
pub struct HistoryState {
    pub scroll_offset: usize,
    pub rows: Vec<SessionRecord>,
    /// Screen to go back to
    pub return_to: Option<AppState>,
}

#[derive(Debug)]
pub struct App {
    pub sequencer: Sequencer<Box<dyn Clock>>,
    pub state: AppState,
    pub content: ContentPack,
    pub history: Option<HistoryDb>,
    pub history_state: HistoryState,
    pub best_ms: Option<Millis>,
    pub new_best: bool,
    /// Most recent sequencer notification, drives the game area
    pub last_signal: Option<Signal>,
    pub celebration: Celebration,
}

impl App {
    pub fn new(
        sequencer: Sequencer<Box<dyn Clock>>,
        content: ContentPack,
        history: Option<HistoryDb>,
    ) -> Self {
        let best_ms = history.as_ref().and_then(|db| match db.best_mean() {
            Ok(best) => best,
            Err(e) => {
                warn!("could not read best score: {e}");
                None
            }
        });

        Self {
            sequencer,
            state: AppState::Intro,
            content,
            history,
            history_state: HistoryState::default(),
            best_ms,
            new_best: false,
            last_signal: None,
            celebration: Celebration::new(),
        }
    }

    pub fn start_game(&mut self) {
        self.celebration.stop();
        self.new_best = false;
        self.last_signal = Some(self.sequencer.start());
        self.state = AppState::Playing;
    }

    /// Abandon the session in progress and go back to the intro
    pub fn quit_game(&mut self) {
        self.sequencer.abort();
        self.last_signal = None;
        self.state = AppState::Intro;
    }

    pub fn tap(&mut self, width: u16, height: u16) {
        if self.state != AppState::Playing {
            return;
        }
        if let Some(signal) = self.sequencer.on_input() {
            self.handle_signal(signal, width, height);
        }
    }

    /// Fire due timers and advance animations. Returns true when the screen
    /// needs a redraw.
    pub fn on_tick(&mut self, width: u16, height: u16) -> bool {
        let signals = self.sequencer.poll();
        let changed = !signals.is_empty();
        for signal in signals {
            self.handle_signal(signal, width, height);
        }

        self.celebration.update();
        changed || self.celebration.is_active
    }

    fn handle_signal(&mut self, signal: Signal, width: u16, height: u16) {
        if let Signal::Finished { latencies } = &signal {
            self.finish(latencies, width, height);
        }
        self.last_signal = Some(signal);
    }

    fn finish(&mut self, latencies: &[Millis], width: u16, height: u16) {
        self.state = AppState::Results;
        let Some(report) = Report::from_latencies(latencies) else {
            return;
        };
        info!(
            "session finished: mean {}ms, sd {}ms, {}",
            report.mean_ms, report.std_dev_ms, report.grade
        );

        let recorded = self
            .history
            .as_ref()
            .and_then(|db| match db.record_session(&report, latencies) {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    warn!("failed to record session: {e}");
                    None
                }
            });

        let (new_best, best) = match recorded {
            Some(outcome) => (outcome.is_new_best(), outcome.best_ms()),
            None => (
                self.best_ms.map_or(true, |best| report.mean_ms < best),
                self.best_ms.map_or(report.mean_ms, |best| best.min(report.mean_ms)),
            ),
        };

        self.new_best = new_best;
        self.best_ms = Some(best);
        if new_best {
            let banner = self.content.labels.new_best.clone();
            self.celebration.start(width, height, &banner);
        }
    }

    /// Time left until the sequencer's next timer is due
    pub fn until_next_timer(&self) -> Option<Duration> {
        let deadline = self.sequencer.timers().next_deadline()?;
        let now = self.sequencer.clock().now();
        Some(Duration::from_millis(deadline.saturating_sub(now)))
    }

    pub fn report(&self) -> Option<Report> {
        self.sequencer.report()
    }

    pub fn show_history(&mut self) {
        let rows = match &self.history {
            Some(db) => db.recent(HISTORY_LIMIT).unwrap_or_else(|e| {
                warn!("failed to load history: {e}");
                Vec::new()
            }),
            None => Vec::new(),
        };

        self.history_state = HistoryState {
            scroll_offset: 0,
            rows,
            return_to: Some(self.state),
        };
        self.state = AppState::History;
    }

    pub fn leave_history(&mut self) {
        self.state = self.history_state.return_to.take().unwrap_or(AppState::Intro);
    }

    pub fn share_text(&self) -> Option<String> {
        self.report().map(|report| self.content.share_text(&report))
    }
}

#[derive(Debug, PartialEq)]
enum KeyOutcome {
    Continue,
    Quit,
}

fn handle_key(app: &mut App, key: KeyEvent, width: u16, height: u16) -> KeyOutcome {
    if key.kind == KeyEventKind::Release {
        return KeyOutcome::Continue;
    }
    if key.code == KeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
    {
        return KeyOutcome::Quit;
    }

    match app.state {
        AppState::Intro => match key.code {
            _ if is_tap(&key) => app.start_game(),
            KeyCode::Char('h') => app.show_history(),
            _ => {}
        },
        AppState::Playing => match key.code {
            _ if is_tap(&key) => app.tap(width, height),
            KeyCode::Char('r') => app.start_game(),
            KeyCode::Char('b') | KeyCode::Backspace => app.quit_game(),
            _ => {}
        },
        AppState::Results | AppState::Profile => match key.code {
            KeyCode::Char('r') => app.start_game(),
            KeyCode::Char('p') => app.state = AppState::Profile,
            KeyCode::Char('b') | KeyCode::Backspace => app.state = AppState::Results,
            KeyCode::Char('h') => app.show_history(),
            KeyCode::Char('t') => {
                if let Some(text) = app.share_text() {
                    if Browser::is_available() {
                        webbrowser::open(&share_url(&text)).unwrap_or_else(|e| {
                            warn!("could not open browser: {e}");
                        });
                    }
                }
            }
            _ => {}
        },
        AppState::History => match key.code {
            KeyCode::Char('b') | KeyCode::Backspace => app.leave_history(),
            KeyCode::Char('r') => app.start_game(),
            KeyCode::Up => {
                app.history_state.scroll_offset = app.history_state.scroll_offset.saturating_sub(1);
            }
            KeyCode::Down => {
                // clamped when rendering
                app.history_state.scroll_offset += 1;
            }
            KeyCode::PageUp => {
                app.history_state.scroll_offset =
                    app.history_state.scroll_offset.saturating_sub(10);
            }
            KeyCode::PageDown => {
                app.history_state.scroll_offset += 10;
            }
            KeyCode::Home => {
                app.history_state.scroll_offset = 0;
            }
            _ => {}
        },
    }

    KeyOutcome::Continue
}

/// Tweet intent with the share text percent-encoded
fn share_url(text: &str) -> String {
    let encoded: String = text
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect();
    format!("https://twitter.com/intent/tweet?text={encoded}")
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(log_path) = AppDirs::log_path() {
        if let Err(e) = logging::init_file_logger(&log_path) {
            eprintln!("flinch: logging disabled: {e}");
        }
    }

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    let validated = config
        .session_config()
        .and_then(|session| Ok((session, FixedTicker::from_config(&config)?)));
    let (session_config, ticker) = match validated {
        Ok(validated) => validated,
        Err(e) => Cli::command()
            .error(ErrorKind::ValueValidation, e.to_string())
            .exit(),
    };
    if cli.save_config {
        store.save(&config)?;
        info!("saved config to {}", store.path().display());
    }

    let content = ContentPack::load(config.language)?;
    let history = if cli.no_history {
        None
    } else {
        HistoryDb::open_default()
            .map_err(|e| warn!("history unavailable: {e}"))
            .ok()
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(build_sequencer(session_config, cli.seed), content, history);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, ticker);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn build_sequencer(config: SessionConfig, seed: Option<u64>) -> Sequencer<Box<dyn Clock>> {
    let clock: Box<dyn Clock> = Box::new(SystemClock::new());
    match seed {
        Some(seed) => Sequencer::with_seed(config, clock, TimerQueue::new(), seed),
        None => Sequencer::new(config, clock, TimerQueue::new()),
    }
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    ticker: FixedTicker,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), ticker);

    terminal.draw(|f| ui::ui(app, f))?;

    loop {
        let size = terminal.size()?;

        match runner.step_within(app.until_next_timer()) {
            FlinchEvent::Tick => {
                if app.on_tick(size.width, size.height) {
                    terminal.draw(|f| ui::ui(app, f))?;
                }
            }
            FlinchEvent::Resize => {
                terminal.draw(|f| ui::ui(app, f))?;
            }
            FlinchEvent::Key(key) => {
                if handle_key(app, key, size.width, size.height) == KeyOutcome::Quit {
                    break;
                }
                terminal.draw(|f| ui::ui(app, f))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use flinch::clock::ManualClock;
    use flinch::session::RoundState;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    pub(crate) fn test_app(rounds: usize, wait: Millis) -> (App, ManualClock) {
        let clock = ManualClock::new(0);
        let config = SessionConfig::new(rounds, wait, wait).unwrap();
        let boxed: Box<dyn Clock> = Box::new(clock.clone());
        let sequencer = Sequencer::with_seed(config, boxed, TimerQueue::new(), 3);
        let content = ContentPack::load(Language::English).unwrap();
        let history = HistoryDb::open_in_memory().unwrap();
        (App::new(sequencer, content, Some(history)), clock)
    }

    /// Play a full session, reacting after each given delay
    pub(crate) fn play(app: &mut App, clock: &ManualClock, wait: Millis, delays: &[Millis]) {
        app.start_game();
        for &delay in delays {
            clock.advance(wait);
            app.on_tick(80, 24);
            clock.advance(delay);
            handle_key(app, key(KeyCode::Char(' ')), 80, 24);
            clock.advance(1_000);
            app.on_tick(80, 24);
        }
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["flinch"]);

        assert_eq!(cli.rounds, None);
        assert_eq!(cli.min_wait, None);
        assert_eq!(cli.language, None);
        assert!(!cli.save_config);
        assert!(!cli.no_history);
        assert_eq!(cli.apply(Config::default()), Config::default());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "flinch",
            "-r",
            "3",
            "--min-wait",
            "500",
            "--max-wait",
            "1500",
            "--penalty",
            "800",
            "--pause",
            "600",
            "--tick",
            "20",
            "-l",
            "korean",
        ]);
        let config = cli.apply(Config::default());

        assert_eq!(config.rounds, 3);
        assert_eq!(config.min_wait_ms, 500);
        assert_eq!(config.max_wait_ms, 1_500);
        assert_eq!(config.penalty_ms, 800);
        assert_eq!(config.pause_ms, 600);
        assert_eq!(config.language, Language::Korean);
        assert_eq!(config.tick_ms, 20);
    }

    #[test]
    fn test_cli_keeps_stored_values_not_given() {
        let stored = Config {
            rounds: 7,
            ..Config::default()
        };
        let cli = Cli::parse_from(["flinch", "--seed", "9", "--no-history"]);
        let config = cli.apply(stored);

        assert_eq!(config.rounds, 7);
        assert_eq!(cli.seed, Some(9));
        assert!(cli.no_history);
    }

    #[test]
    fn test_cli_invalid_wait_range_rejected() {
        let cli = Cli::parse_from(["flinch", "--min-wait", "6000"]);
        assert!(cli.apply(Config::default()).session_config().is_err());
    }

    #[test]
    fn test_cli_invalid_tick_rejected() {
        let cli = Cli::parse_from(["flinch", "--tick", "0"]);
        let config = cli.apply(Config::default());
        assert!(config.session_config().is_ok());
        assert!(FixedTicker::from_config(&config).is_err());
    }

    #[test]
    fn test_until_next_timer_tracks_the_wait() {
        let (mut app, clock) = test_app(2, 1_000);
        assert_eq!(app.until_next_timer(), None);

        app.start_game();
        assert_eq!(app.until_next_timer(), Some(Duration::from_millis(1_000)));

        clock.advance(400);
        assert_eq!(app.until_next_timer(), Some(Duration::from_millis(600)));

        clock.advance(1_000);
        assert_eq!(app.until_next_timer(), Some(Duration::ZERO));
        app.on_tick(80, 24);
        assert_eq!(app.until_next_timer(), None);

        app.quit_game();
        assert_eq!(app.until_next_timer(), None);
    }

    #[test]
    fn test_app_starts_on_intro() {
        let (app, _) = test_app(5, 1_000);
        assert_eq!(app.state, AppState::Intro);
        assert_eq!(app.best_ms, None);
        assert!(app.report().is_none());
    }

    #[test]
    fn test_space_starts_game() {
        let (mut app, _) = test_app(5, 1_000);
        handle_key(&mut app, key(KeyCode::Char(' ')), 80, 24);

        assert_eq!(app.state, AppState::Playing);
        assert_eq!(app.last_signal, Some(Signal::Waiting { round: 1 }));
        assert_eq!(app.sequencer.state(), RoundState::Waiting);
    }

    #[test]
    fn test_full_session_reaches_results() {
        let (mut app, clock) = test_app(5, 1_000);
        play(&mut app, &clock, 1_000, &[200, 210, 190, 205, 195]);

        assert_eq!(app.state, AppState::Results);
        let report = app.report().unwrap();
        assert_eq!(report.mean_ms, 200);
        assert_eq!(app.best_ms, Some(200));
        assert!(app.new_best);
        assert!(app.celebration.is_active);
        assert_eq!(app.history.as_ref().unwrap().session_count().unwrap(), 1);
    }

    #[test]
    fn test_slower_second_session_is_not_best() {
        let (mut app, clock) = test_app(1, 1_000);
        play(&mut app, &clock, 1_000, &[180]);
        handle_key(&mut app, key(KeyCode::Char('r')), 80, 24);
        assert_eq!(app.state, AppState::Playing);
        assert!(!app.celebration.is_active);

        // 'r' already started the next session
        clock.advance(1_000);
        app.on_tick(80, 24);
        clock.advance(300);
        handle_key(&mut app, key(KeyCode::Enter), 80, 24);
        clock.advance(1_000);
        app.on_tick(80, 24);

        assert_eq!(app.state, AppState::Results);
        assert!(!app.new_best);
        assert_eq!(app.best_ms, Some(180));
    }

    #[test]
    fn test_early_tap_shows_too_early() {
        let (mut app, clock) = test_app(5, 2_000);
        handle_key(&mut app, key(KeyCode::Char(' ')), 80, 24);
        clock.advance(300);
        handle_key(&mut app, key(KeyCode::Char(' ')), 80, 24);

        assert_eq!(app.last_signal, Some(Signal::TooEarly { round: 1 }));
        clock.advance(1_000);
        assert!(app.on_tick(80, 24));
        assert_eq!(app.last_signal, Some(Signal::Waiting { round: 1 }));
    }

    #[test]
    fn test_back_during_game_aborts_session() {
        let (mut app, clock) = test_app(5, 1_000);
        app.start_game();
        handle_key(&mut app, key(KeyCode::Char('b')), 80, 24);

        assert_eq!(app.state, AppState::Intro);
        assert_eq!(app.sequencer.state(), RoundState::Idle);
        clock.advance(5_000);
        assert!(!app.on_tick(80, 24));
        assert_eq!(app.history.as_ref().unwrap().session_count().unwrap(), 0);
    }

    #[test]
    fn test_results_navigation() {
        let (mut app, clock) = test_app(1, 1_000);
        play(&mut app, &clock, 1_000, &[250]);

        handle_key(&mut app, key(KeyCode::Char('p')), 80, 24);
        assert_eq!(app.state, AppState::Profile);
        handle_key(&mut app, key(KeyCode::Char('b')), 80, 24);
        assert_eq!(app.state, AppState::Results);

        handle_key(&mut app, key(KeyCode::Char('h')), 80, 24);
        assert_eq!(app.state, AppState::History);
        assert_eq!(app.history_state.rows.len(), 1);
        handle_key(&mut app, key(KeyCode::Backspace), 80, 24);
        assert_eq!(app.state, AppState::Results);
    }

    #[test]
    fn test_history_scrolling_saturates() {
        let (mut app, _) = test_app(5, 1_000);
        handle_key(&mut app, key(KeyCode::Char('h')), 80, 24);
        handle_key(&mut app, key(KeyCode::Up), 80, 24);
        assert_eq!(app.history_state.scroll_offset, 0);
        handle_key(&mut app, key(KeyCode::PageDown), 80, 24);
        assert_eq!(app.history_state.scroll_offset, 10);
        handle_key(&mut app, key(KeyCode::Home), 80, 24);
        assert_eq!(app.history_state.scroll_offset, 0);
        handle_key(&mut app, key(KeyCode::Char('b')), 80, 24);
        assert_eq!(app.state, AppState::Intro);
    }

    #[test]
    fn test_escape_and_ctrl_c_quit() {
        let (mut app, _) = test_app(5, 1_000);
        assert_eq!(
            handle_key(&mut app, key(KeyCode::Esc), 80, 24),
            KeyOutcome::Quit
        );
        assert_eq!(
            handle_key(
                &mut app,
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
                80,
                24
            ),
            KeyOutcome::Quit
        );
    }

    #[test]
    fn test_share_url_is_encoded() {
        assert_eq!(
            share_url("190ms (Very fast)!"),
            "https://twitter.com/intent/tweet?text=190ms%20%28Very%20fast%29%21"
        );
    }

    #[test]
    fn test_share_text_needs_a_report() {
        let (mut app, clock) = test_app(1, 1_000);
        assert!(app.share_text().is_none());
        play(&mut app, &clock, 1_000, &[190]);
        assert!(app.share_text().unwrap().contains("190ms"));
    }
}
