use ratatui::Frame;

use crate::{ui::history::render_history, App, AppState};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &mut App, f: &mut Frame);
}

/// Title, instructions and best score
pub struct IntroScreen;

impl Screen for IntroScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

/// Signal area for the rounds in progress
pub struct GameScreen;

impl Screen for GameScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

pub struct ProfileScreen;

impl Screen for ProfileScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

/// Past sessions; clamps the scroll offset while drawing
pub struct HistoryScreen;

impl Screen for HistoryScreen {
    fn render(&self, app: &mut App, f: &mut Frame) {
        render_history(app, f);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Intro => Box::new(IntroScreen),
        AppState::Playing => Box::new(GameScreen),
        AppState::Results => Box::new(ResultsScreen),
        AppState::Profile => Box::new(ProfileScreen),
        AppState::History => Box::new(HistoryScreen),
    }
}
