//! Event loop plumbing: where terminal input comes from, how often the game
//! clock is polled, and how long the loop may block between the two.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind};

use crate::clock::Millis;
use crate::config::Config;
use crate::error::Result;

/// Default tick of the app loop; stimulus onset shows within one tick
pub const TICK_RATE_MS: Millis = 10;

#[derive(Clone, Debug)]
pub enum FlinchEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Keys that count as a tap during a round
pub fn is_tap(key: &KeyEvent) -> bool {
    key.kind != KeyEventKind::Release
        && matches!(key.code, KeyCode::Char(' ') | KeyCode::Enter)
}

/// Map a raw terminal event onto the app's events. Key releases are dropped
/// so a single press never counts twice on terminals that report them.
pub fn translate(event: CtEvent) -> Option<FlinchEvent> {
    match event {
        CtEvent::Key(key) if key.kind == KeyEventKind::Release => None,
        CtEvent::Key(key) => Some(FlinchEvent::Key(key)),
        CtEvent::Resize(_, _) => Some(FlinchEvent::Resize),
        _ => None,
    }
}

type RecvResult = std::result::Result<FlinchEvent, RecvTimeoutError>;

pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> RecvResult;
}

/// Reads crossterm events on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<FlinchEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let event = match event::read() {
                Ok(event) => event,
                Err(e) => {
                    log::error!("terminal event read failed: {e}");
                    break;
                }
            };
            if let Some(event) = translate(event) {
                if tx.send(event).is_err() {
                    break;
                }
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
    fn recv_timeout(&self, timeout: Duration) -> RecvResult {
        self.rx.recv_timeout(timeout)
    }
}

pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Tick at the configured rate
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.tick_interval()?))
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(Duration::from_millis(TICK_RATE_MS))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed event source for tests and headless drivers
pub struct TestEventSource {
    rx: Receiver<FlinchEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<FlinchEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> RecvResult {
        self.rx.recv_timeout(timeout)
    }
}

/// Hands the loop one event at a time, or a Tick when nothing arrived
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

    pub fn interval(&self) -> Duration {
        self.ticker.interval()
    }

    /// Blocks up to one tick interval
    pub fn step(&self) -> FlinchEvent {
        self.step_within(None)
    }

    /// Blocks up to one tick interval, or less when `limit` is sooner. The
    /// loop passes the time left until the next game timer here so a
    /// deadline is not overshot by a whole tick.
    pub fn step_within(&self, limit: Option<Duration>) -> FlinchEvent {
        let wait = limit.map_or(self.interval(), |limit| limit.min(self.interval()));

        match self.event_source.recv_timeout(wait) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => FlinchEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => {
                // nothing will ever arrive; keep ticking at the same pace
                std::thread::sleep(wait);
                FlinchEvent::Tick
            }
        }
    }
}
