use log::{debug, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::clock::{Clock, Millis};
use crate::score::Report;
use crate::session::{RoundState, Session, SessionConfig};
use crate::timer::{TimerHandle, TimerKind, TimerQueue, TimerService, TimerToken};

/// Notifications for the presentation layer. Rounds are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// A random wait started (first attempt or retry after a penalty)
    Waiting { round: usize },
    /// The stimulus is live; the next input is timed
    Armed { round: usize },
    Recorded { round: usize, latency_ms: Millis },
    /// Input arrived before the stimulus; the round will be retried
    TooEarly { round: usize },
    /// Emitted once per session, after the last round's pause
    Finished { latencies: Vec<Millis> },
}

/// Drives a session through its timed rounds.
///
/// All mutation happens through [`Sequencer::start`], [`Sequencer::on_input`]
/// and [`Sequencer::on_timer`]. At most one timer is outstanding; it is
/// cancelled before anything else is scheduled, and every timer carries a
/// generation that must match the sequencer's current one when it fires, so
/// a timer the host failed to cancel is inert.
#[derive(Debug)]
pub struct Sequencer<C: Clock, T: TimerService = TimerQueue> {
    config: SessionConfig,
    clock: C,
    timers: T,
    rng: StdRng,
    session: Session,
    generation: u64,
    pending: Option<(TimerHandle, TimerToken)>,
    armed_at: Option<Millis>,
    in_penalty: bool,
}

impl<C: Clock, T: TimerService> Sequencer<C, T> {
    pub fn new(config: SessionConfig, clock: C, timers: T) -> Self {
        Self::with_rng(config, clock, timers, StdRng::from_entropy())
    }

    /// Deterministic wait delays, for replays and tests
    pub fn with_seed(config: SessionConfig, clock: C, timers: T, seed: u64) -> Self {
        Self::with_rng(config, clock, timers, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SessionConfig, clock: C, timers: T, rng: StdRng) -> Self {
        Self {
            config,
            clock,
            timers,
            rng,
            session: Session::default(),
            generation: 0,
            pending: None,
            armed_at: None,
            in_penalty: false,
        }
    }

    /// Begin a fresh session at round 1, discarding any session in progress.
    pub fn start(&mut self) -> Signal {
        self.cancel_pending();
        self.session = Session {
            round_index: 1,
            latencies: Vec::new(),
            state: RoundState::Waiting,
        };
        self.armed_at = None;
        self.in_penalty = false;
        self.schedule_wait();

        debug!("session started ({} rounds)", self.config.rounds());
        Signal::Waiting { round: 1 }
    }

    /// Drop the current session and return to idle.
    pub fn abort(&mut self) {
        self.cancel_pending();
        self.session = Session::default();
        self.armed_at = None;
        self.in_penalty = false;
        debug!("session aborted");
    }

    /// Handle a tap. Input in a state that does not accept it is ignored.
    pub fn on_input(&mut self) -> Option<Signal> {
        let round = self.session.round_index;

        match self.session.state {
            RoundState::Waiting if !self.in_penalty => {
                self.cancel_pending();
                self.in_penalty = true;
                self.schedule_in(self.config.penalty_ms(), TimerKind::Retry);
                debug!("round {round}: too early");
                Some(Signal::TooEarly { round })
            }
            RoundState::Armed => {
                let now = self.clock.now();
                let latency_ms = now.saturating_sub(self.armed_at.take().unwrap_or(now));
                self.session.latencies.push(latency_ms);
                self.session.state = RoundState::Recorded;
                self.schedule_in(self.config.pause_ms(), TimerKind::Advance);
                debug!("round {round}: {latency_ms}ms");
                Some(Signal::Recorded { round, latency_ms })
            }
            _ => None,
        }
    }

    /// Handle a fired timer. Tokens that are not the currently pending one
    /// are ignored.
    pub fn on_timer(&mut self, token: TimerToken) -> Option<Signal> {
        match self.pending {
            Some((_, pending)) if pending == token => self.pending = None,
            _ => {
                trace!(
                    "ignoring stale timer {:?} (generation {}, current {})",
                    token.kind,
                    token.generation,
                    self.generation
                );
                return None;
            }
        }

        let round = self.session.round_index;

        match (token.kind, self.session.state) {
            (TimerKind::Arm, RoundState::Waiting) if !self.in_penalty => {
                self.session.state = RoundState::Armed;
                self.armed_at = Some(self.clock.now());
                debug!("round {round}: armed");
                Some(Signal::Armed { round })
            }
            (TimerKind::Retry, RoundState::Waiting) => {
                self.in_penalty = false;
                self.schedule_wait();
                Some(Signal::Waiting { round })
            }
            (TimerKind::Advance, RoundState::Recorded) => {
                if round < self.config.rounds() {
                    self.session.round_index += 1;
                    self.session.state = RoundState::Waiting;
                    self.schedule_wait();
                    Some(Signal::Waiting {
                        round: self.session.round_index,
                    })
                } else {
                    self.session.state = RoundState::Finished;
                    debug!("session finished: {:?}", self.session.latencies);
                    Some(Signal::Finished {
                        latencies: self.session.latencies.clone(),
                    })
                }
            }
            _ => None,
        }
    }

    /// Fire every timer that is due at the current clock reading.
    pub fn poll(&mut self) -> Vec<Signal> {
        let mut signals = Vec::new();
        while let Some(token) = self.timers.pop_due(self.clock.now()) {
            if let Some(signal) = self.on_timer(token) {
                signals.push(signal);
            }
        }
        signals
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> RoundState {
        self.session.state
    }

    pub fn round_index(&self) -> usize {
        self.session.round_index
    }

    pub fn latencies(&self) -> &[Millis] {
        &self.session.latencies
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// True between a too-early tap and the retry
    pub fn in_penalty(&self) -> bool {
        self.in_penalty
    }

    /// Token of the outstanding timer, if any
    pub fn pending_token(&self) -> Option<TimerToken> {
        self.pending.map(|(_, token)| token)
    }

    /// Scores for the finished session
    pub fn report(&self) -> Option<Report> {
        if self.session.is_finished() {
            Report::from_latencies(&self.session.latencies)
        } else {
            None
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }

    fn schedule_wait(&mut self) {
        let delay = self
            .rng
            .gen_range(self.config.min_wait_ms()..=self.config.max_wait_ms());
        trace!("round {}: waiting {delay}ms", self.session.round_index);
        self.schedule_in(delay, TimerKind::Arm);
    }

    fn schedule_in(&mut self, delay: Millis, kind: TimerKind) {
        self.cancel_pending();
        self.generation += 1;
        let token = TimerToken {
            generation: self.generation,
            kind,
        };
        let deadline = self.clock.now().saturating_add(delay);
        let handle = self.timers.schedule(deadline, token);
        self.pending = Some((handle, token));
    }

    fn cancel_pending(&mut self) {
        if let Some((handle, _)) = self.pending.take() {
            self.timers.cancel(handle);
        }
    }
}
