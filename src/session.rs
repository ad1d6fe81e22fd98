use crate::clock::Millis;
use crate::error::{FlinchError, Result};

pub const DEFAULT_ROUNDS: usize = 5;
pub const DEFAULT_MIN_WAIT_MS: Millis = 1_000;
pub const DEFAULT_MAX_WAIT_MS: Millis = 5_000;
pub const DEFAULT_PENALTY_MS: Millis = 1_000;
pub const DEFAULT_PAUSE_MS: Millis = 1_000;

/// Upper bound on rounds per session
pub const MAX_ROUNDS: usize = 100;
/// Upper bound on any wait, penalty or pause
pub const MAX_DELAY_MS: Millis = 60_000;

/// Validated round schedule. Construction fails when no valid schedule exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    rounds: usize,
    min_wait_ms: Millis,
    max_wait_ms: Millis,
    penalty_ms: Millis,
    pause_ms: Millis,
}

impl SessionConfig {
    pub fn new(rounds: usize, min_wait_ms: Millis, max_wait_ms: Millis) -> Result<Self> {
        if rounds == 0 {
            return Err(FlinchError::config("rounds must be at least 1"));
        }
        if rounds > MAX_ROUNDS {
            return Err(FlinchError::config(format!(
                "rounds ({rounds}) must be at most {MAX_ROUNDS}"
            )));
        }
        check_delay("max wait", max_wait_ms)?;
        if min_wait_ms > max_wait_ms {
            return Err(FlinchError::config(format!(
                "min wait ({min_wait_ms}ms) is greater than max wait ({max_wait_ms}ms)"
            )));
        }

        Ok(Self {
            rounds,
            min_wait_ms,
            max_wait_ms,
            penalty_ms: DEFAULT_PENALTY_MS,
            pause_ms: DEFAULT_PAUSE_MS,
        })
    }

    /// Pause after a too-early tap before the round is retried
    pub fn with_penalty(mut self, penalty_ms: Millis) -> Result<Self> {
        self.penalty_ms = check_delay("penalty", penalty_ms)?;
        Ok(self)
    }

    /// Pause after a recorded round before the next one starts
    pub fn with_pause(mut self, pause_ms: Millis) -> Result<Self> {
        self.pause_ms = check_delay("pause", pause_ms)?;
        Ok(self)
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn min_wait_ms(&self) -> Millis {
        self.min_wait_ms
    }

    pub fn max_wait_ms(&self) -> Millis {
        self.max_wait_ms
    }

    pub fn penalty_ms(&self) -> Millis {
        self.penalty_ms
    }

    pub fn pause_ms(&self) -> Millis {
        self.pause_ms
    }
}

fn check_delay(name: &str, ms: Millis) -> Result<Millis> {
    if ms > MAX_DELAY_MS {
        return Err(FlinchError::config(format!(
            "{name} ({ms}ms) must be at most {MAX_DELAY_MS}ms"
        )));
    }
    Ok(ms)
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            min_wait_ms: DEFAULT_MIN_WAIT_MS,
            max_wait_ms: DEFAULT_MAX_WAIT_MS,
            penalty_ms: DEFAULT_PENALTY_MS,
            pause_ms: DEFAULT_PAUSE_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    Idle,
    /// Random wait running, or the too-early penalty pause
    Waiting,
    /// Stimulus shown, response is being timed
    Armed,
    /// Latency captured, short pause before the next round
    Recorded,
    Finished,
}

/// Progress of one run of rounds. Owned by the sequencer and reset on start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// 1-based index of the current round, 0 while idle
    pub round_index: usize,
    pub latencies: Vec<Millis>,
    pub state: RoundState,
}

impl Session {
    pub fn is_finished(&self) -> bool {
        self.state == RoundState::Finished
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            round_index: 0,
            latencies: Vec::new(),
            state: RoundState::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_classic_game() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.rounds(), 5);
        assert_eq!(cfg.min_wait_ms(), 1_000);
        assert_eq!(cfg.max_wait_ms(), 5_000);
        assert_eq!(cfg.penalty_ms(), 1_000);
        assert_eq!(cfg.pause_ms(), 1_000);
    }

    #[test]
    fn zero_rounds_is_rejected() {
        let err = SessionConfig::new(0, 1_000, 5_000).unwrap_err();
        assert!(matches!(err, FlinchError::Config(_)));
    }

    #[test]
    fn inverted_wait_range_is_rejected() {
        let err = SessionConfig::new(5, 6_000, 5_000).unwrap_err();
        assert!(err.to_string().contains("greater than max wait"));
    }

    #[test]
    fn fixed_wait_is_allowed() {
        let cfg = SessionConfig::new(3, 2_000, 2_000).unwrap();
        assert_eq!(cfg.min_wait_ms(), cfg.max_wait_ms());
    }

    #[test]
    fn builders_override_pauses() {
        let cfg = SessionConfig::default()
            .with_penalty(250)
            .and_then(|cfg| cfg.with_pause(500))
            .unwrap();
        assert_eq!(cfg.penalty_ms(), 250);
        assert_eq!(cfg.pause_ms(), 500);
    }

    #[test]
    fn too_many_rounds_are_rejected() {
        assert!(SessionConfig::new(MAX_ROUNDS, 1_000, 1_000).is_ok());

        let err = SessionConfig::new(MAX_ROUNDS + 1, 1_000, 1_000).unwrap_err();
        assert!(err.to_string().contains("at most 100"));
        assert!(matches!(
            SessionConfig::new(usize::MAX, 1_000, 1_000),
            Err(FlinchError::Config(_))
        ));
    }

    #[test]
    fn delays_above_ceiling_are_rejected() {
        assert!(SessionConfig::new(5, MAX_DELAY_MS, MAX_DELAY_MS).is_ok());
        assert!(matches!(
            SessionConfig::new(5, Millis::MAX, Millis::MAX),
            Err(FlinchError::Config(_))
        ));
        assert!(SessionConfig::new(5, 1_000, MAX_DELAY_MS + 1).is_err());

        let cfg = SessionConfig::default();
        let err = cfg.with_penalty(Millis::MAX).unwrap_err();
        assert!(err.to_string().contains("penalty"));
        let err = cfg.with_pause(MAX_DELAY_MS + 1).unwrap_err();
        assert!(err.to_string().contains("pause"));
        assert_eq!(cfg.with_pause(MAX_DELAY_MS).unwrap().pause_ms(), MAX_DELAY_MS);
    }

    #[test]
    fn new_session_is_idle() {
        let session = Session::default();
        assert_eq!(session.state, RoundState::Idle);
        assert_eq!(session.round_index, 0);
        assert!(session.latencies.is_empty());
        assert!(!session.is_finished());
    }
}
