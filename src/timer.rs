use crate::clock::Millis;

/// What the sequencer asked to be woken up for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// End of the random wait; the stimulus should appear
    Arm,
    /// End of the too-early penalty pause
    Retry,
    /// End of the pause after a recorded round
    Advance,
}

/// Identity carried by every scheduled timer. The sequencer compares
/// `generation` against its own when the timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken {
    pub generation: u64,
    pub kind: TimerKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// One-shot timer host
pub trait TimerService {
    /// Arrange for `token` to be handed back by `pop_due` once `deadline` passes.
    fn schedule(&mut self, deadline: Millis, token: TimerToken) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
    /// Remove and return the earliest timer whose deadline is `<= now`.
    fn pop_due(&mut self, now: Millis) -> Option<TimerToken>;
}

#[derive(Debug, Clone)]
struct Entry {
    handle: TimerHandle,
    deadline: Millis,
    token: TimerToken,
}

/// Deadline-ordered timer list polled by the event loop
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    entries: Vec<Entry>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest pending deadline, if any
    pub fn next_deadline(&self) -> Option<Millis> {
        self.entries.iter().map(|e| e.deadline).min()
    }
}

impl TimerService for TimerQueue {
    fn schedule(&mut self, deadline: Millis, token: TimerToken) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.entries.push(Entry {
            handle,
            deadline,
            token,
        });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.entries.retain(|e| e.handle != handle);
    }

    fn pop_due(&mut self, now: Millis) -> Option<TimerToken> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= now)
            .min_by_key(|(_, e)| (e.deadline, e.handle.0))
            .map(|(i, _)| i)?;

        Some(self.entries.remove(idx).token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(generation: u64) -> TimerToken {
        TimerToken {
            generation,
            kind: TimerKind::Arm,
        }
    }

    #[test]
    fn pop_due_respects_deadline() {
        let mut q = TimerQueue::new();
        q.schedule(100, token(1));

        assert_eq!(q.pop_due(99), None);
        assert_eq!(q.pop_due(100), Some(token(1)));
        assert!(q.is_empty());
    }

    #[test]
    fn pop_due_returns_earliest_first() {
        let mut q = TimerQueue::new();
        q.schedule(300, token(3));
        q.schedule(100, token(1));
        q.schedule(200, token(2));

        assert_eq!(q.next_deadline(), Some(100));
        assert_eq!(q.pop_due(1_000), Some(token(1)));
        assert_eq!(q.pop_due(1_000), Some(token(2)));
        assert_eq!(q.pop_due(1_000), Some(token(3)));
        assert_eq!(q.pop_due(1_000), None);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut q = TimerQueue::new();
        let h = q.schedule(50, token(1));
        q.cancel(h);

        assert_eq!(q.len(), 0);
        assert_eq!(q.pop_due(10_000), None);
    }

    #[test]
    fn cancel_unknown_handle_is_noop() {
        let mut q = TimerQueue::new();
        let h = q.schedule(50, token(1));
        q.cancel(h);
        q.schedule(60, token(2));
        q.cancel(h);

        assert_eq!(q.len(), 1);
    }
}
