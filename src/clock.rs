use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Monotonic milliseconds since an arbitrary origin
pub type Millis = u64;

/// Source of monotonic timestamps. Only differences between two readings
/// are meaningful.
pub trait Clock: std::fmt::Debug {
    fn now(&self) -> Millis;
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> Millis {
        (**self).now()
    }
}

/// Wall clock backed by `Instant`, counted from construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Millis {
        self.origin.elapsed().as_millis() as Millis
    }
}

/// Manually advanced clock for headless drivers and tests.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// hand another to the sequencer.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Millis>>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance(&self, by: Millis) {
        self.now.set(self.now.get() + by);
    }

    /// Jump to `at`; the clock never moves backwards.
    pub fn set(&self, at: Millis) {
        if at > self.now.get() {
            self.now.set(at);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(100);
        let other = clock.clone();

        clock.advance(50);
        assert_eq!(other.now(), 150);

        other.set(400);
        assert_eq!(clock.now(), 400);
    }

    #[test]
    fn manual_clock_is_monotonic() {
        let clock = ManualClock::new(1_000);
        clock.set(10);
        assert_eq!(clock.now(), 1_000);
    }

    #[test]
    fn boxed_clock_delegates() {
        let manual = ManualClock::new(42);
        let boxed: Box<dyn Clock> = Box::new(manual.clone());
        manual.advance(8);
        assert_eq!(boxed.now(), 50);
    }

    #[test]
    fn system_clock_does_not_go_backwards() {
        let clock = SystemClock::new();
        let a = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = clock.now();
        assert!(b >= a + 5);
    }
}
