use std::time::{Duration, Instant};

/// Quiet period before auto-rotate resumes.
pub const IDLE_DELAY: Duration = Duration::from_secs(5);

/// Debounced one-shot timer: every `touch` pushes the single deadline back,
/// and `poll` fires once when it passes.
#[derive(Debug, Clone)]
pub struct IdleTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl IdleTimer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadline: None }
    }

    /// Record activity at `now`, re-arming the deadline.
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Disarm without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left until the deadline, if armed.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }

    /// True exactly once, at the first poll at or after the deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for IdleTimer {
    fn default() -> Self {
        Self::new(IDLE_DELAY)
    }
}
