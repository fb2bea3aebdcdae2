//! Elapsed-time accumulator driven by an external tick source.
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session timer. Holds no timer handle of its own; callers feed it ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionClock {
    elapsed: Duration,
    running: bool,
}

impl SessionClock {
    /// A running clock at zero.
    #[must_use]
    pub const fn started() -> Self {
        Self {
            elapsed: Duration::ZERO,
            running: true,
        }
    }

    /// Freeze the counter. Returns `true` only for the call that actually
    /// stopped a running clock.
    pub const fn stop(&mut self) -> bool {
        let was_running = self.running;
        self.running = false;
        was_running
    }

    /// Accumulate `delta` while running; ignored once stopped.
    pub fn tick(&mut self, delta: Duration) {
        if self.running {
            self.elapsed = self.elapsed.saturating_add(delta);
        }
    }

    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }
}
