//! One-shot deadline timer.
//!
//! A single channel-signalling design, deliberately simpler than a
//! fixed-timestep scheduler: a watchdog has exactly one job, guard one
//! future against one deadline, then report which one finished first.
//! It is built to sit inside a `tokio::select!` the same way a tick
//! scheduler is, but it never repeats — arm once, fire or stop once.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// The watchdog's state at any point in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchdogState {
    Idle,
    Armed,
    Fired,
    Stopped,
}

/// Guards a single timing window with one reusable timer.
///
/// `guard` arms the watchdog, races the supplied future against the
/// deadline, and reports `Fired` if the deadline won. The watchdog
/// returns to `Idle` afterward and can be reused for the next turn.
#[derive(Debug)]
pub struct Watchdog {
    duration: Duration,
    state: WatchdogState,
}

/// Outcome of a single `guard` call.
#[derive(Debug)]
pub enum Guarded<T> {
    /// The guarded future completed before the deadline.
    Completed(T),
    /// The deadline elapsed first.
    Fired,
}

impl Watchdog {
    /// Creates a new watchdog with the given per-call deadline.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            state: WatchdogState::Idle,
        }
    }

    /// Races `fut` against the deadline. Returns `Guarded::Fired` if the
    /// deadline elapses first, `Guarded::Completed(_)` otherwise.
    pub async fn guard<F, T>(&mut self, fut: F) -> Guarded<T>
    where
        F: Future<Output = T>,
    {
        self.state = WatchdogState::Armed;
        debug!(duration_ms = self.duration.as_millis(), "watchdog armed");

        tokio::select! {
            value = fut => {
                self.state = WatchdogState::Stopped;
                debug!("watchdog stopped, guarded future completed first");
                Guarded::Completed(value)
            }
            _ = tokio::time::sleep(self.duration) => {
                self.state = WatchdogState::Fired;
                debug!("watchdog fired, deadline elapsed");
                Guarded::Fired
            }
        }
    }

    /// Returns `true` if the watchdog's most recent call fired.
    pub fn last_fired(&self) -> bool {
        self.state == WatchdogState::Fired
    }
}
