use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::session::SessionState;

/// Period of the session countdown
pub const TICK: Duration = Duration::from_millis(100);
const TICK_SECS: f64 = 0.1;

/// Monotonic time source. Readings are relative to an arbitrary epoch fixed
/// when the clock was created.
pub trait Clock {
    fn now(&self) -> Duration;

    fn now_secs(&self) -> f64 {
        self.now().as_secs_f64()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Hand-driven clock for tests and replays. Clones share the same reading,
/// so a test can keep one and give the other to the engine.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn set(&self, at: Duration) {
        self.millis.store(at.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSignal {
    Running,
    /// Time ran out on this tick. Reported once; the clock is stopped after.
    Expired,
    Stopped,
}

/// Whole-session countdown. Scheduling of the tick itself belongs to the
/// engine's timer queue; this only knows what a tick does.
#[derive(Debug, Clone, Default)]
pub struct SessionClock {
    running: bool,
    ticks: u64,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    /// Called at each round start, mirrors cancelling and re-arming the tick.
    pub fn restart(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn tick(&mut self, state: &mut SessionState) -> ClockSignal {
        if !self.running {
            return ClockSignal::Stopped;
        }
        self.ticks += 1;

        // keep tenths exact so 30.0 really reaches zero on the 300th tick
        state.remaining_time = snap(state.remaining_time - TICK_SECS);
        state.total_time = snap(state.total_time + TICK_SECS);

        if state.remaining_time <= 0.0 {
            self.running = false;
            return ClockSignal::Expired;
        }
        ClockSignal::Running
    }
}

fn snap(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance_ms(250);
        assert_eq!(other.now(), Duration::from_millis(250));
        other.set(Duration::from_secs(2));
        assert_eq!(clock.now_secs(), 2.0);
    }

    #[test]
    fn tick_moves_both_counters() {
        let mut clock = SessionClock::new();
        clock.start();
        let mut state = SessionState::new(30.0);

        assert_eq!(clock.tick(&mut state), ClockSignal::Running);
        assert_eq!(state.remaining_time, 29.9);
        assert_eq!(state.total_time, 0.1);
    }

    #[test]
    fn thirty_seconds_expire_on_tick_three_hundred() {
        let mut clock = SessionClock::new();
        clock.start();
        let mut state = SessionState::new(30.0);

        let mut expired_at = None;
        for n in 1..=400 {
            match clock.tick(&mut state) {
                ClockSignal::Expired => {
                    assert!(expired_at.is_none(), "expired twice");
                    expired_at = Some(n);
                }
                ClockSignal::Running | ClockSignal::Stopped => {}
            }
        }
        assert_eq!(expired_at, Some(300));
        assert_eq!(clock.ticks(), 300);
        assert_eq!(state.total_time, 30.0);
        assert!(!clock.is_running());
    }

    #[test]
    fn negative_remaining_ends_on_next_tick() {
        let mut clock = SessionClock::new();
        clock.start();
        let mut state = SessionState::new(30.0);
        state.remaining_time = -0.5;
        assert_eq!(clock.tick(&mut state), ClockSignal::Expired);
        assert_eq!(state.display_time(), 0.0);
    }

    #[test]
    fn stopped_clock_leaves_state_alone() {
        let mut clock = SessionClock::new();
        let mut state = SessionState::new(30.0);
        assert_eq!(clock.tick(&mut state), ClockSignal::Stopped);
        assert_eq!(state.remaining_time, 30.0);

        clock.restart();
        clock.stop();
        assert_eq!(clock.tick(&mut state), ClockSignal::Stopped);
    }
}
