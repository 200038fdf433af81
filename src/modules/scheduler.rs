use std::ops::ControlFlow;
use std::thread;
use std::time::{Duration, Instant};

use crate::modules::config::EngineConfig;
use crate::modules::engine::{Engine, StepResult};
use crate::modules::rng::Chooser;

/// Polling cadence of the driver loop, roughly one display frame.
pub const FRAME: Duration = Duration::from_millis(16);

/// Animation-frame style throttle: polled every frame, fires once at least
/// `interval` has passed since the previous fire. The first poll fires.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    interval: Duration,
    last_fire: Option<Instant>,
    paused: bool,
}

impl FrameScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fire: None,
            paused: false,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.tick_interval())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Changing the interval restarts the cadence; the next poll fires.
    pub fn set_interval(&mut self, interval: Duration) {
        if interval != self.interval {
            self.interval = interval;
            self.last_fire = None;
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        if self.paused {
            return false;
        }
        let due = match self.last_fire {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if due {
            self.last_fire = Some(now);
        }
        due
    }

    /// Time left until the next fire, zero when due.
    pub fn until_next(&self, now: Instant) -> Duration {
        match self.last_fire {
            None => Duration::ZERO,
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
        }
    }
}

/// Blocking driver: steps `engine` each time `scheduler` fires until `limit`
/// ticks ran, `on_tick` breaks, or the scheduler is paused. Returns the
/// number of steps taken.
pub fn run_ticks<C, F>(
    engine: &mut Engine<C>,
    scheduler: &mut FrameScheduler,
    limit: Option<u64>,
    mut on_tick: F,
) -> u64
where
    C: Chooser,
    F: FnMut(&Engine<C>, &StepResult) -> ControlFlow<()>,
{
    let mut fired = 0u64;
    loop {
        if limit.is_some_and(|limit| fired >= limit) || scheduler.is_paused() {
            break;
        }

        let now = Instant::now();
        if scheduler.poll(now) {
            let result = engine.step();
            fired += 1;
            if on_tick(engine, &result).is_break() {
                break;
            }
            continue;
        }

        let wait = scheduler.until_next(now).min(FRAME);
        if wait > Duration::ZERO {
            thread::sleep(wait);
        }
    }
    fired
}
