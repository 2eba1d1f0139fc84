#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-timestep scheduler that converts wall-clock time into whole ticks.
//!
//! Each frame accrues elapsed time as fractional tick debt and executes whole
//! ticks until the debt drops below one. When executing the owed ticks takes
//! longer than the frame budget the remaining debt is discarded, trading
//! simulated-time accuracy for bounded frame latency.

use std::{
    cell::Cell,
    time::{Duration, Instant},
};

use thiserror::Error;
use tracing::warn;

/// Wall-clock time a single frame may spend catching up.
pub const FRAME_BUDGET: Duration = Duration::from_millis(40);

/// Tick interval at logarithmic speed zero.
pub const BASE_TICK_INTERVAL: Duration = Duration::from_millis(400);

/// Largest accepted logarithmic speed.
pub const MAX_LOG_SPEED: f64 = 6.0;

/// Monotonic time source measured from an arbitrary origin.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Clock backed by [`Instant`].
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock whose origin is the current instant.
    #[must_use]
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
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to; used for headless and replayed runs.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    /// Creates a clock at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get().saturating_add(by));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Raised when a logarithmic speed falls outside `0.0..=MAX_LOG_SPEED`.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
#[error("logarithmic speed {0} is outside 0..=6")]
pub struct SpeedError(pub f64);

/// Simulated tick rate derived from a linear control value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationSpeed {
    log: f64,
}

impl SimulationSpeed {
    /// Maps `log` onto `2.5 * 10^log` ticks per second.
    pub fn from_log(log: f64) -> Result<Self, SpeedError> {
        if (0.0..=MAX_LOG_SPEED).contains(&log) {
            Ok(Self { log })
        } else {
            Err(SpeedError(log))
        }
    }

    /// Linear control value.
    #[must_use]
    pub const fn log(&self) -> f64 {
        self.log
    }

    /// Simulated ticks per wall-clock second.
    #[must_use]
    pub fn ticks_per_second(&self) -> f64 {
        10f64.powf(self.log) / BASE_TICK_INTERVAL.as_secs_f64()
    }

    /// Wall-clock time between ticks.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.ticks_per_second())
    }
}

impl Default for SimulationSpeed {
    fn default() -> Self {
        Self { log: 0.0 }
    }
}

/// Outcome of a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Whole ticks executed during the frame.
    pub ticks_executed: u64,
    /// Owed ticks thrown away because the frame budget ran out.
    pub debt_discarded: f64,
    /// Whether the frame budget was exhausted.
    pub budget_exceeded: bool,
}

impl FrameReport {
    /// Reports whether the frame should be rendered.
    #[must_use]
    pub fn should_render(&self) -> bool {
        self.ticks_executed > 0
    }
}

/// Fixed-timestep driver with catch-up and overload protection.
#[derive(Clone, Debug)]
pub struct Scheduler {
    speed: SimulationSpeed,
    budget: Duration,
    debt: f64,
    last_frame: Duration,
    running: bool,
}

impl Scheduler {
    /// Creates a running scheduler whose first frame measures time from `now`.
    #[must_use]
    pub fn new(speed: SimulationSpeed, now: Duration) -> Self {
        Self {
            speed,
            budget: FRAME_BUDGET,
            debt: 0.0,
            last_frame: now,
            running: true,
        }
    }

    /// Replaces the per-frame catch-up budget.
    #[must_use]
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Changes the simulated tick rate without touching accrued debt.
    pub fn set_speed(&mut self, speed: SimulationSpeed) {
        self.speed = speed;
    }

    /// Current simulated tick rate.
    #[must_use]
    pub fn speed(&self) -> SimulationSpeed {
        self.speed
    }

    /// Pauses or resumes tick execution.
    ///
    /// Both transitions clear the accrued debt, so resuming never replays the
    /// ticks that would have run while paused.
    pub fn set_running(&mut self, running: bool, now: Duration) {
        self.running = running;
        self.debt = 0.0;
        self.last_frame = now;
    }

    /// Whether ticks are currently executed.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Fractional ticks owed but not yet executed.
    #[must_use]
    pub fn debt(&self) -> f64 {
        self.debt
    }

    /// Accrues the time since the previous frame and executes owed ticks.
    pub fn frame<C, F>(&mut self, clock: &C, mut step: F) -> FrameReport
    where
        C: Clock + ?Sized,
        F: FnMut(),
    {
        let frame_start = clock.now();
        let elapsed = frame_start.saturating_sub(self.last_frame);
        self.last_frame = frame_start;

        let mut report = FrameReport::default();
        if !self.running {
            return report;
        }

        self.debt += elapsed.as_secs_f64() * self.speed.ticks_per_second();

        while self.debt >= 1.0 {
            step();
            self.debt -= 1.0;
            report.ticks_executed += 1;

            if clock.now().saturating_sub(frame_start) >= self.budget {
                report.budget_exceeded = true;
                report.debt_discarded = self.debt;
                self.debt = 0.0;
                warn!(
                    executed = report.ticks_executed,
                    discarded = report.debt_discarded,
                    "frame budget exhausted; owed ticks discarded"
                );
                break;
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tracing_test::traced_test;

    use super::{Clock, ManualClock, Scheduler, SimulationSpeed, SpeedError};

    #[test]
    fn log_speed_scales_tick_rate_exponentially() {
        let base = SimulationSpeed::from_log(0.0).expect("valid speed");
        assert!((base.ticks_per_second() - 2.5).abs() < 1e-9);
        assert!((base.tick_interval().as_secs_f64() - 0.4).abs() < 1e-9);

        let fast = SimulationSpeed::from_log(2.0).expect("valid speed");
        assert!((fast.ticks_per_second() - 250.0).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_speed_is_rejected() {
        assert_eq!(SimulationSpeed::from_log(-0.5), Err(SpeedError(-0.5)));
        assert!(SimulationSpeed::from_log(6.5).is_err());
        assert!(SimulationSpeed::from_log(f64::NAN).is_err());
    }

    #[test]
    #[traced_test]
    fn exhausted_budget_discards_remaining_debt() {
        let clock = ManualClock::new();
        let speed = SimulationSpeed::from_log(2.0).expect("valid speed");
        let mut scheduler = Scheduler::new(speed, clock.now());

        clock.advance(Duration::from_millis(100));
        let report = scheduler.frame(&clock, || clock.advance(Duration::from_millis(15)));

        assert_eq!(report.ticks_executed, 3);
        assert!(report.budget_exceeded);
        assert!((report.debt_discarded - 22.0).abs() < 1e-6);
        assert_eq!(scheduler.debt(), 0.0);
        assert!(logs_contain("owed ticks discarded"));
    }
}
