use std::time::Duration;

use loadsplit_core::{ConfigError, Event, FrameView, SimulationConfig};
use loadsplit_system_scheduler::{Clock, FrameReport, Scheduler, SimulationSpeed};
use tracing::debug;

use crate::Simulation;

/// Outcome of driving the simulation for one real-time frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RealtimeFrame {
    /// Scheduler accounting for the frame.
    pub report: FrameReport,
    /// Events produced by every tick of the burst, in order.
    pub events: Vec<Event>,
    /// Projection taken after the final tick, absent when no tick ran.
    pub view: Option<FrameView>,
}

/// Simulation paired with a wall-clock scheduler.
#[derive(Debug)]
pub struct Realtime {
    simulation: Simulation,
    scheduler: Scheduler,
}

impl Realtime {
    /// Starts driving `simulation` at `speed`, measuring time from `now`.
    #[must_use]
    pub fn new(simulation: Simulation, speed: SimulationSpeed, now: Duration) -> Self {
        Self {
            simulation,
            scheduler: Scheduler::new(speed, now),
        }
    }

    /// Replaces the default frame budget.
    #[must_use]
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.scheduler = self.scheduler.with_budget(budget);
        self
    }

    /// Executes every tick owed since the previous frame.
    pub fn frame<C>(&mut self, clock: &C) -> RealtimeFrame
    where
        C: Clock + ?Sized,
    {
        let Self {
            simulation,
            scheduler,
        } = self;

        let mut events = Vec::new();
        let report = scheduler.frame(clock, || simulation.tick_into(&mut events));
        let view = report.should_render().then(|| simulation.view());

        RealtimeFrame {
            report,
            events,
            view,
        }
    }

    /// Executes one tick regardless of the scheduler state.
    pub fn step_once(&mut self) -> Vec<Event> {
        self.simulation.tick()
    }

    /// Pauses or resumes the scheduler. Resuming never replays paused time.
    pub fn set_running(&mut self, running: bool, now: Duration) {
        debug!(running, "scheduler toggled");
        self.scheduler.set_running(running, now);
    }

    /// Whether the scheduler executes ticks.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Changes the simulated tick rate.
    pub fn set_speed(&mut self, speed: SimulationSpeed) {
        self.scheduler.set_speed(speed);
    }

    /// Resets the simulation with a new configuration.
    pub fn reconfigure(&mut self, config: SimulationConfig) -> Result<Vec<Event>, ConfigError> {
        self.simulation.reconfigure(config)
    }

    /// Simulation being driven.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }
}
