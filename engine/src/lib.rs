#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Simulation context wiring the pure systems around the authoritative world.
//!
//! A [`Simulation`] owns the world together with the task factory, the
//! balancing policy and the metrics tracker. Every tick runs the splitter step
//! on even tick indices, drains every loader and folds the resulting events
//! into the running metrics. Rendering is a read-only [`FrameView`] taken after
//! the tick finished mutating state.

mod realtime;

pub use realtime::{Realtime, RealtimeFrame};

use loadsplit_core::{Command, ConfigError, Event, FrameView, MetricsSnapshot, SimulationConfig};
use loadsplit_system_balancing::Balancing;
use loadsplit_system_metrics::MetricsTracker;
use loadsplit_system_task_factory::{NextTask, TaskFactory};
use loadsplit_world::{self as world, query, World};
use tracing::{debug, trace};

/// Explicit simulation context with a create, reset and tick lifecycle.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    factory: TaskFactory,
    balancing: Balancing,
    metrics: MetricsTracker,
}

impl Simulation {
    /// Builds a simulation that has been reset with the provided configuration.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        let factory = TaskFactory::from_config(&config)?;
        let balancing = Balancing::new(config.policy, config.threshold);
        Ok(Self {
            world: World::with_config(config),
            factory,
            balancing,
            metrics: MetricsTracker::new(),
        })
    }

    /// Discards all run state and rebuilds it from a new configuration.
    ///
    /// The configuration is validated before anything is discarded, so a
    /// rejected configuration leaves the running simulation untouched.
    pub fn reconfigure(&mut self, config: SimulationConfig) -> Result<Vec<Event>, ConfigError> {
        self.factory = TaskFactory::from_config(&config)?;
        self.balancing = Balancing::new(config.policy, config.threshold);

        let mut events = Vec::new();
        self.apply(Command::Configure { config }, &mut events);
        self.metrics.handle(&events);
        debug!(
            loaders = query::loader_count(&self.world),
            "simulation reconfigured"
        );
        Ok(events)
    }

    /// Rebuilds the run state from the current configuration.
    pub fn reset(&mut self) -> Result<Vec<Event>, ConfigError> {
        self.reconfigure(self.config().clone())
    }

    /// Executes a single logical tick and returns the events it produced.
    pub fn tick(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        self.tick_into(&mut events);
        events
    }

    /// Executes a single logical tick, appending its events to `out_events`.
    pub fn tick_into(&mut self, out_events: &mut Vec<Event>) {
        let first = out_events.len();

        if query::is_splitter_tick(&self.world) {
            self.step_splitter(out_events);
        }
        self.apply(Command::Drain, out_events);

        self.metrics.handle(&out_events[first..]);
        trace!(
            tick = query::tick_index(&self.world),
            events = out_events.len() - first,
            "tick executed"
        );
    }

    /// Executes `ticks` logical ticks, discarding their events.
    pub fn run(&mut self, ticks: u64) {
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.clear();
            self.tick_into(&mut events);
        }
    }

    /// Read-only projection of the current state for renderers.
    #[must_use]
    pub fn view(&self) -> FrameView {
        FrameView {
            ticks: query::tick_index(&self.world),
            splitter: query::splitter_snapshot(&self.world),
            loaders: query::loader_snapshots(&self.world),
            metrics: self.metrics.snapshot(),
        }
    }

    /// Current running metrics.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Configuration the simulation was last reset with.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        query::config(&self.world)
    }

    /// Authoritative state, for queries through [`loadsplit_world::query`].
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    fn step_splitter(&mut self, out_events: &mut Vec<Event>) {
        if query::splitter_needs_task(&self.world) {
            match self.factory.next_task() {
                NextTask::Pause => {
                    self.apply(Command::PauseAdmission, out_events);
                    return;
                }
                NextTask::Task(spec) => {
                    let loads = query::loader_load_view(&self.world);
                    let target = self.balancing.select(&loads);
                    self.apply(Command::AdmitTask { spec, target }, out_events);
                }
            }
        }
        self.apply(Command::InjectUnit, out_events);
    }

    fn apply(&mut self, command: Command, out_events: &mut Vec<Event>) {
        world::apply(&mut self.world, command, out_events);
    }
}
