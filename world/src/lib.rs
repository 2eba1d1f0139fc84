#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative run state for the load splitter simulation.
//!
//! The world owns every task, the loader pool, the splitter slot and the tick
//! counter. It is mutated only through [`apply`], which executes a single
//! [`Command`] and reports the outcome as [`Event`] values.

use std::collections::{BTreeMap, VecDeque};

use loadsplit_core::{
    Command, Event, LoaderId, LoaderTarget, SimulationConfig, TaskColor, TaskId, TaskSnapshot,
    TaskSpec, PROGRESS_SCALE,
};
use tracing::{debug, trace};

/// Represents the authoritative simulation state.
#[derive(Debug)]
pub struct World {
    config: SimulationConfig,
    tasks: BTreeMap<TaskId, Task>,
    loaders: Vec<Loader>,
    splitter: SplitterSlot,
    next_task_id: u64,
    tick_index: u64,
}

impl World {
    /// Creates a world configured with [`SimulationConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    /// Creates a world that has already been reset with the provided configuration.
    #[must_use]
    pub fn with_config(config: SimulationConfig) -> Self {
        let mut world = Self {
            config: config.clone(),
            tasks: BTreeMap::new(),
            loaders: Vec::new(),
            splitter: SplitterSlot::Empty,
            next_task_id: 0,
            tick_index: 0,
        };
        let mut discarded = Vec::new();
        world.reset(config, &mut discarded);
        world
    }

    fn reset(&mut self, config: SimulationConfig, out_events: &mut Vec<Event>) {
        self.tasks.clear();
        self.loaders.clear();
        self.splitter = SplitterSlot::Empty;
        self.next_task_id = 0;
        self.tick_index = 0;
        let initial = config.initial_loader_count();
        self.config = config;
        out_events.push(Event::SimulationReset);

        for _ in 0..initial {
            let _ = self.spawn_loader(out_events);
        }
        debug!(loaders = initial, "world reset");
    }

    fn spawn_loader(&mut self, out_events: &mut Vec<Event>) -> LoaderId {
        let index = u32::try_from(self.loaders.len()).expect("loader pool exceeds u32::MAX");
        let id = LoaderId::new(index);
        self.loaders.push(Loader::new(id));
        out_events.push(Event::LoaderSpawned { loader: id });
        id
    }

    fn release_splitter(&mut self, out_events: &mut Vec<Event>) -> SplitterSlot {
        let previous = std::mem::replace(&mut self.splitter, SplitterSlot::Empty);
        if let SplitterSlot::Holding(task) = previous {
            out_events.push(Event::SplitterReleased { task });
            if self.tasks.get(&task).is_some_and(|task| task.drained) {
                let _ = self.tasks.remove(&task);
            }
        }
        previous
    }

    fn admit(&mut self, spec: TaskSpec, target: LoaderTarget, out_events: &mut Vec<Event>) {
        debug_assert!(
            query::splitter_needs_task(self),
            "admission requested while the splitter is still injecting"
        );
        let _ = self.release_splitter(out_events);

        let loader = match target {
            LoaderTarget::Existing(loader) => {
                assert!(
                    loader.index() < self.loaders.len(),
                    "balancing selected unknown loader {loader}"
                );
                loader
            }
            LoaderTarget::Spawn => self.spawn_loader(out_events),
        };

        let id = TaskId::new(self.next_task_id);
        self.next_task_id += 1;
        let _ = self.tasks.insert(id, Task::new(id, spec, loader));
        self.loaders[loader.index()].queue.push_back(id);
        self.splitter = SplitterSlot::Holding(id);

        trace!(task = %id, loader = %loader, size = spec.size(), "task admitted");
        out_events.push(Event::TaskAssigned {
            task: id,
            loader,
            size: spec.size(),
            color: spec.color(),
        });
    }

    fn pause_admission(&mut self, out_events: &mut Vec<Event>) {
        let previous = self.release_splitter(out_events);
        self.splitter = SplitterSlot::Paused;
        if previous != SplitterSlot::Paused {
            debug!(tick = self.tick_index, "admission paused");
            out_events.push(Event::AdmissionPaused);
        }
    }

    fn inject_unit(&mut self, out_events: &mut Vec<Event>) {
        let SplitterSlot::Holding(id) = self.splitter else {
            return;
        };
        let Some(task) = self.tasks.get_mut(&id) else {
            return;
        };
        if task.input_remaining == 0 {
            return;
        }

        task.input_remaining -= 1;
        task.processed_remaining += 1;
        self.loaders[task.loader.index()].queued += 1;

        out_events.push(Event::UnitInjected {
            task: id,
            loader: task.loader,
            input_remaining: task.input_remaining,
        });
    }

    fn drain(&mut self, out_events: &mut Vec<Event>) {
        let speed = u32::from(self.config.loader_speed.get());
        let mut throughput = 0;
        let mut completed = Vec::new();

        for loader in &mut self.loaders {
            if loader.queued == 0 {
                loader.progress = 0;
            } else {
                loader.progress += speed;
                throughput += speed;

                while loader.progress >= PROGRESS_SCALE {
                    loader.progress -= PROGRESS_SCALE;
                    loader.queued -= 1;

                    let head = *loader
                        .queue
                        .front()
                        .expect("queued work implies a queued task");
                    let task = self.tasks.get_mut(&head).expect("queued task is tracked");
                    debug_assert!(task.processed_remaining > 0, "head task has no held work");
                    task.processed_remaining -= 1;
                    task.output_produced += 1;

                    if task.processed_remaining == 0 && task.input_remaining == 0 {
                        let _ = loader.queue.pop_front();
                        task.drained = true;
                        completed.push(head);
                        out_events.push(Event::TaskCompleted {
                            task: head,
                            loader: loader.id,
                            latency: task.latency,
                            size: task.output_produced,
                        });
                    }
                }
            }

            for waiting in loader.queue.iter().skip(1) {
                if let Some(task) = self.tasks.get_mut(waiting) {
                    task.latency += 1;
                }
            }
        }

        for task in completed {
            if self.splitter != SplitterSlot::Holding(task) {
                let _ = self.tasks.remove(&task);
            }
        }

        out_events.push(Event::TimeAdvanced {
            tick: self.tick_index,
            throughput,
        });
        self.tick_index += 1;
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Configure { config } => world.reset(config, out_events),
        Command::AdmitTask { spec, target } => world.admit(spec, target, out_events),
        Command::PauseAdmission => world.pause_admission(out_events),
        Command::InjectUnit => world.inject_unit(out_events),
        Command::Drain => world.drain(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use loadsplit_core::{
        LoaderLoad, LoaderLoadView, LoaderSnapshot, SimulationConfig, SplitterSnapshot, TaskId,
        TaskSnapshot, SPLITTER_TICK_DIVISOR,
    };

    use super::{SplitterSlot, World};

    /// Configuration the world was last reset with.
    #[must_use]
    pub fn config(world: &World) -> &SimulationConfig {
        &world.config
    }

    /// Number of ticks executed since the last reset.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Reports whether the splitter acts during the upcoming tick.
    #[must_use]
    pub fn is_splitter_tick(world: &World) -> bool {
        world.tick_index % SPLITTER_TICK_DIVISOR == 0
    }

    /// Reports whether the splitter has no task left to inject.
    #[must_use]
    pub fn splitter_needs_task(world: &World) -> bool {
        match world.splitter {
            SplitterSlot::Empty | SplitterSlot::Paused => true,
            SplitterSlot::Holding(id) => world
                .tasks
                .get(&id)
                .map_or(true, |task| task.input_remaining == 0),
        }
    }

    /// Captures the backlog depth of every loader in pool order.
    #[must_use]
    pub fn loader_load_view(world: &World) -> LoaderLoadView {
        LoaderLoadView::from_loads(
            world
                .loaders
                .iter()
                .map(|loader| LoaderLoad {
                    id: loader.id,
                    queued: loader.queued,
                })
                .collect(),
        )
    }

    /// Number of loaders in the pool.
    #[must_use]
    pub fn loader_count(world: &World) -> usize {
        world.loaders.len()
    }

    /// Captures every loader and its backlog in pool order.
    #[must_use]
    pub fn loader_snapshots(world: &World) -> Vec<LoaderSnapshot> {
        world
            .loaders
            .iter()
            .map(|loader| LoaderSnapshot {
                id: loader.id,
                queued: loader.queued,
                progress: loader.progress,
                tasks: loader
                    .queue
                    .iter()
                    .filter_map(|id| world.tasks.get(id))
                    .map(|task| task.snapshot())
                    .collect(),
            })
            .collect()
    }

    /// Captures the splitter state.
    #[must_use]
    pub fn splitter_snapshot(world: &World) -> SplitterSnapshot {
        match world.splitter {
            SplitterSlot::Empty => SplitterSnapshot {
                task: None,
                paused: false,
            },
            SplitterSlot::Paused => SplitterSnapshot {
                task: None,
                paused: true,
            },
            SplitterSlot::Holding(id) => SplitterSnapshot {
                task: task(world, id),
                paused: false,
            },
        }
    }

    /// Captures a single live task.
    #[must_use]
    pub fn task(world: &World, id: TaskId) -> Option<TaskSnapshot> {
        world.tasks.get(&id).map(|task| task.snapshot())
    }

    /// Number of tasks still tracked by the world.
    #[must_use]
    pub fn live_task_count(world: &World) -> usize {
        world.tasks.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SplitterSlot {
    Empty,
    Paused,
    Holding(TaskId),
}

#[derive(Debug)]
struct Task {
    id: TaskId,
    input_remaining: u32,
    processed_remaining: u32,
    output_produced: u32,
    latency: u64,
    color: TaskColor,
    loader: LoaderId,
    drained: bool,
}

impl Task {
    fn new(id: TaskId, spec: TaskSpec, loader: LoaderId) -> Self {
        Self {
            id,
            input_remaining: spec.size(),
            processed_remaining: 0,
            output_produced: 0,
            latency: 0,
            color: spec.color(),
            loader,
            drained: false,
        }
    }

    fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id,
            input_remaining: self.input_remaining,
            processed_remaining: self.processed_remaining,
            output_produced: self.output_produced,
            latency: self.latency,
            color: self.color,
            loader: self.loader,
        }
    }
}

#[derive(Debug)]
struct Loader {
    id: LoaderId,
    queued: u32,
    progress: u32,
    queue: VecDeque<TaskId>,
}

impl Loader {
    fn new(id: LoaderId) -> Self {
        Self {
            id,
            queued: 0,
            progress: 0,
            queue: VecDeque::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{apply, query, World};
    use loadsplit_core::{
        Command, Event, InitialPool, LoaderId, LoaderSpeed, LoaderTarget, SimulationConfig,
        TaskColor, TaskId, TaskSpec,
    };

    fn config(speed: u8, pool: u32) -> SimulationConfig {
        SimulationConfig {
            loader_speed: LoaderSpeed::new(speed).expect("valid speed"),
            initial_pool: InitialPool::Fixed(pool),
            ..SimulationConfig::default()
        }
    }

    fn spec(size: u32) -> TaskSpec {
        TaskSpec::new(size, TaskColor::from_rgb(255, 7, 40))
    }

    #[test]
    fn configure_rebuilds_initial_pool() {
        let mut world = World::new();
        assert_eq!(query::loader_count(&world), 8);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Configure {
                config: config(4, 3),
            },
            &mut events,
        );

        assert_eq!(query::loader_count(&world), 3);
        assert_eq!(events[0], Event::SimulationReset);
        assert_eq!(
            events[3],
            Event::LoaderSpawned {
                loader: LoaderId::new(2)
            }
        );
        assert_eq!(query::tick_index(&world), 0);
    }

    #[test]
    fn admission_spawns_loader_on_request() {
        let mut world = World::with_config(config(4, 0));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AdmitTask {
                spec: spec(3),
                target: LoaderTarget::Spawn,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::LoaderSpawned {
                    loader: LoaderId::new(0)
                },
                Event::TaskAssigned {
                    task: TaskId::new(0),
                    loader: LoaderId::new(0),
                    size: 3,
                    color: TaskColor::from_rgb(255, 7, 40),
                },
            ]
        );
        assert!(!query::splitter_needs_task(&world));
    }

    #[test]
    fn injection_moves_single_unit() {
        let mut world = World::with_config(config(4, 1));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AdmitTask {
                spec: spec(2),
                target: LoaderTarget::Existing(LoaderId::new(0)),
            },
            &mut events,
        );
        apply(&mut world, Command::InjectUnit, &mut events);

        let loaders = query::loader_snapshots(&world);
        assert_eq!(loaders[0].queued, 1);
        let task = loaders[0].tasks[0];
        assert_eq!(task.input_remaining, 1);
        assert_eq!(task.processed_remaining, 1);
        assert_eq!(task.output_produced, 0);

        apply(&mut world, Command::InjectUnit, &mut events);
        apply(&mut world, Command::InjectUnit, &mut events);
        let task = query::task(&world, TaskId::new(0)).expect("task is live");
        assert_eq!(task.input_remaining, 0);
        assert_eq!(task.processed_remaining, 2);
        assert!(query::splitter_needs_task(&world));
    }

    #[test]
    fn drain_completes_unit_after_scale_is_reached() {
        let mut world = World::with_config(config(8, 1));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AdmitTask {
                spec: spec(1),
                target: LoaderTarget::Existing(LoaderId::new(0)),
            },
            &mut events,
        );
        apply(&mut world, Command::InjectUnit, &mut events);

        for _ in 0..7 {
            apply(&mut world, Command::Drain, &mut events);
        }
        assert_eq!(query::loader_snapshots(&world)[0].progress, 56);
        assert_eq!(query::loader_snapshots(&world)[0].queued, 1);

        events.clear();
        apply(&mut world, Command::Drain, &mut events);
        assert_eq!(
            events,
            vec![
                Event::TaskCompleted {
                    task: TaskId::new(0),
                    loader: LoaderId::new(0),
                    latency: 0,
                    size: 1,
                },
                Event::TimeAdvanced {
                    tick: 7,
                    throughput: 8,
                },
            ]
        );
        let loader = &query::loader_snapshots(&world)[0];
        assert_eq!(loader.queued, 0);
        assert_eq!(loader.progress, 0);
        assert!(loader.tasks.is_empty());
    }

    #[test]
    fn idle_loader_discards_progress() {
        let mut world = World::with_config(config(8, 1));
        let mut events = Vec::new();
        apply(&mut world, Command::Drain, &mut events);
        assert_eq!(
            events,
            vec![Event::TimeAdvanced {
                tick: 0,
                throughput: 0
            }]
        );
        assert_eq!(query::loader_snapshots(&world)[0].progress, 0);
    }

    #[test]
    fn latency_accrues_only_behind_the_head() {
        let mut world = World::with_config(config(1, 1));
        let mut events = Vec::new();
        let target = LoaderTarget::Existing(LoaderId::new(0));
        apply(
            &mut world,
            Command::AdmitTask {
                spec: spec(1),
                target,
            },
            &mut events,
        );
        apply(&mut world, Command::InjectUnit, &mut events);
        apply(
            &mut world,
            Command::AdmitTask {
                spec: spec(1),
                target,
            },
            &mut events,
        );
        apply(&mut world, Command::InjectUnit, &mut events);

        for _ in 0..3 {
            apply(&mut world, Command::Drain, &mut events);
        }

        let loader = &query::loader_snapshots(&world)[0];
        assert_eq!(loader.tasks[0].latency, 0);
        assert_eq!(loader.tasks[1].latency, 3);
    }

    #[test]
    fn splitter_release_drops_completed_task() {
        let mut world = World::with_config(config(8, 1));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::AdmitTask {
                spec: spec(1),
                target: LoaderTarget::Existing(LoaderId::new(0)),
            },
            &mut events,
        );
        apply(&mut world, Command::InjectUnit, &mut events);
        for _ in 0..8 {
            apply(&mut world, Command::Drain, &mut events);
        }

        assert_eq!(query::live_task_count(&world), 1, "splitter still holds task");
        assert_eq!(
            query::splitter_snapshot(&world).task.map(|task| task.id),
            Some(TaskId::new(0))
        );

        events.clear();
        apply(&mut world, Command::PauseAdmission, &mut events);
        assert_eq!(
            events,
            vec![
                Event::SplitterReleased {
                    task: TaskId::new(0)
                },
                Event::AdmissionPaused,
            ]
        );
        assert_eq!(query::live_task_count(&world), 0);
        assert!(query::splitter_snapshot(&world).paused);

        events.clear();
        apply(&mut world, Command::PauseAdmission, &mut events);
        assert!(events.is_empty(), "repeated pause is silent");
    }
}
