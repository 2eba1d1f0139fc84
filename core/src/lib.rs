#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the load splitter simulation.
//!
//! This crate defines the message surface that connects the engine, the
//! authoritative world, and pure systems. The engine submits [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values that systems
//! and renderers consume deterministically. Systems read immutable views and
//! never mutate the world directly.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed-point scale separating one whole work-unit from loader speed increments.
pub const PROGRESS_SCALE: u32 = 64;

/// Upper bound (inclusive) of randomly generated task sizes.
pub const MAX_RANDOM_TASK_SIZE: u32 = 27;

/// Aggregate drain capacity the automatic initial pool must provide, in progress units per tick.
pub const POOL_CAPACITY_TARGET: f64 = 31.5;

/// The splitter only acts on tick indices divisible by this value.
pub const SPLITTER_TICK_DIVISOR: u64 = 2;

/// Default queue-depth admission threshold, in work-units.
pub const DEFAULT_THRESHOLD_SIZE: u32 = 21;

/// Smallest permitted threshold size or resolution.
pub const MIN_THRESHOLD_SETTING: u32 = 1;

/// Largest permitted threshold size or resolution.
pub const MAX_THRESHOLD_SETTING: u32 = 100;

/// Slowest permitted loader speed.
pub const MIN_LOADER_SPEED: u8 = 1;

/// Fastest permitted loader speed.
pub const MAX_LOADER_SPEED: u8 = 8;

/// Seed used when no seed has been configured.
pub const DEFAULT_SEED: &str = "0000000000";

/// Errors raised when configuration values fall outside their documented ranges.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Loader speed was outside `1..=8`.
    #[error("loader speed {0} is outside the supported range 1..=8")]
    LoaderSpeedOutOfRange(u8),
    /// The seed contained a character that is not an ASCII digit.
    #[error("seed contains non-digit character {character:?} at position {position}")]
    InvalidSeed {
        /// Offending character.
        character: char,
        /// Zero-based character position within the seed.
        position: usize,
    },
    /// Admission threshold size was outside `1..=100`.
    #[error("admission threshold size {0} is outside the supported range 1..=100")]
    ThresholdSizeOutOfRange(u32),
    /// Admission threshold resolution was outside `1..=100`.
    #[error("admission threshold resolution {0} is outside the supported range 1..=100")]
    ThresholdResolutionOutOfRange(u32),
}

/// Unique identifier assigned to a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(u64);

impl TaskId {
    /// Creates a new task identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a loader, equal to its index in creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LoaderId(u32);

impl LoaderId {
    /// Creates a new loader identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Position of the loader within the pool.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cosmetic appearance applied to a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl TaskColor {
    /// Creates a new task color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

impl fmt::Display for TaskColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

/// Description of a task produced by the task factory before the world assigns its id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskSpec {
    size: u32,
    color: TaskColor,
}

impl TaskSpec {
    /// Creates a task description. Sizes must be at least one work-unit.
    ///
    /// # Panics
    ///
    /// Panics when `size` is zero, since an empty task would desynchronise work accounting.
    #[must_use]
    pub fn new(size: u32, color: TaskColor) -> Self {
        assert!(size > 0, "task size must be at least one work-unit");
        Self { size, color }
    }

    /// Number of work-units carried by the task.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Appearance assigned to the task.
    #[must_use]
    pub const fn color(&self) -> TaskColor {
        self.color
    }
}

/// Work-units drained per tick, expressed in `1 / PROGRESS_SCALE` fractions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LoaderSpeed(u8);

impl LoaderSpeed {
    /// Validates and wraps a loader speed.
    pub fn new(value: u8) -> Result<Self, ConfigError> {
        if (MIN_LOADER_SPEED..=MAX_LOADER_SPEED).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfigError::LoaderSpeedOutOfRange(value))
        }
    }

    /// Retrieves the raw speed.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Number of ticks needed to drain one work-unit while continuously fed.
    #[must_use]
    pub const fn ticks_per_unit(&self) -> u32 {
        PROGRESS_SCALE.div_ceil(self.0 as u32)
    }
}

impl Default for LoaderSpeed {
    fn default() -> Self {
        Self(4)
    }
}

impl TryFrom<u8> for LoaderSpeed {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LoaderSpeed> for u8 {
    fn from(speed: LoaderSpeed) -> Self {
        speed.0
    }
}

/// Independent switches selecting the loader balancing behaviour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancingPolicy {
    /// Admit tasks into loaders whose backlog is below a depth cutoff.
    pub admit_by_queue_depth: bool,
    /// Prefer the first idle loader before applying admission rules.
    pub prefer_idle_first: bool,
    /// Tighten the admission cutoff for the front half of the pool.
    pub weight_thresholds_by_position: bool,
    /// Always assign the least loaded loader.
    pub always_pick_minimum: bool,
}

impl BalancingPolicy {
    /// Named presets covering the comparison scenarios operators usually run.
    #[must_use]
    pub fn presets() -> [(&'static str, BalancingPolicy); 5] {
        [
            ("none", BalancingPolicy::default()),
            (
                "idle-first",
                BalancingPolicy {
                    prefer_idle_first: true,
                    ..BalancingPolicy::default()
                },
            ),
            (
                "threshold",
                BalancingPolicy {
                    admit_by_queue_depth: true,
                    prefer_idle_first: true,
                    ..BalancingPolicy::default()
                },
            ),
            (
                "weighted",
                BalancingPolicy {
                    admit_by_queue_depth: true,
                    prefer_idle_first: true,
                    weight_thresholds_by_position: true,
                    ..BalancingPolicy::default()
                },
            ),
            (
                "ideal",
                BalancingPolicy {
                    always_pick_minimum: true,
                    ..BalancingPolicy::default()
                },
            ),
        ]
    }
}

/// Backlog depth at which queue-depth admission rejects a loader.
///
/// Backlogs and cutoffs are compared in buckets of `resolution` work-units,
/// each rounded up, so a coarse resolution rejects backlogs that share the
/// cutoff's bucket even when they sit below the nominal size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ThresholdFields", into = "ThresholdFields")]
pub struct AdmissionThreshold {
    size: u32,
    resolution: u32,
}

impl AdmissionThreshold {
    /// Validates and wraps a threshold size and resolution.
    pub fn new(size: u32, resolution: u32) -> Result<Self, ConfigError> {
        let range = MIN_THRESHOLD_SETTING..=MAX_THRESHOLD_SETTING;
        if !range.contains(&size) {
            return Err(ConfigError::ThresholdSizeOutOfRange(size));
        }
        if !range.contains(&resolution) {
            return Err(ConfigError::ThresholdResolutionOutOfRange(resolution));
        }
        Ok(Self { size, resolution })
    }

    /// Cutoff applied across the pool, in work-units.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Width of the buckets backlogs are compared in.
    #[must_use]
    pub const fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Tighter cutoff applied to the front half of a position-weighted pool.
    #[must_use]
    pub const fn narrow_size(&self) -> u32 {
        self.size.div_ceil(2)
    }

    /// Bucket a backlog depth falls into.
    #[must_use]
    pub const fn bucket(&self, queued: u32) -> u32 {
        queued.div_ceil(self.resolution)
    }

    /// Reports whether a backlog sits in a lower bucket than the cutoff.
    #[must_use]
    pub const fn admits(&self, queued: u32, cutoff: u32) -> bool {
        self.bucket(queued) < self.bucket(cutoff)
    }
}

impl Default for AdmissionThreshold {
    fn default() -> Self {
        Self {
            size: DEFAULT_THRESHOLD_SIZE,
            resolution: MIN_THRESHOLD_SETTING,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
struct ThresholdFields {
    size: u32,
    resolution: u32,
}

impl Default for ThresholdFields {
    fn default() -> Self {
        AdmissionThreshold::default().into()
    }
}

impl TryFrom<ThresholdFields> for AdmissionThreshold {
    type Error = ConfigError;

    fn try_from(fields: ThresholdFields) -> Result<Self, Self::Error> {
        Self::new(fields.size, fields.resolution)
    }
}

impl From<AdmissionThreshold> for ThresholdFields {
    fn from(threshold: AdmissionThreshold) -> Self {
        Self {
            size: threshold.size,
            resolution: threshold.resolution,
        }
    }
}

/// Sizing rule for the loader pool created at reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialPool {
    /// Enough loaders to provide [`POOL_CAPACITY_TARGET`] aggregate drain capacity.
    #[default]
    Automatic,
    /// Exactly the provided number of loaders.
    Fixed(u32),
}

impl InitialPool {
    /// Number of loaders to create for the provided loader speed.
    #[must_use]
    pub fn loader_count(self, speed: LoaderSpeed) -> u32 {
        match self {
            Self::Automatic => (POOL_CAPACITY_TARGET / f64::from(speed.get())).ceil() as u32,
            Self::Fixed(count) => count,
        }
    }
}

/// Complete configuration consumed when the simulation resets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Digit string seeding the task sizing random source.
    pub seed: String,
    /// Comma-separated scripted task sizes that override random generation.
    pub sequence: String,
    /// Drain speed shared by every loader.
    pub loader_speed: LoaderSpeed,
    /// Balancing switches used when selecting loaders.
    pub policy: BalancingPolicy,
    /// Backlog depth at which queue-depth admission rejects a loader.
    pub threshold: AdmissionThreshold,
    /// Sizing rule for the pool created at reset.
    pub initial_pool: InitialPool,
}

impl SimulationConfig {
    /// Converts the seed string into the per-digit array used to seed the random source.
    pub fn seed_digits(&self) -> Result<Vec<u32>, ConfigError> {
        self.seed
            .chars()
            .enumerate()
            .map(|(position, character)| {
                character
                    .to_digit(10)
                    .ok_or(ConfigError::InvalidSeed {
                        character,
                        position,
                    })
            })
            .collect()
    }

    /// Number of loaders created when the simulation resets with this configuration.
    #[must_use]
    pub fn initial_loader_count(&self) -> u32 {
        self.initial_pool.loader_count(self.loader_speed)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED.to_owned(),
            sequence: String::new(),
            loader_speed: LoaderSpeed::default(),
            policy: BalancingPolicy::default(),
            threshold: AdmissionThreshold::default(),
            initial_pool: InitialPool::default(),
        }
    }
}

/// Loader chosen by the balancing policy for a newly admitted task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoaderTarget {
    /// Assign the task to an existing loader.
    Existing(LoaderId),
    /// Grow the pool by one loader and assign the task to it.
    Spawn,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Discards all run state and rebuilds it from the provided configuration.
    Configure {
        /// Configuration the world adopts.
        config: SimulationConfig,
    },
    /// Retires the splitter's previous task and admits a new one into a loader.
    AdmitTask {
        /// Size and appearance of the admitted task.
        spec: TaskSpec,
        /// Loader that receives the task.
        target: LoaderTarget,
    },
    /// Retires the splitter's previous task and suspends admission.
    PauseAdmission,
    /// Moves one work-unit from the in-flight task into its loader's backlog.
    InjectUnit,
    /// Drains every loader for one tick and advances the tick counter.
    Drain,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Indicates that all run state was discarded.
    SimulationReset,
    /// Confirms that a loader joined the pool.
    LoaderSpawned {
        /// Identifier of the new loader.
        loader: LoaderId,
    },
    /// Confirms that the splitter admitted a task into a loader's queue.
    TaskAssigned {
        /// Identifier allocated to the task.
        task: TaskId,
        /// Loader that received the task.
        loader: LoaderId,
        /// Number of work-units carried by the task.
        size: u32,
        /// Appearance of the task.
        color: TaskColor,
    },
    /// Announces that the splitter let go of its in-flight task.
    SplitterReleased {
        /// Task the splitter no longer holds.
        task: TaskId,
    },
    /// Announces that the splitter reached a pause marker.
    AdmissionPaused,
    /// Confirms that one work-unit moved from the splitter into a loader.
    UnitInjected {
        /// Task whose input was reduced.
        task: TaskId,
        /// Loader whose backlog grew.
        loader: LoaderId,
        /// Work-units still held by the splitter for this task.
        input_remaining: u32,
    },
    /// Confirms that a task was fully drained and left its loader's queue.
    TaskCompleted {
        /// Identifier of the completed task.
        task: TaskId,
        /// Loader that drained the task.
        loader: LoaderId,
        /// Ticks the task spent waiting behind the head of the queue.
        latency: u64,
        /// Number of work-units the task carried.
        size: u32,
    },
    /// Indicates that a tick completed.
    TimeAdvanced {
        /// Zero-based index of the tick that completed.
        tick: u64,
        /// Sum of loader speeds that drained work during the tick.
        throughput: u32,
    },
}

/// Immutable representation of a single task's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Identifier allocated to the task.
    pub id: TaskId,
    /// Work-units not yet handed to a loader.
    pub input_remaining: u32,
    /// Work-units held by the loader and not yet drained.
    pub processed_remaining: u32,
    /// Work-units fully drained.
    pub output_produced: u32,
    /// Ticks spent waiting behind the head of the loader queue.
    pub latency: u64,
    /// Appearance of the task.
    pub color: TaskColor,
    /// Loader the task was assigned to.
    pub loader: LoaderId,
}

impl TaskSnapshot {
    /// Size the task was created with.
    #[must_use]
    pub const fn original_size(&self) -> u32 {
        self.input_remaining + self.processed_remaining + self.output_produced
    }
}

/// Immutable representation of a loader and its backlog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoaderSnapshot {
    /// Identifier of the loader.
    pub id: LoaderId,
    /// Undrained work-units across the backlog.
    pub queued: u32,
    /// Partial progress toward draining the next unit, in `[0, PROGRESS_SCALE)`.
    pub progress: u32,
    /// Backlog in arrival order; the head is being drained.
    pub tasks: Vec<TaskSnapshot>,
}

/// Load summary of a single loader consumed by the balancing policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoaderLoad {
    /// Identifier of the loader.
    pub id: LoaderId,
    /// Undrained work-units across the backlog.
    pub queued: u32,
}

/// Read-only view of every loader's backlog depth in index order.
#[derive(Clone, Debug, Default)]
pub struct LoaderLoadView {
    loads: Vec<LoaderLoad>,
}

impl LoaderLoadView {
    /// Creates a new view from loads sorted by loader identifier.
    #[must_use]
    pub fn from_loads(mut loads: Vec<LoaderLoad>) -> Self {
        loads.sort_by_key(|load| load.id);
        Self { loads }
    }

    /// Iterator over the loads in pool order.
    pub fn iter(&self) -> impl Iterator<Item = &LoaderLoad> {
        self.loads.iter()
    }

    /// Number of loaders in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.loads.len()
    }

    /// Reports whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    /// Last loader in the pool, if any.
    #[must_use]
    pub fn last(&self) -> Option<&LoaderLoad> {
        self.loads.last()
    }
}

/// State of the splitter exposed to renderers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitterSnapshot {
    /// Task currently held by the splitter.
    pub task: Option<TaskSnapshot>,
    /// Whether a pause marker suspended admission.
    pub paused: bool,
}

/// Running metrics exposed to renderers and reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Running mean of completed task latency, in ticks.
    pub mean_latency: f64,
    /// Running mean of per-tick throughput, in progress units.
    pub mean_throughput: f64,
    /// Number of tasks admitted into a loader.
    pub admitted_tasks: u64,
    /// Number of tasks completed.
    pub completed_tasks: u64,
    /// Number of ticks observed.
    pub ticks: u64,
    /// Smallest and largest latency sample observed.
    pub latency_range: Option<(u64, u64)>,
    /// Smallest and largest throughput sample observed.
    pub throughput_range: Option<(u32, u32)>,
}

impl MetricsSnapshot {
    /// Mean throughput converted into whole work-units per tick.
    #[must_use]
    pub fn mean_throughput_units(&self) -> f64 {
        self.mean_throughput / f64::from(PROGRESS_SCALE)
    }
}

/// Read-only projection handed to renderers after a tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameView {
    /// Total ticks executed since the last reset.
    pub ticks: u64,
    /// Splitter state.
    pub splitter: SplitterSnapshot,
    /// Loaders in pool order.
    pub loaders: Vec<LoaderSnapshot>,
    /// Running metrics.
    pub metrics: MetricsSnapshot,
}

/// Deterministic source of uniform floats.
pub trait RandomSource {
    /// Returns the next value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

#[cfg(test)]
mod tests {
    use super::{
        AdmissionThreshold, BalancingPolicy, ConfigError, InitialPool, LoaderSpeed,
        SimulationConfig, TaskColor,
    };

    #[test]
    fn loader_speed_rejects_out_of_range_values() {
        assert_eq!(
            LoaderSpeed::new(0),
            Err(ConfigError::LoaderSpeedOutOfRange(0))
        );
        assert_eq!(
            LoaderSpeed::new(9),
            Err(ConfigError::LoaderSpeedOutOfRange(9))
        );
        assert!(LoaderSpeed::new(1).is_ok());
        assert!(LoaderSpeed::new(8).is_ok());
    }

    #[test]
    fn ticks_per_unit_rounds_up() {
        let speed = |value| LoaderSpeed::new(value).expect("valid speed");
        assert_eq!(speed(8).ticks_per_unit(), 8);
        assert_eq!(speed(3).ticks_per_unit(), 22);
        assert_eq!(speed(1).ticks_per_unit(), 64);
    }

    #[test]
    fn automatic_pool_guarantees_capacity() {
        let count = |value| InitialPool::Automatic.loader_count(LoaderSpeed::new(value).unwrap());
        assert_eq!(count(1), 32);
        assert_eq!(count(4), 8);
        assert_eq!(count(5), 7);
        assert_eq!(count(8), 4);
        for value in 1..=8 {
            assert!(f64::from(count(value) * u32::from(value)) >= 31.5);
        }
    }

    #[test]
    fn fixed_pool_ignores_speed() {
        let speed = LoaderSpeed::new(2).unwrap();
        assert_eq!(InitialPool::Fixed(3).loader_count(speed), 3);
    }

    #[test]
    fn seed_digits_are_parsed_per_character() {
        let config = SimulationConfig {
            seed: "0427".to_owned(),
            ..SimulationConfig::default()
        };
        assert_eq!(config.seed_digits(), Ok(vec![0, 4, 2, 7]));
    }

    #[test]
    fn seed_with_letters_is_rejected() {
        let config = SimulationConfig {
            seed: "12a".to_owned(),
            ..SimulationConfig::default()
        };
        assert_eq!(
            config.seed_digits(),
            Err(ConfigError::InvalidSeed {
                character: 'a',
                position: 2
            })
        );
    }

    #[test]
    fn color_displays_as_hex() {
        assert_eq!(TaskColor::from_rgb(255, 0, 7).to_string(), "#FF0007");
    }

    #[test]
    fn presets_cover_every_switch() {
        let presets = BalancingPolicy::presets();
        assert!(presets.iter().any(|(_, policy)| policy.always_pick_minimum));
        assert!(presets
            .iter()
            .any(|(_, policy)| policy.weight_thresholds_by_position));
        assert_eq!(presets[0].1, BalancingPolicy::default());
    }

    #[test]
    fn config_round_trips_through_bincode() {
        let config = SimulationConfig {
            seed: "31415".to_owned(),
            sequence: "4/red,-1".to_owned(),
            loader_speed: LoaderSpeed::new(6).unwrap(),
            policy: BalancingPolicy::presets()[3].1,
            threshold: AdmissionThreshold::new(40, 5).unwrap(),
            initial_pool: InitialPool::Fixed(2),
        };
        let bytes = bincode::serialize(&config).expect("serialize");
        let restored: SimulationConfig = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, config);
    }

    #[test]
    fn default_threshold_keeps_the_wide_and_narrow_cutoffs() {
        let threshold = AdmissionThreshold::default();
        assert_eq!(threshold.size(), 21);
        assert_eq!(threshold.narrow_size(), 11);
        assert!(threshold.admits(20, 21));
        assert!(!threshold.admits(21, 21));
    }

    #[test]
    fn coarse_resolution_compares_buckets() {
        let threshold = AdmissionThreshold::new(27, 5).unwrap();
        assert_eq!(threshold.bucket(0), 0);
        assert_eq!(threshold.bucket(5), 1);
        assert_eq!(threshold.bucket(6), 2);
        assert_eq!(threshold.bucket(27), 6);
        assert!(threshold.admits(25, 27));
        assert!(!threshold.admits(26, 27));
    }

    #[test]
    fn threshold_rejects_out_of_range_settings() {
        assert_eq!(
            AdmissionThreshold::new(0, 1),
            Err(ConfigError::ThresholdSizeOutOfRange(0))
        );
        assert_eq!(
            AdmissionThreshold::new(21, 101),
            Err(ConfigError::ThresholdResolutionOutOfRange(101))
        );
        assert!(AdmissionThreshold::new(100, 100).is_ok());
    }

    #[test]
    fn invalid_threshold_fails_deserialization() {
        let bytes = bincode::serialize(&(0u32, 1u32)).expect("serialize");
        assert!(bincode::deserialize::<AdmissionThreshold>(&bytes).is_err());
    }

    #[test]
    fn invalid_speed_fails_deserialization() {
        let bytes = bincode::serialize(&12u8).expect("serialize");
        assert!(bincode::deserialize::<LoaderSpeed>(&bytes).is_err());
    }
}
