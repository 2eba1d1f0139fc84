#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic task factory that sizes and colors incoming tasks.
//!
//! Tasks are drawn from a scripted [`SequencePlanner`] while it has entries
//! and from a seeded random source afterwards. Cosmetic draws use a second,
//! independently seeded source so that changing how colors are produced never
//! shifts the sizing stream.

mod colors;
mod random;
mod sequence;

pub use colors::named_color;
pub use random::SeededRandom;
pub use sequence::{ScriptedSize, SequenceEntry, SequencePlanner};

use loadsplit_core::{
    ConfigError, RandomSource, SimulationConfig, TaskColor, TaskSpec, MAX_RANDOM_TASK_SIZE,
};

/// Digits seeding the cosmetic source regardless of the configured seed.
pub const COSMETIC_SEED: [u32; 1] = [0];

const FULL_CHANNEL: u8 = 0xFF;
const DIM_CHANNEL: u8 = 0x07;

/// Outcome of a task request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NextTask {
    /// A task ready for admission.
    Task(TaskSpec),
    /// A pause marker sits at the head of the scripted sequence.
    Pause,
}

/// Produces task descriptions for the splitter.
#[derive(Clone, Debug)]
pub struct TaskFactory<R = SeededRandom> {
    planner: SequencePlanner,
    sizing: R,
    cosmetics: R,
}

impl TaskFactory<SeededRandom> {
    /// Builds a factory from the seed and sequence of a configuration.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        let digits = config.seed_digits()?;
        Ok(Self::new(
            SequencePlanner::parse(&config.sequence),
            SeededRandom::from_digits(&digits),
            SeededRandom::from_digits(&COSMETIC_SEED),
        ))
    }
}

impl<R: RandomSource> TaskFactory<R> {
    /// Creates a factory from explicit parts.
    #[must_use]
    pub fn new(planner: SequencePlanner, sizing: R, cosmetics: R) -> Self {
        Self {
            planner,
            sizing,
            cosmetics,
        }
    }

    /// Scripted entries that remain.
    #[must_use]
    pub fn planner(&self) -> &SequencePlanner {
        &self.planner
    }

    /// Produces the next task, or [`NextTask::Pause`] while a pause marker is at the head.
    ///
    /// The pause marker is never consumed, so every later request observes it too.
    pub fn next_task(&mut self) -> NextTask {
        if let Some(entry) = self.planner.peek().copied() {
            let ScriptedSize::Units(size) = entry.size() else {
                return NextTask::Pause;
            };
            let _ = self.planner.advance();
            let color = match entry.color() {
                Some(color) => color,
                None => self.random_color(),
            };
            return NextTask::Task(TaskSpec::new(size, color));
        }

        let size = self.random_size();
        let color = self.random_color();
        NextTask::Task(TaskSpec::new(size, color))
    }

    fn random_size(&mut self) -> u32 {
        let scaled = (self.sizing.next_unit() * f64::from(MAX_RANDOM_TASK_SIZE)).floor() as u32;
        scaled.min(MAX_RANDOM_TASK_SIZE - 1) + 1
    }

    /// Draws one free channel, shuffles `{0xFF, 0x07, free}` and assigns the
    /// result to red, blue and green in that order.
    fn random_color(&mut self) -> TaskColor {
        let free = (self.cosmetics.next_unit() * 256.0).floor() as u8;
        let mut channels = [FULL_CHANNEL, DIM_CHANNEL, free];

        for index in 1..channels.len() {
            let mut cursor = index;
            while cursor > 0 && self.cosmetics.next_unit() < 0.5 {
                channels.swap(cursor - 1, cursor);
                cursor -= 1;
            }
        }

        let [red, blue, green] = channels;
        TaskColor::from_rgb(red, green, blue)
    }
}
