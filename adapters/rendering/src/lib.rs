#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for load splitter adapters.
//!
//! Renderers only ever receive a [`FrameView`] taken after a tick finished, so
//! they can never influence simulation decisions.

mod text;

pub use text::{render_frame, TextRenderer};

use std::{collections::BTreeSet, fmt};

use anyhow::Result as AnyResult;
use loadsplit_core::{Event, FrameView, TaskId, TaskSnapshot, PROGRESS_SCALE};
use thiserror::Error;
use tracing::trace;

/// Width in pixels of a single work-unit in a task bar.
pub const UNIT_BAR_WIDTH: u32 = 8;

/// Backend capable of presenting simulation frames.
pub trait Renderer {
    /// Presents a frame projected after the final tick of a burst.
    fn present(&mut self, view: &FrameView) -> AnyResult<()>;
}

/// Where a render handle lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleSlot {
    /// Handle drawn inside the splitter while the task is being injected.
    Splitter,
    /// Handle drawn inside the loader queue until the task completes.
    Loader,
}

impl fmt::Display for HandleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Splitter => write!(f, "splitter"),
            Self::Loader => write!(f, "loader"),
        }
    }
}

/// Errors raised when renderer bookkeeping falls out of sync with the world.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// A handle was attached for a task that already owns one in the same slot.
    #[error("{slot} handle for task {task} is already attached")]
    HandleAlreadyAttached {
        /// Task whose handle was attached twice.
        task: TaskId,
        /// Slot that already held the handle.
        slot: HandleSlot,
    },
}

/// Registry of the visual handles a renderer keeps per task.
///
/// Fed with world events in order. Attaching a handle twice is a contract
/// violation between the world and the renderer and is reported immediately.
#[derive(Clone, Debug, Default)]
pub struct RenderHandles {
    splitter: Option<TaskId>,
    loaders: BTreeSet<TaskId>,
}

impl RenderHandles {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies world events to the registry.
    pub fn handle(&mut self, events: &[Event]) -> Result<(), RenderError> {
        for event in events {
            match *event {
                Event::SimulationReset => {
                    self.splitter = None;
                    self.loaders.clear();
                }
                Event::TaskAssigned { task, .. } => {
                    let slot = if self.loaders.contains(&task) {
                        Some(HandleSlot::Loader)
                    } else if self.splitter == Some(task) {
                        Some(HandleSlot::Splitter)
                    } else {
                        None
                    };
                    if let Some(slot) = slot {
                        return Err(RenderError::HandleAlreadyAttached { task, slot });
                    }
                    self.splitter = Some(task);
                    let _ = self.loaders.insert(task);
                    trace!(task = %task, "render handles attached");
                }
                Event::SplitterReleased { task } => {
                    if self.splitter == Some(task) {
                        self.splitter = None;
                    }
                }
                Event::TaskCompleted { task, .. } => {
                    let _ = self.loaders.remove(&task);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Task whose handle is drawn inside the splitter.
    #[must_use]
    pub fn splitter(&self) -> Option<TaskId> {
        self.splitter
    }

    /// Reports whether a task has a handle in a loader queue.
    #[must_use]
    pub fn in_loader(&self, task: TaskId) -> bool {
        self.loaders.contains(&task)
    }

    /// Number of handles drawn inside loader queues.
    #[must_use]
    pub fn loader_handles(&self) -> usize {
        self.loaders.len()
    }
}

/// Bar width of the task held by the splitter: its remaining input.
#[must_use]
pub fn splitter_bar_width(task: &TaskSnapshot) -> u32 {
    task.input_remaining * UNIT_BAR_WIDTH
}

/// Bar width of the task at the head of a loader queue.
///
/// The unit currently being drained shrinks with the loader's partial progress,
/// rounded up to whole pixels.
#[must_use]
pub fn head_bar_width(task: &TaskSnapshot, progress: u32) -> u32 {
    let drained = progress * UNIT_BAR_WIDTH / PROGRESS_SCALE;
    (task.processed_remaining * UNIT_BAR_WIDTH).saturating_sub(drained)
}

/// Bar width of a task waiting behind the head of a loader queue.
#[must_use]
pub fn queued_bar_width(task: &TaskSnapshot) -> u32 {
    task.processed_remaining * UNIT_BAR_WIDTH
}
