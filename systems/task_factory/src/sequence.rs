//! Scripted task sequences that override random task generation.

use std::collections::VecDeque;

use loadsplit_core::TaskColor;
use tracing::{debug, warn};

use crate::colors::named_color;

const PAUSE_MARKER: i64 = -1;
const ENTRY_DELIMITER: char = ',';
const COLOR_DELIMITER: char = '/';

/// Size declared by a scripted sequence entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScriptedSize {
    /// Suspends task admission for as long as the entry stays at the head.
    Pause,
    /// Produces a task carrying the given number of work-units.
    Units(u32),
}

/// Single parsed entry of a scripted sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SequenceEntry {
    size: ScriptedSize,
    color: Option<TaskColor>,
}

impl SequenceEntry {
    /// Creates an entry from its parts.
    #[must_use]
    pub const fn new(size: ScriptedSize, color: Option<TaskColor>) -> Self {
        Self { size, color }
    }

    /// Declared size of the entry.
    #[must_use]
    pub const fn size(&self) -> ScriptedSize {
        self.size
    }

    /// Named color resolved for the entry, if any.
    #[must_use]
    pub const fn color(&self) -> Option<TaskColor> {
        self.color
    }
}

/// Cursor over the scripted entries that remain to be consumed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequencePlanner {
    entries: VecDeque<SequenceEntry>,
}

impl SequencePlanner {
    /// Parses a comma-separated list of `size` or `size/colorName` tokens.
    ///
    /// Tokens whose size is not an integer are skipped. Sizes of zero and
    /// negative sizes other than the `-1` pause marker are skipped as well.
    /// Unknown color names resolve to no color.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let entries = text
            .split(ENTRY_DELIMITER)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .filter_map(parse_token)
            .collect();
        Self { entries }
    }

    /// Entry that the next task request will observe.
    #[must_use]
    pub fn peek(&self) -> Option<&SequenceEntry> {
        self.entries.front()
    }

    /// Consumes the head entry.
    pub fn advance(&mut self) -> Option<SequenceEntry> {
        self.entries.pop_front()
    }

    /// Number of entries left.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether every entry has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_token(token: &str) -> Option<SequenceEntry> {
    let (size_text, color_text) = match token.split_once(COLOR_DELIMITER) {
        Some((size, color)) => (size.trim(), Some(color)),
        None => (token, None),
    };

    let Ok(size) = size_text.parse::<i64>() else {
        debug!(token, "skipping sequence token without numeric size");
        return None;
    };

    let size = if size == PAUSE_MARKER {
        ScriptedSize::Pause
    } else {
        match u32::try_from(size) {
            Ok(units) if units > 0 => ScriptedSize::Units(units),
            _ => {
                warn!(token, size, "skipping sequence token with unusable size");
                return None;
            }
        }
    };

    Some(SequenceEntry::new(size, color_text.and_then(named_color)))
}
