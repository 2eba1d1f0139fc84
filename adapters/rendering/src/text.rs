use std::{fmt::Write as _, io::Write};

use anyhow::{Context, Result as AnyResult};
use loadsplit_core::{FrameView, LoaderSnapshot, SplitterSnapshot};

use crate::{head_bar_width, queued_bar_width, splitter_bar_width, Renderer};

const PIXELS_PER_CHARACTER: u32 = 4;
const TASK_GLYPHS: [char; 2] = ['#', '='];

/// Renders frames as plain text, one line per loader.
#[derive(Debug)]
pub struct TextRenderer<W> {
    out: W,
}

impl<W: Write> TextRenderer<W> {
    /// Creates a renderer writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn present(&mut self, view: &FrameView) -> AnyResult<()> {
        let text = render_frame(view);
        self.out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush())
            .context("failed to write text frame")
    }
}

/// Formats a frame as text without writing it anywhere.
#[must_use]
pub fn render_frame(view: &FrameView) -> String {
    let mut text = String::new();
    let metrics = &view.metrics;
    let _ = writeln!(
        text,
        "tick {} | latency {:.2} | throughput {:.3} units/tick | completed {}",
        view.ticks,
        metrics.mean_latency,
        metrics.mean_throughput_units(),
        metrics.completed_tasks,
    );
    let _ = writeln!(text, "splitter  {}", splitter_line(&view.splitter));
    for loader in &view.loaders {
        let _ = writeln!(
            text,
            "loader {} ({}) |{}",
            loader.id,
            loader.queued,
            loader_bars(loader)
        );
    }
    text
}

fn splitter_line(splitter: &SplitterSnapshot) -> String {
    match splitter.task {
        Some(task) => format!(
            "{} {} [{}]",
            task.id,
            task.color,
            bar(splitter_bar_width(&task), TASK_GLYPHS[0])
        ),
        None if splitter.paused => "(paused)".to_owned(),
        None => "(idle)".to_owned(),
    }
}

fn loader_bars(loader: &LoaderSnapshot) -> String {
    let mut line = String::new();
    for (position, task) in loader.tasks.iter().enumerate() {
        let width = if position == 0 {
            head_bar_width(task, loader.progress)
        } else {
            queued_bar_width(task)
        };
        line.push_str(&bar(width, TASK_GLYPHS[position % TASK_GLYPHS.len()]));
        line.push('|');
    }
    line
}

fn bar(width: u32, glyph: char) -> String {
    let characters = width.div_ceil(PIXELS_PER_CHARACTER) as usize;
    std::iter::repeat(glyph).take(characters).collect()
}
