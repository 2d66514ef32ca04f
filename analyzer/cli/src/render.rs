//! Terminal rendering of analyzer snapshots
//!
//! The renderer is fed every snapshot the analyzer publishes and writes only
//! what is new: the unseen tail of the reasoning, and a result block when the
//! results revision moves. Feeding the same snapshot twice prints nothing.

use std::io::{self, Write};

use analyzer_core::{Polarity, SentimentRecord, Snapshot};
use crossterm::style::{Color, Stylize};

/// Cells in the confidence bar
const BAR_WIDTH: usize = 20;

/// Indent for the reasoning paragraph under each card
const INDENT: &str = "    ";

/// Incremental snapshot renderer
#[derive(Debug)]
pub struct Renderer {
    /// Emit ANSI colors
    color: bool,
    /// Column limit for wrapped reasoning
    width: usize,
    /// Whether the reasoning header for the current turn is out
    turn_open: bool,
    /// Bytes of the current turn's reasoning already written
    reasoning_written: usize,
    /// Last results revision written
    rendered_revision: u64,
}

impl Renderer {
    pub fn new(color: bool, width: usize) -> Self {
        Self {
            color,
            width: width.max(INDENT.len() + 20),
            turn_open: false,
            reasoning_written: 0,
            rendered_revision: 0,
        }
    }

    /// Write whatever `snapshot` adds to what is already on screen
    pub fn render(&mut self, snapshot: &Snapshot, out: &mut impl Write) -> io::Result<()> {
        if !snapshot.accepts_input() {
            self.render_reasoning(snapshot, out)?;
        } else if self.turn_open {
            writeln!(out)?;
            writeln!(out)?;
            self.turn_open = false;
            self.reasoning_written = 0;
        }

        if snapshot.results_revision != self.rendered_revision {
            self.render_results(&snapshot.records, out)?;
            self.rendered_revision = snapshot.results_revision;
        }

        out.flush()
    }

    fn render_reasoning(&mut self, snapshot: &Snapshot, out: &mut impl Write) -> io::Result<()> {
        if snapshot.reasoning.is_empty() {
            return Ok(());
        }
        if !self.turn_open {
            write!(out, "{}", self.paint("Reasoning", Color::Cyan, true))?;
            if snapshot.thinking {
                write!(out, " {}", self.paint("thinking...", Color::DarkGrey, false))?;
            }
            writeln!(out)?;
            self.turn_open = true;
            self.reasoning_written = 0;
        }

        // A shorter reasoning means a new turn started
        let Some(tail) = snapshot.reasoning.get(self.reasoning_written..) else {
            self.reasoning_written = 0;
            return Ok(());
        };
        if !tail.is_empty() {
            write!(out, "{tail}")?;
            self.reasoning_written = snapshot.reasoning.len();
        }
        Ok(())
    }

    fn render_results(&self, records: &[SentimentRecord], out: &mut impl Write) -> io::Result<()> {
        let header = format!("Results · {}", detected_label(records.len()));
        writeln!(out, "{}", self.paint(&header, Color::White, true))?;
        writeln!(out)?;

        for record in records {
            self.render_card(record, out)?;
        }
        Ok(())
    }

    fn render_card(&self, record: &SentimentRecord, out: &mut impl Write) -> io::Result<()> {
        let accent = polarity_color(record.polarity());
        let percent = record.confidence_percent();

        writeln!(
            out,
            "  {} · {}  {} {:>3}%",
            self.paint(record.polarity().label(), accent, true),
            record.emotion(),
            self.paint(&confidence_bar(percent), accent, false),
            percent,
        )?;

        let wrap_width = self.width.saturating_sub(INDENT.len());
        for line in textwrap::wrap(record.reasoning(), wrap_width) {
            writeln!(out, "{INDENT}{line}")?;
        }
        writeln!(out)
    }

    fn paint(&self, text: &str, color: Color, bold: bool) -> String {
        if !self.color {
            return text.to_string();
        }
        let styled = text.with(color);
        if bold {
            styled.bold().to_string()
        } else {
            styled.to_string()
        }
    }
}

/// "1 sentiment detected", "3 sentiments detected"
pub fn detected_label(count: usize) -> String {
    let plural = if count == 1 { "" } else { "s" };
    format!("{count} sentiment{plural} detected")
}

/// Filled/empty bar for a percentage
pub fn confidence_bar(percent: u8) -> String {
    let filled = (usize::from(percent.min(100)) * BAR_WIDTH + 50) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn polarity_color(polarity: Polarity) -> Color {
    match polarity {
        Polarity::Positive => Color::Green,
        Polarity::Negative => Color::Red,
        Polarity::Neutral => Color::Yellow,
    }
}

/// Records as pretty JSON with their wire field names
pub fn records_json(records: &[SentimentRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}
