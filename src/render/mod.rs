//! Terminal implementations of the rendering collaborators.
//!
//! [`TerminalChartRenderer`] draws each chart as a block of text bars and
//! [`TerminalTranscript`] prints transcript events as they happen. Both are
//! generic over the writer so tests can capture output in memory.

use std::io::{self, Stdout, Write};
use tracing::warn;

use crate::chart::ChartRenderer;
use crate::error::RenderError;
use crate::session::{ChatMessage, MessageBody, PendingIndicator, Sender, TranscriptObserver};
use crate::visualization::{DataPoint, VisualizationSpec};

/// Width of the longest bar, in cells.
const BAR_WIDTH: usize = 30;

/// Chart backend that writes text charts to a writer.
pub struct TerminalChartRenderer<W: Write + Send> {
    out: W,
    next_handle: u64,
}

impl TerminalChartRenderer<Stdout> {
    /// Renderer writing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalChartRenderer<W> {
    /// Renderer writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            next_handle: 0,
        }
    }

    /// The underlying writer.
    pub fn writer(&self) -> &W {
        &self.out
    }

    fn draw(&mut self, spec: &VisualizationSpec) -> io::Result<()> {
        let orientation = if spec.is_horizontal() { ", horizontal" } else { "" };
        writeln!(self.out, "┌ {} ({}{})", spec.title(), spec.kind(), orientation)?;

        let data = spec.data();
        let peak = data
            .datasets
            .iter()
            .flat_map(|s| s.data.iter())
            .filter_map(|p| p.magnitude())
            .map(f64::abs)
            .fold(0.0_f64, f64::max);
        let label_width = data.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

        for series in &data.datasets {
            if let Some(label) = &series.label {
                writeln!(self.out, "│ {}", label)?;
            }
            for (i, point) in series.data.iter().enumerate() {
                match point {
                    DataPoint::Value(value) => {
                        let label = data.labels.get(i).map(String::as_str).unwrap_or("");
                        writeln!(
                            self.out,
                            "│   {:<width$}  {} {}",
                            label,
                            bar(*value, peak),
                            value,
                            width = label_width
                        )?;
                    }
                    DataPoint::Point { x, y } => {
                        writeln!(self.out, "│   ({}, {})", x, y)?;
                    }
                    DataPoint::Raw(value) if value.is_null() => {
                        let label = data.labels.get(i).map(String::as_str).unwrap_or("");
                        writeln!(self.out, "│   {:<width$}  -", label, width = label_width)?;
                    }
                    DataPoint::Raw(value) => {
                        writeln!(self.out, "│   {}", value)?;
                    }
                }
            }
        }
        writeln!(self.out, "└")?;
        self.out.flush()
    }
}

fn bar(value: f64, peak: f64) -> String {
    if peak <= 0.0 {
        return String::new();
    }
    let cells = ((value.abs() / peak) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(cells.max(1))
}

impl<W: Write + Send> ChartRenderer for TerminalChartRenderer<W> {
    type Handle = u64;

    fn create(&mut self, spec: &VisualizationSpec) -> Result<u64, RenderError> {
        self.draw(spec)?;
        self.next_handle += 1;
        Ok(self.next_handle)
    }

    fn destroy(&mut self, _handle: u64) {
        // Text already on screen stays; nothing to release
    }
}

/// Prints transcript events to a writer.
pub struct TerminalTranscript<W: Write + Send> {
    out: W,
}

impl TerminalTranscript<Stdout> {
    /// Printer writing to standard output.
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write + Send> TerminalTranscript<W> {
    /// Printer writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn print(&mut self, message: &ChatMessage) -> io::Result<()> {
        let prefix = match message.sender() {
            Sender::User => "You",
            Sender::Assistant => "Assistant",
        };
        match message.body() {
            MessageBody::Paragraphs(paragraphs) => {
                writeln!(self.out, "{}:", prefix)?;
                for paragraph in paragraphs {
                    writeln!(self.out, "  {}", paragraph)?;
                }
            }
            MessageBody::Markup(markup) => {
                writeln!(self.out, "{}:", prefix)?;
                writeln!(self.out, "{}", markup)?;
            }
        }
        self.out.flush()
    }
}

impl<W: Write + Send> TerminalTranscript<W> {
    fn print_indicator(&mut self) -> io::Result<()> {
        writeln!(self.out, "Assistant is typing...")?;
        self.out.flush()
    }
}

fn report(result: io::Result<()>, what: &str) {
    if let Err(e) = result {
        warn!(error = %e, what, "Failed to write to terminal");
    }
}

impl<W: Write + Send> TranscriptObserver for TerminalTranscript<W> {
    fn message_appended(&mut self, message: &ChatMessage) {
        report(self.print(message), "message");
    }

    fn indicator_shown(&mut self, _indicator: &PendingIndicator) {
        report(self.print_indicator(), "pending indicator");
    }
}
