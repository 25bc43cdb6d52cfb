//! Line-oriented command shell driving the viewer.
//!
//! Reads commands from any `BufRead` (stdin or a script), writes results to
//! any `Write`. A failing command prints its error and the loop carries on.

pub mod command;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::Local;
use tracing::{debug, warn};

use crate::click_log::{ClickRecord, ExportLayout, ImportMode};
use crate::config::ExportConfig;
use crate::error::{ViewerError, ViewerResult};
use crate::pdf::PdfSource;
use crate::viewer::{ClickOutcome, Viewer};

pub use command::{Command, HELP, ZoomAction};

/// Whether the loop should keep reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Shell<'s, S: PdfSource + 's> {
    viewer: Viewer<'s, S>,
    export: ExportConfig,
    prompt: bool,
}

impl<'s, S: PdfSource + 's> Shell<'s, S> {
    pub fn new(viewer: Viewer<'s, S>, export: ExportConfig) -> Self {
        Self {
            viewer,
            export,
            prompt: false,
        }
    }

    /// Print a `> ` prompt before each command. Off for scripts.
    pub fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn viewer_mut(&mut self) -> &mut Viewer<'s, S> {
        &mut self.viewer
    }

    /// Run until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        let mut lines = input.lines();
        loop {
            if self.prompt {
                write!(out, "> ")?;
                out.flush()?;
            }
            let Some(line) = lines.next() else {
                break;
            };
            let line = line?;

            let result = match command::parse(&line) {
                Ok(Some(cmd)) => self.execute(cmd, &mut *out),
                Ok(None) => Ok(Flow::Continue),
                Err(e) => Err(e),
            };

            match result {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => {
                    warn!(line = %line.trim(), error = %e.report(), "Command failed");
                    writeln!(out, "error: {}", e.report())?;
                }
            }
        }
        Ok(())
    }

    fn execute<W: Write>(&mut self, cmd: Command, out: &mut W) -> ViewerResult<Flow> {
        debug!(command = ?cmd, "Executing");
        let precision = self.export.precision;

        match cmd {
            Command::Open { path, password } => {
                let pages = self.viewer.open(&path, password.as_deref())?;
                writeln!(out, "opened {} ({} pages)", path.display(), pages)?;
            }
            Command::Next => {
                let page = self.viewer.next_page()?;
                self.print_page(out, page)?;
            }
            Command::Prev => {
                let page = self.viewer.previous_page()?;
                self.print_page(out, page)?;
            }
            Command::Page(n) => {
                let page = self.viewer.goto_page(n)?;
                self.print_page(out, page)?;
            }
            Command::Zoom(action) => {
                let zoom = match action {
                    ZoomAction::In => self.viewer.zoom_in(),
                    ZoomAction::Out => self.viewer.zoom_out(),
                    ZoomAction::Reset => self.viewer.reset_zoom(),
                };
                writeln!(out, "zoom {:.0}%", zoom * 100.0)?;
            }
            Command::Origin(origin) => {
                self.viewer.set_origin(origin);
                writeln!(out, "origin {}", origin)?;
            }
            Command::Click { x, y } => match self.viewer.click(x, y)? {
                ClickOutcome::Recorded(index) => {
                    writeln!(out, "recorded {}", self.describe(index, precision))?;
                }
                ClickOutcome::Hit(index) => {
                    writeln!(out, "hit {}", self.describe(index, precision))?;
                }
            },
            Command::Drag { number, x, y } => {
                self.viewer.drag(number - 1, x, y)?;
                writeln!(out, "moved {}", self.describe(number - 1, precision))?;
            }
            Command::List { json } => {
                let log = self.viewer.log();
                if json {
                    let records: Vec<&ClickRecord> = log.iter().collect();
                    let text = serde_json::to_string_pretty(&records).map_err(io::Error::from)?;
                    writeln!(out, "{}", text)?;
                } else if log.is_empty() {
                    writeln!(out, "no points recorded")?;
                } else {
                    for (index, record) in log.iter().enumerate() {
                        writeln!(out, "{}", format_record(index, record, precision))?;
                    }
                }
            }
            Command::Show(number) => {
                let log = self.viewer.log();
                let record = log.get(number - 1).ok_or(ViewerError::PointOutOfRange {
                    number,
                    len: log.len(),
                })?;
                writeln!(out, "{}", format_record(number - 1, record, precision))?;
                let (mm_x, mm_y) = record.adjusted_mm();
                let size = record.page_size();
                let a = record.annotation();
                writeln!(
                    out,
                    "  mm ({:.p$}, {:.p$})  page {:.p$} x {:.p$} pt",
                    mm_x,
                    mm_y,
                    size.width,
                    size.height,
                    p = precision
                )?;
                writeln!(
                    out,
                    "  part {}  type {}  align {}",
                    a.part, a.data_type, a.alignment
                )?;
            }
            Command::Edit { number, edit } => {
                self.viewer.edit(number - 1, edit)?;
                writeln!(out, "updated {}", self.describe(number - 1, precision))?;
            }
            Command::Delete(number) => {
                self.viewer.delete(number - 1)?;
                writeln!(out, "deleted point #{}", number)?;
            }
            Command::Reproject => {
                self.viewer.reproject();
                writeln!(
                    out,
                    "reprojected {} points to {}",
                    self.viewer.log().len(),
                    self.viewer.origin()
                )?;
            }
            Command::Clear => {
                let removed = self.viewer.log().len();
                self.viewer.clear_points();
                writeln!(out, "cleared {} points", removed)?;
            }
            Command::Export { path, extended } => {
                if self.viewer.log().is_empty() {
                    writeln!(out, "warning: no click history to export")?;
                    return Ok(Flow::Continue);
                }
                let path = path.unwrap_or_else(|| self.default_export_path());
                let mut options = self.export.options();
                if extended {
                    options.layout = ExportLayout::Extended;
                }
                self.viewer.export(&path, &options)?;
                writeln!(
                    out,
                    "exported {} points to {} ({} layout)",
                    self.viewer.log().len(),
                    path.display(),
                    options.layout
                )?;
            }
            Command::Import { path, append } => {
                let mode = if append {
                    ImportMode::Append
                } else {
                    ImportMode::Replace
                };
                let summary = self.viewer.import(&path, mode)?;
                writeln!(
                    out,
                    "imported {} points from {}",
                    summary.imported,
                    path.display()
                )?;
                for issue in &summary.issues {
                    writeln!(out, "  skipped line {}: {}", issue.line, issue.message)?;
                }
            }
            Command::Render(path) => {
                let (width, height) = self.viewer.render_current(&path)?;
                writeln!(out, "rendered {}x{} to {}", width, height, path.display())?;
            }
            Command::Overlay { csv, output } => {
                let summary =
                    self.viewer
                        .overlay(&csv, &output, self.export.overlay_font_size)?;
                writeln!(
                    out,
                    "wrote {} labels to {}",
                    summary.labels,
                    output.display()
                )?;
                if summary.skipped > 0 {
                    writeln!(
                        out,
                        "  {} points are on pages the document does not have",
                        summary.skipped
                    )?;
                }
                for issue in &summary.issues {
                    writeln!(out, "  skipped line {}: {}", issue.line, issue.message)?;
                }
            }
            Command::Status => self.print_status(out)?,
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    fn default_export_path(&self) -> PathBuf {
        self.export.directory.join(format!(
            "clicks-{}.csv",
            Local::now().format("%Y%m%d-%H%M%S")
        ))
    }

    fn describe(&self, index: usize, precision: usize) -> String {
        match self.viewer.log().get(index) {
            Some(record) => format_record(index, record, precision),
            None => format!("point #{}", index + 1),
        }
    }

    fn print_page<W: Write>(&self, out: &mut W, page: u32) -> ViewerResult<()> {
        let size = self.viewer.page_size()?;
        writeln!(
            out,
            "page {} of {} ({:.2} x {:.2} pt)",
            page,
            self.viewer.status().page_count,
            size.width,
            size.height
        )?;
        Ok(())
    }

    fn print_status<W: Write>(&self, out: &mut W) -> ViewerResult<()> {
        let status = self.viewer.status();
        if !self.viewer.is_open() {
            writeln!(
                out,
                "no document  zoom {:.0}%  origin {}",
                status.zoom * 100.0,
                status.origin
            )?;
            return Ok(());
        }

        let document = status
            .document
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        write!(
            out,
            "{}  page {} of {}",
            document, status.page, status.page_count
        )?;
        if let Some(size) = status.page_size {
            write!(out, " ({:.2} x {:.2} pt)", size.width, size.height)?;
        }
        writeln!(
            out,
            "  zoom {:.0}%  origin {}  points {}",
            status.zoom * 100.0,
            status.origin,
            status.points
        )?;
        Ok(())
    }
}

fn format_record(index: usize, record: &ClickRecord, precision: usize) -> String {
    let (raw_x, raw_y) = record.raw();
    let (adj_x, adj_y) = record.adjusted();
    format!(
        "#{} {}  page {}  {}  raw ({:.p$}, {:.p$})  adjusted ({:.p$}, {:.p$})",
        index + 1,
        record.annotation().name,
        record.page(),
        record.origin(),
        raw_x,
        raw_y,
        adj_x,
        adj_y,
        p = precision
    )
}
