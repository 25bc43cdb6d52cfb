//! Viewer state: the open document, the current page, zoom and origin, and
//! the click log for the document.
//!
//! Canvas coordinates are pixels on the page raster at the current zoom.
//! Everything stored in the log is in page points.

pub mod markers;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::click_log::{
    ClickLog, ExportOptions, ImportIssue, ImportMode, ImportSummary, PointEdit, csv_io,
};
use crate::config::ViewerConfig;
use crate::coords::{OriginPoint, PageSize, adjust, canvas_to_raw};
use crate::error::{ViewerError, ViewerResult};
use crate::pdf::{Document, PageLabel, PdfSource};

/// What a click on the canvas did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A new point was appended at this log index
    Recorded(usize),
    /// The click landed on the marker of an existing point
    Hit(usize),
}

/// Snapshot of the viewer for display
#[derive(Debug, Clone, Serialize)]
pub struct ViewerStatus {
    pub document: Option<PathBuf>,
    /// 1-based, 0 when no document is open
    pub page: u32,
    pub page_count: u32,
    pub page_size: Option<PageSize>,
    pub zoom: f64,
    pub origin: OriginPoint,
    pub points: usize,
}

/// Outcome of writing an overlay PDF
#[derive(Debug)]
pub struct OverlaySummary {
    pub labels: usize,
    /// Rows whose page the document does not have
    pub skipped: usize,
    pub issues: Vec<ImportIssue>,
}

struct LoadedDocument<D> {
    path: PathBuf,
    /// Kept so overlays can reopen the file
    password: Option<String>,
    document: D,
    page_count: u32,
    /// Size of every page, read once at open time
    page_sizes: Vec<PageSize>,
}

pub struct Viewer<'s, S: PdfSource + 's> {
    source: &'s S,
    loaded: Option<LoadedDocument<S::Document<'s>>>,
    page_index: u32,
    zoom: f64,
    origin: OriginPoint,
    log: ClickLog,
    settings: ViewerConfig,
}

impl<'s, S: PdfSource + 's> Viewer<'s, S> {
    pub fn new(source: &'s S, settings: ViewerConfig) -> Self {
        Self {
            source,
            loaded: None,
            page_index: 0,
            zoom: settings.initial_zoom,
            origin: settings.default_origin,
            log: ClickLog::new(),
            settings,
        }
    }

    /// Open a document, replacing the current one and clearing the log.
    ///
    /// On failure the viewer is left exactly as it was.
    pub fn open(&mut self, path: &Path, password: Option<&str>) -> ViewerResult<u32> {
        let document = self.source.open(path, password)?;
        let page_count = document.page_count();
        let page_sizes = (0..page_count)
            .map(|i| document.page_size(i))
            .collect::<Result<Vec<_>, _>>()?;

        self.loaded = Some(LoadedDocument {
            path: path.to_path_buf(),
            password: password.map(str::to_string),
            document,
            page_count,
            page_sizes,
        });
        self.page_index = 0;
        self.log.clear();

        info!(path = %path.display(), page_count, "Document opened");
        Ok(page_count)
    }

    pub fn is_open(&self) -> bool {
        self.loaded.is_some()
    }

    fn loaded(&self) -> ViewerResult<&LoadedDocument<S::Document<'s>>> {
        self.loaded.as_ref().ok_or(ViewerError::NoDocument)
    }

    /// Size of the current page in points
    pub fn page_size(&self) -> ViewerResult<PageSize> {
        let loaded = self.loaded()?;
        loaded
            .page_sizes
            .get(self.page_index as usize)
            .copied()
            .ok_or(ViewerError::PageOutOfRange {
                page: self.page_number(),
                page_count: loaded.page_count,
            })
    }

    /// 1-based number of the current page
    pub fn page_number(&self) -> u32 {
        self.page_index + 1
    }

    pub fn next_page(&mut self) -> ViewerResult<u32> {
        let page_count = self.loaded()?.page_count;
        if self.page_index + 1 < page_count {
            self.page_index += 1;
        }
        Ok(self.page_number())
    }

    pub fn previous_page(&mut self) -> ViewerResult<u32> {
        self.loaded()?;
        self.page_index = self.page_index.saturating_sub(1);
        Ok(self.page_number())
    }

    /// Jump to a 1-based page number.
    pub fn goto_page(&mut self, page: u32) -> ViewerResult<u32> {
        let page_count = self.loaded()?.page_count;
        if page == 0 || page > page_count {
            return Err(ViewerError::PageOutOfRange { page, page_count });
        }
        self.page_index = page - 1;
        Ok(page)
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.set_zoom(self.zoom * self.settings.zoom_step)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.set_zoom(self.zoom / self.settings.zoom_step)
    }

    pub fn reset_zoom(&mut self) -> f64 {
        self.set_zoom(1.0)
    }

    fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.zoom = zoom.clamp(self.settings.min_zoom, self.settings.max_zoom);
        debug!(zoom = self.zoom, "Zoom changed");
        self.zoom
    }

    pub fn origin(&self) -> OriginPoint {
        self.origin
    }

    /// Select the origin for subsequent clicks. Existing points keep theirs.
    pub fn set_origin(&mut self, origin: OriginPoint) {
        self.origin = origin;
    }

    pub fn log(&self) -> &ClickLog {
        &self.log
    }

    /// Handle a click at canvas pixel position (x, y).
    pub fn click(&mut self, canvas_x: f64, canvas_y: f64) -> ViewerResult<ClickOutcome> {
        let size = self.page_size()?;
        let (raw_x, raw_y) = canvas_to_raw(canvas_x, canvas_y, self.zoom);

        let tolerance = self.settings.hit_tolerance_px / self.zoom;
        if let Some(index) = self
            .log
            .find_near(self.page_number(), raw_x, raw_y, tolerance)
        {
            debug!(point = index + 1, "Click hit existing marker");
            return Ok(ClickOutcome::Hit(index));
        }

        if raw_x < 0.0 || raw_y < 0.0 || raw_x > size.width || raw_y > size.height {
            warn!(
                raw = format!("({:.2},{:.2})", raw_x, raw_y),
                page_size = format!("{:.2}x{:.2}", size.width, size.height),
                "Click lies outside the page; recording unclamped"
            );
        }

        self.log.record(
            self.page_number(),
            self.origin,
            raw_x,
            raw_y,
            size.width,
            size.height,
        );
        Ok(ClickOutcome::Recorded(self.log.len() - 1))
    }

    /// Move a point of the current page to a canvas position, measuring it
    /// from the current origin. Points on other pages cannot be dragged.
    pub fn drag(&mut self, index: usize, canvas_x: f64, canvas_y: f64) -> ViewerResult<()> {
        self.loaded()?;
        let current = self.page_number();
        let record = self.log.get(index).ok_or(ViewerError::PointOutOfRange {
            number: index + 1,
            len: self.log.len(),
        })?;
        if record.page() != current {
            return Err(ViewerError::PointNotOnPage {
                number: index + 1,
                page: record.page(),
                current,
            });
        }

        let (raw_x, raw_y) = canvas_to_raw(canvas_x, canvas_y, self.zoom);
        self.log.move_point(index, raw_x, raw_y, self.origin);
        Ok(())
    }

    pub fn edit(&mut self, index: usize, edit: PointEdit) -> ViewerResult<()> {
        let len = self.log.len();
        self.log
            .edit(index, edit)
            .ok_or(ViewerError::PointOutOfRange {
                number: index + 1,
                len,
            })?;
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> ViewerResult<()> {
        let len = self.log.len();
        self.log
            .remove(index)
            .ok_or(ViewerError::PointOutOfRange {
                number: index + 1,
                len,
            })?;
        Ok(())
    }

    /// Re-express every recorded point relative to the current origin.
    pub fn reproject(&mut self) {
        self.log.reproject(self.origin);
    }

    pub fn clear_points(&mut self) {
        self.log.clear();
    }

    pub fn export(&self, path: &Path, options: &ExportOptions) -> ViewerResult<()> {
        self.log.export_with(path, options)?;
        Ok(())
    }

    /// Import points, taking missing page sizes from the open document.
    pub fn import(&mut self, path: &Path, mode: ImportMode) -> ViewerResult<ImportSummary> {
        let sizes: Vec<PageSize> = self
            .loaded
            .as_ref()
            .map(|l| l.page_sizes.clone())
            .unwrap_or_default();
        let resolve = move |page: u32| {
            page.checked_sub(1)
                .and_then(|i| sizes.get(i as usize).copied())
        };
        Ok(self.log.import(path, mode, &resolve)?)
    }

    /// Write a copy of the open document with the name of every point in
    /// `csv` drawn at its position.
    ///
    /// Labels are placed by raw position, so the origin each row was
    /// recorded with does not matter.
    pub fn overlay(
        &self,
        csv: &Path,
        output: &Path,
        font_size: f64,
    ) -> ViewerResult<OverlaySummary> {
        let loaded = self.loaded()?;
        let resolve = |page: u32| {
            page.checked_sub(1)
                .and_then(|i| loaded.page_sizes.get(i as usize).copied())
        };
        let report = csv_io::read_records(csv, 0, &resolve)?;

        let mut labels = Vec::with_capacity(report.records.len());
        let mut skipped = 0;
        for record in &report.records {
            let page_index = record.page().checked_sub(1);
            let Some(size) = page_index.and_then(|i| loaded.page_sizes.get(i as usize)) else {
                warn!(
                    page = record.page(),
                    page_count = loaded.page_count,
                    name = %record.annotation().name,
                    "Overlay row is for a page the document does not have"
                );
                skipped += 1;
                continue;
            };
            let (raw_x, raw_y) = record.raw();
            let (x, y) = adjust(raw_x, raw_y, size.width, size.height, OriginPoint::BottomLeft);
            labels.push(PageLabel {
                page_index: record.page() - 1,
                x,
                y,
                text: record.annotation().name.clone(),
            });
        }

        self.source.write_overlay(
            &loaded.path,
            loaded.password.as_deref(),
            &labels,
            font_size,
            output,
        )?;

        info!(
            csv = %csv.display(),
            output = %output.display(),
            labels = labels.len(),
            skipped,
            "Wrote overlay"
        );
        Ok(OverlaySummary {
            labels: labels.len(),
            skipped,
            issues: report.issues,
        })
    }

    /// Render the current page with markers for its points and save it.
    pub fn render_current(&self, path: &Path) -> ViewerResult<(u32, u32)> {
        let loaded = self.loaded()?;
        let mut page = loaded.document.render(self.page_index, self.zoom)?;

        let positions: Vec<(usize, f64, f64)> = self
            .log
            .records_on_page(self.page_number())
            .map(|(index, r)| {
                let (x, y) = r.raw();
                (index + 1, x, y)
            })
            .collect();
        markers::draw_markers(
            &mut page.image,
            &positions,
            self.zoom,
            self.settings.marker_radius_px,
        );

        page.image.save(path).map_err(|source| ViewerError::Render {
            path: path.to_path_buf(),
            source,
        })?;

        info!(
            path = %path.display(),
            page = self.page_number(),
            markers = positions.len(),
            "Rendered page"
        );
        Ok((page.width, page.height))
    }

    pub fn status(&self) -> ViewerStatus {
        let (document, page, page_count, page_size) = match &self.loaded {
            Some(l) => (
                Some(l.path.clone()),
                self.page_number(),
                l.page_count,
                l.page_sizes.get(self.page_index as usize).copied(),
            ),
            None => (None, 0, 0, None),
        };
        ViewerStatus {
            document,
            page,
            page_count,
            page_size,
            zoom: self.zoom,
            origin: self.origin,
            points: self.log.len(),
        }
    }
}
