//! The ordered log of picked points for the current document.
//!
//! Records are never edited in place. Every change (a drag, an edit, an
//! origin switch) swaps in a record rebuilt from its raw coordinates, so
//! the adjusted values can never drift from what the transform produces.

pub mod annotation;
pub mod csv_io;
pub mod record;

use std::path::Path;

use tracing::{debug, info};

pub use annotation::{Alignment, DataType, DocumentPart, PointAnnotation};
pub use csv_io::{ExportLayout, ExportOptions, ImportIssue};
pub use record::ClickRecord;

use crate::coords::{OriginPoint, PageSize};
use crate::error::{ExportError, ImportError};

/// How imported records combine with the existing log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Replace,
    Append,
}

/// Outcome of a successful import
#[derive(Debug)]
pub struct ImportSummary {
    pub imported: usize,
    pub issues: Vec<ImportIssue>,
}

/// Changes to apply to an existing point. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointEdit {
    pub raw_x: Option<f64>,
    pub raw_y: Option<f64>,
    pub name: Option<String>,
    pub part: Option<DocumentPart>,
    pub data_type: Option<DataType>,
    pub alignment: Option<Alignment>,
}

impl PointEdit {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Default)]
pub struct ClickLog {
    records: Vec<ClickRecord>,
    /// Default names handed out so far; never reused after a removal
    issued: usize,
}

impl ClickLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform a raw click and append it.
    pub fn record(
        &mut self,
        page: u32,
        origin: OriginPoint,
        raw_x: f64,
        raw_y: f64,
        page_width: f64,
        page_height: f64,
    ) -> &ClickRecord {
        self.issued += 1;
        let record = ClickRecord::compute(
            page,
            origin,
            raw_x,
            raw_y,
            PageSize::new(page_width, page_height),
            PointAnnotation::numbered(self.issued),
        );
        debug!(
            page,
            origin = %origin,
            raw = format!("({:.2},{:.2})", raw_x, raw_y),
            adjusted = format!("({:.2},{:.2})", record.adjusted().0, record.adjusted().1),
            "Recorded click"
        );
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    pub fn clear(&mut self) {
        if !self.records.is_empty() {
            debug!(removed = self.records.len(), "Cleared click log");
        }
        self.records.clear();
        self.issued = 0;
    }

    /// Write the log as basic-layout CSV with two decimals.
    #[allow(dead_code)]
    pub fn export(&self, path: &Path) -> Result<(), ExportError> {
        self.export_with(path, &ExportOptions::default())
    }

    pub fn export_with(&self, path: &Path, options: &ExportOptions) -> Result<(), ExportError> {
        csv_io::write_records(path, &self.records, options)?;
        info!(
            path = %path.display(),
            points = self.records.len(),
            "Exported click log"
        );
        Ok(())
    }

    /// Load records from CSV. On error the log is left untouched.
    pub fn import(
        &mut self,
        path: &Path,
        mode: ImportMode,
        resolve_size: &dyn Fn(u32) -> Option<PageSize>,
    ) -> Result<ImportSummary, ImportError> {
        let numbered_after = match mode {
            ImportMode::Replace => 0,
            ImportMode::Append => self.issued,
        };
        let report = csv_io::read_records(path, numbered_after, resolve_size)?;
        let imported = report.records.len();

        if mode == ImportMode::Replace {
            self.records.clear();
        }
        self.records.extend(report.records);
        self.issued = numbered_after + imported;

        info!(
            path = %path.display(),
            imported,
            skipped = report.issues.len(),
            mode = ?mode,
            "Imported click log"
        );
        Ok(ImportSummary {
            imported,
            issues: report.issues,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ClickRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClickRecord> {
        self.records.iter()
    }

    /// Records on `page` together with their log index
    pub fn records_on_page(&self, page: u32) -> impl Iterator<Item = (usize, &ClickRecord)> {
        self.records
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.page() == page)
    }

    pub fn remove(&mut self, index: usize) -> Option<ClickRecord> {
        (index < self.records.len()).then(|| self.records.remove(index))
    }

    /// Replace the point at `index` with one at a new raw position.
    pub fn move_point(
        &mut self,
        index: usize,
        raw_x: f64,
        raw_y: f64,
        origin: OriginPoint,
    ) -> Option<&ClickRecord> {
        let slot = self.records.get_mut(index)?;
        *slot = slot.moved_to(raw_x, raw_y, origin);
        Some(&*slot)
    }

    pub fn edit(&mut self, index: usize, edit: PointEdit) -> Option<&ClickRecord> {
        let slot = self.records.get_mut(index)?;
        let (raw_x, raw_y) = slot.raw();

        let mut annotation = slot.annotation().clone();
        if let Some(name) = edit.name {
            annotation.name = name;
        }
        if let Some(part) = edit.part {
            annotation.part = part;
        }
        if let Some(data_type) = edit.data_type {
            annotation.data_type = data_type;
        }
        if let Some(alignment) = edit.alignment {
            annotation.alignment = alignment;
        }

        *slot = slot
            .moved_to(
                edit.raw_x.unwrap_or(raw_x),
                edit.raw_y.unwrap_or(raw_y),
                slot.origin(),
            )
            .with_annotation(annotation);
        Some(&*slot)
    }

    /// Re-express every point relative to `origin`.
    pub fn reproject(&mut self, origin: OriginPoint) {
        for slot in &mut self.records {
            *slot = slot.with_origin(origin);
        }
        debug!(origin = %origin, points = self.records.len(), "Reprojected click log");
    }

    /// First point on `page` within `tolerance` of the raw position on both axes
    pub fn find_near(&self, page: u32, raw_x: f64, raw_y: f64, tolerance: f64) -> Option<usize> {
        self.records_on_page(page)
            .find(|(_, r)| {
                let (x, y) = r.raw();
                (x - raw_x).abs() <= tolerance && (y - raw_y).abs() <= tolerance
            })
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::{NamedTempFile, TempDir};

    use super::*;

    fn no_size(_: u32) -> Option<PageSize> {
        None
    }

    fn log_with_two() -> ClickLog {
        let mut log = ClickLog::new();
        log.record(1, OriginPoint::TopLeft, 100.0, 50.0, 400.0, 600.0);
        log.record(3, OriginPoint::BottomRight, 100.0, 50.0, 400.0, 600.0);
        log
    }

    #[test]
    fn test_record_appends_in_order() {
        let log = log_with_two();
        assert_eq!(log.len(), 2);
        assert_eq!(log.get(0).unwrap().adjusted(), (100.0, 50.0));
        assert_eq!(log.get(1).unwrap().adjusted(), (300.0, 550.0));
        assert_eq!(log.get(1).unwrap().annotation().name, "point_2");
    }

    #[test]
    fn test_clear_then_export_writes_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clicks.csv");
        let mut log = log_with_two();

        log.clear();
        assert!(log.is_empty());
        log.export(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Page,Origin,Raw_X,Raw_Y,Adjusted_X,Adjusted_Y\n");
    }

    #[test]
    fn test_failed_export_leaves_log_intact() {
        let dir = TempDir::new().unwrap();
        let log = log_with_two();

        let bad = dir.path().join("no-such-dir").join("clicks.csv");
        let err = log.export(&bad).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
        assert_eq!(log.len(), 2);

        let good = dir.path().join("clicks.csv");
        log.export(&good).unwrap();
        let text = std::fs::read_to_string(&good).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_page_number_passes_through_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clicks.csv");
        let mut log = ClickLog::new();
        log.record(3, OriginPoint::TopLeft, 1.0, 2.0, 400.0, 600.0);

        log.export(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert_eq!(row.split(',').next(), Some("3"));
    }

    #[test]
    fn test_move_point_recomputes_adjusted() {
        let mut log = log_with_two();

        let moved = log.move_point(1, 10.0, 20.0, OriginPoint::BottomLeft).unwrap();

        assert_eq!(moved.raw(), (10.0, 20.0));
        assert_eq!(moved.adjusted(), (10.0, 580.0));
        assert_eq!(moved.page(), 3);
        assert!(log.move_point(5, 0.0, 0.0, OriginPoint::TopLeft).is_none());
    }

    #[test]
    fn test_edit_changes_raw_and_annotation() {
        let mut log = log_with_two();
        let edit = PointEdit {
            raw_x: Some(150.0),
            name: Some("signature".to_string()),
            data_type: Some(DataType::Image),
            ..PointEdit::default()
        };

        let edited = log.edit(1, edit).unwrap();

        assert_eq!(edited.raw(), (150.0, 50.0));
        assert_eq!(edited.adjusted(), (250.0, 550.0));
        assert_eq!(edited.origin(), OriginPoint::BottomRight);
        assert_eq!(edited.annotation().name, "signature");
        assert_eq!(edited.annotation().data_type, DataType::Image);
        assert_eq!(edited.annotation().part, DocumentPart::Heading);
    }

    #[test]
    fn test_default_names_are_not_reused() {
        let mut log = log_with_two();
        log.remove(1);

        log.record(1, OriginPoint::TopLeft, 5.0, 5.0, 400.0, 600.0);

        assert_eq!(log.get(1).unwrap().annotation().name, "point_3");

        log.clear();
        log.record(1, OriginPoint::TopLeft, 5.0, 5.0, 400.0, 600.0);
        assert_eq!(log.get(0).unwrap().annotation().name, "point_1");
    }

    #[test]
    fn test_append_import_continues_numbering() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"1,tl,5,6,5,6\n").unwrap();
        file.flush().unwrap();
        let mut log = log_with_two();

        log.import(file.path(), ImportMode::Append, &no_size)
            .unwrap();
        log.record(1, OriginPoint::TopLeft, 9.0, 9.0, 400.0, 600.0);

        let names: Vec<&str> = log.iter().map(|r| r.annotation().name.as_str()).collect();
        assert_eq!(names, vec!["point_1", "point_2", "point_3", "point_4"]);
    }

    #[test]
    fn test_remove() {
        let mut log = log_with_two();
        let removed = log.remove(0).unwrap();
        assert_eq!(removed.page(), 1);
        assert_eq!(log.len(), 1);
        assert!(log.remove(1).is_none());
    }

    #[test]
    fn test_reproject_all_points() {
        let mut log = log_with_two();

        log.reproject(OriginPoint::TopRight);

        for r in log.iter() {
            assert_eq!(r.origin(), OriginPoint::TopRight);
            assert_eq!(r.adjusted(), (300.0, 50.0));
        }
    }

    #[test]
    fn test_find_near_respects_page_and_tolerance() {
        let log = log_with_two();
        assert_eq!(log.find_near(1, 105.0, 45.0, 7.5), Some(0));
        assert_eq!(log.find_near(1, 110.0, 50.0, 7.5), None);
        assert_eq!(log.find_near(3, 100.0, 50.0, 1.0), Some(1));
        assert_eq!(log.find_near(2, 100.0, 50.0, 100.0), None);
    }

    #[test]
    fn test_import_replace_and_append() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"Page,Origin,Raw_X,Raw_Y,Adjusted_X,Adjusted_Y\n2,Top-Left,5.00,6.00,5.00,6.00\n",
        )
        .unwrap();
        file.flush().unwrap();
        let mut log = log_with_two();

        let summary = log
            .import(file.path(), ImportMode::Append, &no_size)
            .unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(log.len(), 3);

        log.import(file.path(), ImportMode::Replace, &no_size)
            .unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.get(0).unwrap().page(), 2);
    }

    #[test]
    fn test_failed_import_leaves_log_intact() {
        let dir = TempDir::new().unwrap();
        let mut log = log_with_two();

        let result = log.import(&dir.path().join("missing.csv"), ImportMode::Replace, &no_size);

        assert!(result.is_err());
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_exported_log_imports_identically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clicks.csv");
        let log = log_with_two();
        let options = ExportOptions {
            layout: ExportLayout::Extended,
            precision: 3,
        };
        log.export_with(&path, &options).unwrap();

        let mut restored = ClickLog::new();
        restored
            .import(&path, ImportMode::Replace, &no_size)
            .unwrap();

        assert_eq!(
            restored.iter().collect::<Vec<_>>(),
            log.iter().collect::<Vec<_>>()
        );
    }
}
