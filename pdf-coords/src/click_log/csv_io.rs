//! CSV encoding of the click log.
//!
//! Two layouts are written: the six-column basic layout and an extended
//! layout that also carries the annotation and the page size. Reading is
//! header-driven so files from either layout (and older files that used
//! `X`/`Y` for the adjusted columns) load the same way.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, warn};

use super::annotation::{Alignment, DataType, DocumentPart, PointAnnotation};
use super::record::ClickRecord;
use crate::coords::{OriginPoint, PageSize};
use crate::error::{ExportError, ImportError};

pub const BASIC_HEADER: [&str; 6] = ["Page", "Origin", "Raw_X", "Raw_Y", "Adjusted_X", "Adjusted_Y"];

pub const EXTENDED_COLUMNS: [&str; 8] = [
    "Name",
    "Part",
    "MM_X",
    "MM_Y",
    "Data_Type",
    "Align",
    "Page_Width",
    "Page_Height",
];

/// Column set written on export
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ExportLayout {
    #[default]
    Basic,
    Extended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub layout: ExportLayout,
    /// Digits after the decimal point for every numeric column
    pub precision: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            layout: ExportLayout::Basic,
            precision: 2,
        }
    }
}

/// A row that was skipped during import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportIssue {
    /// 1-based line number in the source file
    pub line: u64,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub records: Vec<ClickRecord>,
    pub issues: Vec<ImportIssue>,
}

fn header_row(layout: ExportLayout) -> Vec<&'static str> {
    let mut header = BASIC_HEADER.to_vec();
    if layout == ExportLayout::Extended {
        header.extend_from_slice(&EXTENDED_COLUMNS);
    }
    header
}

fn data_row(record: &ClickRecord, options: &ExportOptions) -> Vec<String> {
    let p = options.precision;
    let (raw_x, raw_y) = record.raw();
    let (adj_x, adj_y) = record.adjusted();

    let mut row = vec![
        record.page().to_string(),
        record.origin().to_string(),
        format!("{:.*}", p, raw_x),
        format!("{:.*}", p, raw_y),
        format!("{:.*}", p, adj_x),
        format!("{:.*}", p, adj_y),
    ];

    if options.layout == ExportLayout::Extended {
        let annotation = record.annotation();
        let (mm_x, mm_y) = record.adjusted_mm();
        let size = record.page_size();
        row.extend([
            annotation.name.clone(),
            annotation.part.to_string(),
            format!("{:.*}", p, mm_x),
            format!("{:.*}", p, mm_y),
            annotation.data_type.to_string(),
            annotation.alignment.to_string(),
            format!("{:.*}", p, size.width),
            format!("{:.*}", p, size.height),
        ]);
    }

    row
}

/// Write `records` to `path`, replacing any existing file.
pub fn write_records<'a>(
    path: &Path,
    records: impl IntoIterator<Item = &'a ClickRecord>,
    options: &ExportOptions,
) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = csv::Writer::from_writer(file);
    let csv_err = |source: csv::Error| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    writer
        .write_record(header_row(options.layout))
        .map_err(csv_err)?;

    let mut rows = 0usize;
    for record in records {
        writer
            .write_record(data_row(record, options))
            .map_err(csv_err)?;
        rows += 1;
    }

    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), rows, layout = %options.layout, "Wrote click log CSV");
    Ok(())
}

/// Where each known field lives in a row
#[derive(Debug, Default)]
struct ColumnMap {
    width: usize,
    page: usize,
    origin: usize,
    raw_x: usize,
    raw_y: usize,
    adjusted_x: usize,
    adjusted_y: usize,
    name: Option<usize>,
    part: Option<usize>,
    data_type: Option<usize>,
    alignment: Option<usize>,
    page_width: Option<usize>,
    page_height: Option<usize>,
}

impl ColumnMap {
    /// Positional layout for files without a header row
    fn positional(width: usize) -> Option<Self> {
        let basic = Self {
            width,
            page: 0,
            origin: 1,
            raw_x: 2,
            raw_y: 3,
            adjusted_x: 4,
            adjusted_y: 5,
            ..Self::default()
        };
        match width {
            6 => Some(basic),
            14 => Some(Self {
                name: Some(6),
                part: Some(7),
                data_type: Some(10),
                alignment: Some(11),
                page_width: Some(12),
                page_height: Some(13),
                ..basic
            }),
            _ => None,
        }
    }

    fn from_header(header: &csv::StringRecord) -> Result<Self, String> {
        let index: HashMap<String, usize> = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_ascii_lowercase(), i))
            .collect();
        let find = |names: &[&str]| names.iter().find_map(|n| index.get(*n).copied());
        let require = |names: &[&str]| {
            find(names).ok_or_else(|| format!("header is missing the {} column", names[0]))
        };

        Ok(Self {
            width: header.len(),
            page: require(&["page"])?,
            origin: require(&["origin"])?,
            raw_x: require(&["raw_x"])?,
            raw_y: require(&["raw_y"])?,
            adjusted_x: require(&["adjusted_x", "x"])?,
            adjusted_y: require(&["adjusted_y", "y"])?,
            name: find(&["name"]),
            part: find(&["part"]),
            data_type: find(&["data_type"]),
            alignment: find(&["align", "alignment"]),
            page_width: find(&["page_width"]),
            page_height: find(&["page_height"]),
        })
    }
}

fn is_header(row: &csv::StringRecord) -> bool {
    row.iter().any(|field| field.trim().eq_ignore_ascii_case("page"))
}

fn parse_field<T: FromStr>(row: &csv::StringRecord, idx: usize, column: &str) -> Result<T, String> {
    let raw = row.get(idx).unwrap_or("").trim();
    raw.parse::<T>()
        .map_err(|_| format!("invalid {} value '{}'", column, raw))
}

/// A coordinate or extent; `NaN` and infinities are not positions.
fn parse_number(row: &csv::StringRecord, idx: usize, column: &str) -> Result<f64, String> {
    let value: f64 = parse_field(row, idx, column)?;
    if !value.is_finite() {
        return Err(format!("invalid {} value '{}'", column, value));
    }
    Ok(value)
}

fn parse_optional<T: FromStr>(
    row: &csv::StringRecord,
    idx: Option<usize>,
    column: &str,
) -> Result<Option<T>, String> {
    match idx {
        Some(i) => parse_field(row, i, column).map(Some),
        None => Ok(None),
    }
}

fn parse_optional_number(
    row: &csv::StringRecord,
    idx: Option<usize>,
    column: &str,
) -> Result<Option<f64>, String> {
    match idx {
        Some(i) => parse_number(row, i, column).map(Some),
        None => Ok(None),
    }
}

/// Page size for an imported row with no size columns and no open document.
///
/// A mirrored axis satisfies `raw + adjusted = extent`. An unmirrored axis
/// never reads its extent, so any value works; the raw coordinate is used.
fn infer_page_size(origin: OriginPoint, raw: (f64, f64), adjusted: (f64, f64)) -> PageSize {
    let width = if origin.flips_x() {
        raw.0 + adjusted.0
    } else {
        raw.0
    };
    let height = if origin.flips_y() {
        raw.1 + adjusted.1
    } else {
        raw.1
    };
    PageSize::new(width, height)
}

fn parse_row(
    row: &csv::StringRecord,
    columns: &ColumnMap,
    number: usize,
    resolve_size: &dyn Fn(u32) -> Option<PageSize>,
) -> Result<ClickRecord, String> {
    if row.len() != columns.width {
        return Err(format!(
            "expected {} columns, got {}",
            columns.width,
            row.len()
        ));
    }

    let page: u32 = parse_field(row, columns.page, "Page")?;
    let origin_value = row.get(columns.origin).unwrap_or("").trim();
    let origin = OriginPoint::from_str(origin_value)
        .map_err(|_| format!("invalid origin '{}'", origin_value))?;
    let raw_x = parse_number(row, columns.raw_x, "Raw_X")?;
    let raw_y = parse_number(row, columns.raw_y, "Raw_Y")?;
    let adjusted_x = parse_number(row, columns.adjusted_x, "Adjusted_X")?;
    let adjusted_y = parse_number(row, columns.adjusted_y, "Adjusted_Y")?;

    let mut annotation = PointAnnotation::numbered(number);
    if let Some(i) = columns.name {
        let name = row.get(i).unwrap_or("").trim();
        if !name.is_empty() {
            annotation.name = name.to_string();
        }
    }
    if let Some(part) = parse_optional::<DocumentPart>(row, columns.part, "Part")? {
        annotation.part = part;
    }
    if let Some(data_type) = parse_optional::<DataType>(row, columns.data_type, "Data_Type")? {
        annotation.data_type = data_type;
    }
    if let Some(alignment) = parse_optional::<Alignment>(row, columns.alignment, "Align")? {
        annotation.alignment = alignment;
    }

    let stored_size = match (
        parse_optional_number(row, columns.page_width, "Page_Width")?,
        parse_optional_number(row, columns.page_height, "Page_Height")?,
    ) {
        (Some(w), Some(h)) => Some(PageSize::new(w, h)),
        _ => None,
    };
    let page_size = stored_size
        .or_else(|| resolve_size(page))
        .unwrap_or_else(|| infer_page_size(origin, (raw_x, raw_y), (adjusted_x, adjusted_y)));

    let record = ClickRecord::compute(page, origin, raw_x, raw_y, page_size, annotation);
    let (rx, ry) = record.adjusted();
    if (rx - adjusted_x).abs() > 0.01 || (ry - adjusted_y).abs() > 0.01 {
        debug!(
            page,
            file = format!("({:.2},{:.2})", adjusted_x, adjusted_y),
            recomputed = format!("({:.2},{:.2})", rx, ry),
            "Imported adjusted coordinates differ from recomputed values"
        );
    }

    Ok(record)
}

/// Read click records from a CSV file.
///
/// Rows without a name are named `point_<n>`, counting on from
/// `numbered_after`. `resolve_size` supplies the page size for rows that do
/// not carry one, typically from the currently open document.
pub fn read_records(
    path: &Path,
    numbered_after: usize,
    resolve_size: &dyn Fn(u32) -> Option<PageSize>,
) -> Result<ImportReport, ImportError> {
    let file = File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut report = ImportReport::default();
    let mut columns: Option<ColumnMap> = None;

    for (i, result) in reader.records().enumerate() {
        let row = result.map_err(|source| ImportError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let line = row.position().map(|p| p.line()).unwrap_or(i as u64 + 1);

        if i == 0 && is_header(&row) {
            match ColumnMap::from_header(&row) {
                Ok(map) => columns = Some(map),
                Err(message) => {
                    warn!(path = %path.display(), %message, "Unusable CSV header");
                    report.issues.push(ImportIssue { line, message });
                    break;
                }
            }
            continue;
        }

        if row.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        if columns.is_none() {
            columns = ColumnMap::positional(row.len());
        }
        let Some(map) = columns.as_ref() else {
            report.issues.push(ImportIssue {
                line,
                message: format!("expected 6 or 14 columns, got {}", row.len()),
            });
            continue;
        };

        let number = numbered_after + report.records.len() + 1;
        match parse_row(&row, map, number, resolve_size) {
            Ok(record) => report.records.push(record),
            Err(message) => report.issues.push(ImportIssue { line, message }),
        }
    }

    if report.records.is_empty() {
        return Err(ImportError::Empty {
            path: path.to_path_buf(),
        });
    }

    debug!(
        path = %path.display(),
        records = report.records.len(),
        skipped = report.issues.len(),
        "Read click log CSV"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::{NamedTempFile, TempDir};

    use super::*;

    fn no_size(_: u32) -> Option<PageSize> {
        None
    }

    fn record(page: u32, origin: OriginPoint, x: f64, y: f64) -> ClickRecord {
        ClickRecord::compute(
            page,
            origin,
            x,
            y,
            PageSize::new(400.0, 600.0),
            PointAnnotation::numbered(1),
        )
    }

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_basic_layout_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let records = [record(3, OriginPoint::BottomLeft, 100.0, 50.0)];

        write_records(&path, &records, &ExportOptions::default()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "Page,Origin,Raw_X,Raw_Y,Adjusted_X,Adjusted_Y\n\
             3,Bottom-Left,100.00,50.00,100.00,550.00\n"
        );
    }

    #[test]
    fn test_extended_layout_quotes_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let mut annotation = PointAnnotation::numbered(1);
        annotation.name = "total, incl. tax".to_string();
        annotation.data_type = DataType::Numeric2;
        let records = [record(1, OriginPoint::TopLeft, 72.0, 72.0).with_annotation(annotation)];
        let options = ExportOptions {
            layout: ExportLayout::Extended,
            precision: 1,
        };

        write_records(&path, &records, &options).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Page,Origin,Raw_X,Raw_Y,Adjusted_X,Adjusted_Y,Name,Part,MM_X,MM_Y,Data_Type,Align,Page_Width,Page_Height"
        );
        assert_eq!(
            lines[1],
            "1,Top-Left,72.0,72.0,72.0,72.0,\"total, incl. tax\",Heading,25.4,25.4,Numeric 2 digits,Left,400.0,600.0"
        );
    }

    #[test]
    fn test_extended_export_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let mut annotation = PointAnnotation::numbered(7);
        annotation.part = DocumentPart::Summary;
        annotation.alignment = Alignment::Right;
        let records = vec![
            record(1, OriginPoint::TopRight, 10.0, 20.0).with_annotation(annotation),
            record(2, OriginPoint::BottomRight, 390.0, 580.0),
        ];
        let options = ExportOptions {
            layout: ExportLayout::Extended,
            precision: 2,
        };
        write_records(&path, &records, &options).unwrap();

        let report = read_records(&path, 0, &no_size).unwrap();

        assert!(report.issues.is_empty());
        assert_eq!(report.records, records);
    }

    #[test]
    fn test_basic_import_uses_resolved_size() {
        let file = csv_file(
            "Page,Origin,Raw_X,Raw_Y,Adjusted_X,Adjusted_Y\n\
             1,Top-Left,100.00,50.00,100.00,50.00\n",
        );

        let report = read_records(file.path(), 0, &|_| Some(PageSize::new(400.0, 600.0))).unwrap();

        let r = &report.records[0];
        assert_eq!(r.page_size(), PageSize::new(400.0, 600.0));
        assert_eq!(r.with_origin(OriginPoint::BottomRight).adjusted(), (300.0, 550.0));
    }

    #[test]
    fn test_basic_import_infers_mirrored_axes() {
        let file = csv_file(
            "Page,Origin,Raw_X,Raw_Y,Adjusted_X,Adjusted_Y\n\
             1,Bottom-Right,100.00,50.00,300.00,550.00\n\
             1,Bottom-Left,100.00,50.00,100.00,550.00\n",
        );

        let report = read_records(file.path(), 0, &no_size).unwrap();

        assert_eq!(report.records[0].page_size(), PageSize::new(400.0, 600.0));
        assert_eq!(report.records[0].adjusted(), (300.0, 550.0));
        assert_eq!(report.records[1].page_size().height, 600.0);
        assert_eq!(report.records[1].adjusted(), (100.0, 550.0));
    }

    #[test]
    fn test_legacy_twelve_column_header() {
        let file = csv_file(
            "Page,Origin,Raw_X,Raw_Y,X,Y,PART,NAME,MM_X,MM_Y,Data_Type,Align\n\
             2,Top-Right,10.00,20.00,390.00,20.00,Body,amount,137.58,7.06,Numeric,Center\n",
        );

        let report = read_records(file.path(), 0, &no_size).unwrap();

        let r = &report.records[0];
        assert_eq!(r.page(), 2);
        assert_eq!(r.adjusted(), (390.0, 20.0));
        assert_eq!(r.annotation().name, "amount");
        assert_eq!(r.annotation().part, DocumentPart::Body);
        assert_eq!(r.annotation().data_type, DataType::Numeric);
        assert_eq!(r.annotation().alignment, Alignment::Center);
    }

    #[test]
    fn test_bad_rows_are_reported_and_skipped() {
        let file = csv_file(
            "Page,Origin,Raw_X,Raw_Y,Adjusted_X,Adjusted_Y\n\
             1,Top-Left,1,2,1,2\n\
             1,Middle,1,2,1,2\n\
             x,Top-Left,1,2,1,2\n\
             1,Top-Left,1,2\n\
             \n\
             1,Top-Left,3,4,3,4\n",
        );

        let report = read_records(file.path(), 0, &no_size).unwrap();

        assert_eq!(report.records.len(), 2);
        let lines: Vec<u64> = report.issues.iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
        assert!(report.issues[0].message.contains("invalid origin 'Middle'"));
        assert!(report.issues[1].message.contains("invalid Page value 'x'"));
        assert!(report.issues[2].message.contains("expected 6 columns, got 4"));
        assert_eq!(report.records[1].annotation().name, "point_2");
    }

    #[test]
    fn test_non_finite_numbers_are_rejected() {
        let file = csv_file(
            "Page,Origin,Raw_X,Raw_Y,Adjusted_X,Adjusted_Y\n\
             1,Top-Left,nan,2,1,2\n\
             1,Top-Left,1,inf,1,2\n\
             1,Top-Left,1,2,-infinity,2\n\
             1,Top-Left,1,2,1,2\n",
        );

        let report = read_records(file.path(), 0, &no_size).unwrap();

        assert_eq!(report.records.len(), 1);
        let lines: Vec<u64> = report.issues.iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![2, 3, 4]);
        assert!(report.issues[0].message.contains("Raw_X"));
        assert!(report.issues[2].message.contains("Adjusted_X"));
    }

    #[test]
    fn test_default_names_continue_numbering() {
        let file = csv_file("1,tl,5,6,5,6\n2,tl,7,8,7,8\n");

        let report = read_records(file.path(), 3, &no_size).unwrap();

        assert_eq!(report.records[0].annotation().name, "point_4");
        assert_eq!(report.records[1].annotation().name, "point_5");
    }

    #[test]
    fn test_headerless_file() {
        let file = csv_file("4,tl,5,6,5,6\n");

        let report = read_records(file.path(), 0, &no_size).unwrap();

        assert_eq!(report.records[0].page(), 4);
        assert_eq!(report.records[0].origin(), OriginPoint::TopLeft);
    }

    #[test]
    fn test_header_only_file_is_empty_error() {
        let file = csv_file("Page,Origin,Raw_X,Raw_Y,Adjusted_X,Adjusted_Y\n");

        let err = read_records(file.path(), 0, &no_size).unwrap_err();

        assert!(matches!(err, ImportError::Empty { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = read_records(&dir.path().join("missing.csv"), 0, &no_size).unwrap_err();
        assert!(matches!(err, ImportError::Io { .. }));
    }
}
