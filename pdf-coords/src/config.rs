use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer};

use crate::click_log::{ExportLayout, ExportOptions};
use crate::coords::OriginPoint;
use crate::error::{ViewerError, ViewerResult};

/// Application configuration, read once at startup
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_viewer")]
    pub viewer: ViewerConfig,

    #[serde(default = "default_export")]
    pub export: ExportConfig,

    #[serde(default)]
    pub pdfium: PdfiumConfig,
}

/// Navigation, zoom and click handling
#[derive(Debug, Clone, Deserialize)]
pub struct ViewerConfig {
    /// Origin selected when the viewer starts
    #[serde(
        default = "default_origin",
        deserialize_with = "deserialize_origin"
    )]
    pub default_origin: OriginPoint,

    #[serde(default = "default_initial_zoom")]
    pub initial_zoom: f64,

    /// Factor applied per zoom in / zoom out step
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f64,

    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,

    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,

    /// How close (in canvas pixels) a click must land to an existing marker
    /// to select it instead of recording a new point
    #[serde(default = "default_hit_tolerance_px")]
    pub hit_tolerance_px: f64,

    #[serde(default = "default_marker_radius_px")]
    pub marker_radius_px: u32,
}

/// CSV export settings
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Directory for exports written without an explicit path
    #[serde(default = "default_export_directory")]
    pub directory: PathBuf,

    #[serde(default = "default_precision")]
    pub precision: usize,

    #[serde(default)]
    pub layout: ExportLayout,

    /// Font size in points for names written by `overlay`
    #[serde(default = "default_overlay_font_size")]
    pub overlay_font_size: f64,
}

/// PDFium library location
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PdfiumConfig {
    /// Directory containing libpdfium. Falls back to ./, vendor/pdfium/lib/
    /// and the system library path.
    #[serde(default)]
    pub library_dir: Option<PathBuf>,
}

impl ExportConfig {
    pub fn options(&self) -> ExportOptions {
        ExportOptions {
            layout: self.layout,
            precision: self.precision,
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        default_viewer()
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        default_export()
    }
}

impl AppConfig {
    /// Load from `pdf-coords.toml` (or `path` when given) overlaid with
    /// `PDF_COORDS__SECTION__KEY` environment variables.
    pub fn load(path: Option<&Path>) -> ViewerResult<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name("pdf-coords").required(false),
        };

        let config: AppConfig = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("PDF_COORDS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ViewerError::Config {
                message: format!("Failed to build config: {}", e),
            })?
            .try_deserialize()
            .map_err(|e| ViewerError::Config {
                message: format!("Failed to deserialize config: {}", e),
            })?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ViewerResult<()> {
        let v = &self.viewer;
        if !(v.min_zoom > 0.0 && v.min_zoom <= v.max_zoom) {
            return Err(ViewerError::Config {
                message: format!(
                    "viewer.min_zoom ({}) must be positive and not exceed viewer.max_zoom ({})",
                    v.min_zoom, v.max_zoom
                ),
            });
        }
        if !(v.min_zoom..=v.max_zoom).contains(&v.initial_zoom) {
            return Err(ViewerError::Config {
                message: format!(
                    "viewer.initial_zoom ({}) must lie between {} and {}",
                    v.initial_zoom, v.min_zoom, v.max_zoom
                ),
            });
        }
        if v.zoom_step <= 1.0 {
            return Err(ViewerError::Config {
                message: format!("viewer.zoom_step ({}) must be greater than 1", v.zoom_step),
            });
        }
        let font_size = self.export.overlay_font_size;
        if !(font_size.is_finite() && font_size > 0.0) {
            return Err(ViewerError::Config {
                message: format!("export.overlay_font_size ({}) must be positive", font_size),
            });
        }
        Ok(())
    }
}

fn deserialize_origin<'de, D>(deserializer: D) -> Result<OriginPoint, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    OriginPoint::from_str(&value)
        .map_err(|_| serde::de::Error::custom(format!("unknown origin '{}'", value)))
}

// ==================== Default Value Functions ====================

fn default_viewer() -> ViewerConfig {
    ViewerConfig {
        default_origin: default_origin(),
        initial_zoom: default_initial_zoom(),
        zoom_step: default_zoom_step(),
        min_zoom: default_min_zoom(),
        max_zoom: default_max_zoom(),
        hit_tolerance_px: default_hit_tolerance_px(),
        marker_radius_px: default_marker_radius_px(),
    }
}

fn default_origin() -> OriginPoint {
    OriginPoint::BottomLeft
}

fn default_initial_zoom() -> f64 {
    1.0
}

fn default_zoom_step() -> f64 {
    1.25
}

fn default_min_zoom() -> f64 {
    0.2
}

fn default_max_zoom() -> f64 {
    5.0
}

fn default_hit_tolerance_px() -> f64 {
    15.0
}

fn default_marker_radius_px() -> u32 {
    5
}

fn default_export() -> ExportConfig {
    ExportConfig {
        directory: default_export_directory(),
        precision: default_precision(),
        layout: ExportLayout::default(),
        overlay_font_size: default_overlay_font_size(),
    }
}

fn default_export_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_precision() -> usize {
    2
}

fn default_overlay_font_size() -> f64 {
    10.0
}
