//! PDFium-backed document access via pdfium-render.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use pdfium_render::prelude::{
    PdfDocument, PdfPageObjectsCommon, PdfPoints, PdfRenderConfig, Pdfium, PdfiumError,
};
use tracing::{debug, info};

use super::{Document, PageLabel, PdfSource, RenderedPage};
use crate::coords::PageSize;
use crate::error::PdfError;

/// A dynamically linked PDFium instance
pub struct PdfiumSource {
    pdfium: Pdfium,
}

impl PdfiumSource {
    /// Bind to libpdfium.
    ///
    /// Searches for libpdfium in:
    /// 1. `library_dir`, when configured
    /// 2. Current directory (./libpdfium.so)
    /// 3. vendor/pdfium/lib/
    /// 4. System library paths
    pub fn bind(library_dir: Option<&Path>) -> Result<Self, PdfError> {
        let mut candidates: Vec<String> = library_dir
            .map(|dir| dir.to_string_lossy().into_owned())
            .into_iter()
            .collect();
        candidates.extend(["./".to_string(), "./vendor/pdfium/lib/".to_string()]);

        // Try local paths first, then system
        let bindings = candidates
            .iter()
            .find_map(|dir| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir.as_str()))
                    .ok()
            })
            .map(Ok)
            .unwrap_or_else(Pdfium::bind_to_system_library)
            .map_err(|e| PdfError::Library {
                message: format!("{:?}", e),
            })?;

        info!(library_dir = ?library_dir, "PDFium library bound");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Load a document from its bytes.
    ///
    /// `load_pdf_from_file` ties the password to the document lifetime; the
    /// byte-vector loader does not, and the document owns its buffer.
    fn load(&self, path: &Path, password: Option<&str>) -> Result<PdfDocument<'_>, PdfError> {
        let load_error = |message: String| PdfError::Load {
            path: path.to_path_buf(),
            message,
        };

        let bytes = std::fs::read(path).map_err(|e| load_error(e.to_string()))?;
        self.pdfium
            .load_pdf_from_byte_vec(bytes, password)
            .map_err(|e| load_error(format!("{:?}", e)))
    }
}

impl PdfSource for PdfiumSource {
    type Document<'a> = PdfiumDocument<'a>;

    fn open<'a>(
        &'a self,
        path: &Path,
        password: Option<&str>,
    ) -> Result<PdfiumDocument<'a>, PdfError> {
        let document = self.load(path, password)?;

        let page_count = document.pages().len() as u32;
        debug!(path = %path.display(), page_count, "Opened PDF");

        Ok(PdfiumDocument {
            path: path.to_path_buf(),
            document,
            page_count,
        })
    }

    fn write_overlay(
        &self,
        base: &Path,
        password: Option<&str>,
        labels: &[PageLabel],
        font_size: f64,
        output: &Path,
    ) -> Result<(), PdfError> {
        let mut document = self.load(base, password)?;
        let font = document.fonts_mut().helvetica();

        // Pages regenerate their content when dropped, so they must be gone
        // before the document is saved.
        {
            let pages = document.pages();
            for label in labels {
                let page_error = |e: PdfiumError| PdfError::Page {
                    page: label.page_index,
                    message: format!("{:?}", e),
                };
                let mut page = pages.get(label.page_index as u16).map_err(page_error)?;
                page.objects_mut()
                    .create_text_object(
                        PdfPoints::new(label.x as f32),
                        PdfPoints::new(label.y as f32),
                        &label.text,
                        font,
                        PdfPoints::new(font_size as f32),
                    )
                    .map_err(page_error)?;
            }
        }

        document.save_to_file(output).map_err(|e| PdfError::Save {
            path: output.to_path_buf(),
            message: format!("{:?}", e),
        })?;

        debug!(
            base = %base.display(),
            output = %output.display(),
            labels = labels.len(),
            "Wrote overlay PDF"
        );
        Ok(())
    }
}

pub struct PdfiumDocument<'a> {
    path: PathBuf,
    document: PdfDocument<'a>,
    page_count: u32,
}

impl Document for PdfiumDocument<'_> {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn page_size(&self, page_index: u32) -> Result<PageSize, PdfError> {
        let pages = self.document.pages();
        let page = pages
            .get(page_index as u16)
            .map_err(|e| PdfError::Page {
                page: page_index,
                message: format!("{:?}", e),
            })?;

        Ok(PageSize::new(
            page.width().value as f64,
            page.height().value as f64,
        ))
    }

    fn render(&self, page_index: u32, zoom: f64) -> Result<RenderedPage, PdfError> {
        let pages = self.document.pages();
        let page = pages
            .get(page_index as u16)
            .map_err(|e| PdfError::Page {
                page: page_index,
                message: format!("{:?}", e),
            })?;

        let size = PageSize::new(page.width().value as f64, page.height().value as f64);
        let (width_px, height_px) = size.scaled_pixels(zoom);

        debug!(
            path = %self.path.display(),
            page = page_index,
            zoom,
            size_px = format!("{}x{}", width_px, height_px),
            "Rendering page"
        );

        let config = PdfRenderConfig::new()
            .set_target_width(width_px as i32)
            .set_target_height(height_px as i32);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| PdfError::Render {
                page: page_index,
                message: format!("{:?}", e),
            })?;

        // Use pdfium-render's built-in conversion which handles color format correctly
        let image: DynamicImage = bitmap.as_image();
        Ok(RenderedPage::new(image.to_rgba8()))
    }
}
