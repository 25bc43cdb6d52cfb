//! PDF access.
//!
//! The viewer needs a page count, page sizes in points, a raster of a page
//! at a zoom factor, and a way to write a labelled copy of a document.
//! Those are expressed as traits so the viewer does not care which library
//! provides them.

pub mod pdfium;

use std::path::Path;

use image::RgbaImage;

use crate::coords::PageSize;
use crate::error::PdfError;

pub use pdfium::PdfiumSource;

/// A raster of one page
pub struct RenderedPage {
    pub image: RgbaImage,
    pub width: u32,
    pub height: u32,
}

impl RenderedPage {
    pub fn new(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            image,
            width,
            height,
        }
    }
}

/// Text drawn onto a page by [`PdfSource::write_overlay`].
///
/// Positions are PDF user space: points from the bottom-left corner, Y up.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLabel {
    pub page_index: u32,
    pub x: f64,
    pub y: f64,
    pub text: String,
}

/// Opens documents. Documents may borrow from their source.
pub trait PdfSource {
    type Document<'a>: Document
    where
        Self: 'a;

    fn open<'a>(
        &'a self,
        path: &Path,
        password: Option<&str>,
    ) -> Result<Self::Document<'a>, PdfError>;

    /// Write a copy of `base` to `output` with `labels` drawn as text.
    fn write_overlay(
        &self,
        base: &Path,
        password: Option<&str>,
        labels: &[PageLabel],
        font_size: f64,
        output: &Path,
    ) -> Result<(), PdfError>;
}

/// An open document. Page indices are 0-based.
pub trait Document {
    fn page_count(&self) -> u32;

    fn page_size(&self, page_index: u32) -> Result<PageSize, PdfError>;

    fn render(&self, page_index: u32, zoom: f64) -> Result<RenderedPage, PdfError>;
}

/// In-memory documents for exercising the viewer without PDFium.
#[cfg(test)]
pub mod fake {
    use std::path::Path;

    use image::{Rgba, RgbaImage};

    use super::{Document, PageLabel, PdfSource, RenderedPage};
    use crate::coords::PageSize;
    use crate::error::PdfError;

    /// Opens any path ending in `.pdf`; anything else fails to load.
    ///
    /// Overlays are written as one `page x y text` line per label.
    pub struct FakeSource {
        pub pages: Vec<PageSize>,
    }

    impl FakeSource {
        pub fn new(pages: Vec<PageSize>) -> Self {
            Self { pages }
        }
    }

    pub struct FakeDocument {
        pages: Vec<PageSize>,
    }

    impl PdfSource for FakeSource {
        type Document<'a> = FakeDocument;

        fn open<'a>(
            &'a self,
            path: &Path,
            _password: Option<&str>,
        ) -> Result<FakeDocument, PdfError> {
            if path.extension().and_then(|e| e.to_str()) != Some("pdf") {
                return Err(PdfError::Load {
                    path: path.to_path_buf(),
                    message: "not a PDF".to_string(),
                });
            }
            Ok(FakeDocument {
                pages: self.pages.clone(),
            })
        }

        fn write_overlay(
            &self,
            base: &Path,
            password: Option<&str>,
            labels: &[PageLabel],
            _font_size: f64,
            output: &Path,
        ) -> Result<(), PdfError> {
            let document = self.open(base, password)?;
            let mut text = String::new();
            for label in labels {
                document.page_size(label.page_index)?;
                text.push_str(&format!(
                    "{} {:.2} {:.2} {}\n",
                    label.page_index, label.x, label.y, label.text
                ));
            }
            std::fs::write(output, text).map_err(|e| PdfError::Save {
                path: output.to_path_buf(),
                message: e.to_string(),
            })
        }
    }

    impl Document for FakeDocument {
        fn page_count(&self) -> u32 {
            self.pages.len() as u32
        }

        fn page_size(&self, page_index: u32) -> Result<PageSize, PdfError> {
            self.pages
                .get(page_index as usize)
                .copied()
                .ok_or_else(|| PdfError::Page {
                    page: page_index,
                    message: "no such page".to_string(),
                })
        }

        fn render(&self, page_index: u32, zoom: f64) -> Result<RenderedPage, PdfError> {
            let (w, h) = self.page_size(page_index)?.scaled_pixels(zoom);
            Ok(RenderedPage::new(RgbaImage::from_pixel(
                w,
                h,
                Rgba([255, 255, 255, 255]),
            )))
        }
    }
}
