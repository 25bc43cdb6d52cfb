use std::path::PathBuf;

use thiserror::Error;

/// Main viewer error type
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("No PDF document is open")]
    NoDocument,

    #[error("Page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: u32 },

    #[error("Point #{number} does not exist (log has {len} points)")]
    PointOutOfRange { number: usize, len: usize },

    #[error("Point #{number} is on page {page}, not the current page {current}")]
    PointNotOnPage {
        number: usize,
        page: u32,
        current: u32,
    },

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("Export failed")]
    Export(#[from] ExportError),

    #[error("Import failed")]
    Import(#[from] ImportError),

    #[error("Failed to write rendered page to {path}")]
    Render {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Invalid command: {message}")]
    InvalidCommand { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// PDF source errors
#[derive(Error, Debug)]
pub enum PdfError {
    #[error(
        "Failed to load PDFium library. Set pdfium.library_dir or install libpdfium: {message}"
    )]
    Library { message: String },

    #[error("Failed to open PDF {path}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("Failed to access page {page}: {message}")]
    Page { page: u32, message: String },

    #[error("Failed to render page {page}: {message}")]
    Render { page: u32, message: String },

    #[error("Failed to save PDF {path}: {message}")]
    Save { path: PathBuf, message: String },
}

/// CSV export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Cannot write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV encoding failed for {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// CSV import errors
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Cannot read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV decoding failed for {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("No valid click data found in {path}")]
    Empty { path: PathBuf },
}

impl ViewerError {
    pub fn invalid_command(message: impl Into<String>) -> Self {
        ViewerError::InvalidCommand {
            message: message.into(),
        }
    }

    /// Full message including the chain of sources, for printing to the user
    pub fn report(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

/// Result type alias for viewer operations
pub type ViewerResult<T> = Result<T, ViewerError>;
