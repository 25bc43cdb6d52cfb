use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

mod click_log;
mod config;
mod coords;
mod error;
mod pdf;
mod shell;
mod viewer;

use crate::config::AppConfig;
use crate::pdf::PdfiumSource;
use crate::shell::Shell;
use crate::viewer::Viewer;

/// Pick points on PDF pages and export their coordinates
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file (defaults to ./pdf-coords.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// PDF to open at startup
    #[arg(short, long)]
    open: Option<PathBuf>,

    /// Read commands from this file instead of stdin
    #[arg(short, long)]
    script: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    init_logging();

    info!("Starting pdf-coords v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(args.config.as_deref())?;
    info!(
        origin = %config.viewer.default_origin,
        export_dir = %config.export.directory.display(),
        layout = %config.export.layout,
        "Configuration loaded"
    );

    let source = PdfiumSource::bind(config.pdfium.library_dir.as_deref())?;
    let viewer = Viewer::new(&source, config.viewer.clone());
    let mut shell = Shell::new(viewer, config.export.clone());

    if let Some(path) = &args.open {
        let pages = shell.viewer_mut().open(path, None)?;
        println!("opened {} ({} pages)", path.display(), pages);
    }

    let mut stdout = io::stdout().lock();
    match &args.script {
        Some(script) => {
            info!(path = %script.display(), "Running script");
            let file = File::open(script)?;
            shell.run(BufReader::new(file), &mut stdout)?;
        }
        None => {
            let stdin = io::stdin();
            let interactive = stdin.is_terminal();
            let mut shell = shell.with_prompt(interactive);
            shell.run(stdin.lock(), &mut stdout)?;
        }
    }

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let format = fmt::format().with_target(true).compact();

    // Use RUST_LOG if set, otherwise default to info level for our crate
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pdf_coords=info"));

    // stdout carries command output, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .event_format(format)
                .with_writer(io::stderr),
        )
        .with(filter)
        .init();
}
