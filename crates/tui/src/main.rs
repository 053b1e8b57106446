//! codepencil - live HTML/CSS/JS playground in the terminal
//!
//! Usage:
//!   codepencil                       # Restore the last session
//!   codepencil --ephemeral           # Start empty, save nothing
//!   codepencil --export page.html    # Write the composed document and exit
//!
//! The preview is written to `<data dir>/preview.html`, a page that shows the
//! document in a frame sandboxed to `allow-scripts`. Open it in a browser
//! with auto-reload to watch it update.
//!
//! Logs go to `<data dir>/codepencil.log`; set RUST_LOG to change the level.

use clap::Parser as ClapParser;
use codepencil::app::App;
use playground::preview::compose_document;
use playground::{
    FileStorage, MemoryStorage, Playground, PlaygroundConfig, PointerCapture, SandboxedFile,
    Storage,
};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "codepencil.log";
const DEFAULT_LOG_FILTER: &str = "codepencil=info,playground=info";

#[derive(ClapParser)]
#[command(name = "codepencil")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Live HTML/CSS/JS playground with a sandboxed preview", long_about = None)]
struct Args {
    /// Directory for saved state, the preview page and the log
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to <config dir>/codepencil/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Keep buffers and layout in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Write the composed preview document to PATH and exit
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Log file (defaults to <data dir>/codepencil.log)
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), String> {
    let mut config = match &args.config {
        Some(path) => PlaygroundConfig::load(path),
        None => PlaygroundConfig::load_default(),
    }
    .map_err(|e| e.to_string())?;
    config.apply_env();
    if let Some(dir) = args.data_dir {
        config.data_dir = Some(dir);
    }

    let data_dir = config.resolved_data_dir();
    fs::create_dir_all(&data_dir)
        .map_err(|e| format!("Failed to create {}: {}", data_dir.display(), e))?;

    let log_path = args.log_file.unwrap_or_else(|| data_dir.join(LOG_FILE));
    init_logging(&log_path);
    info!("Starting codepencil {}", env!("CARGO_PKG_VERSION"));

    let storage: Box<dyn Storage> = if args.ephemeral {
        info!("Ephemeral session, nothing is saved");
        Box::new(MemoryStorage::new())
    } else {
        Box::new(FileStorage::open(&data_dir).map_err(|e| e.to_string())?)
    };

    if let Some(path) = args.export {
        return export(storage, &config, &path);
    }

    let surface = SandboxedFile::in_dir(&data_dir);
    let page_path = surface.path().to_path_buf();
    let app = App::new(storage, Box::new(surface), &config, Instant::now())
        .with_page_path(page_path);

    codepencil::run(app)
}

/// Write the document the preview would show for the saved buffers
fn export(storage: Box<dyn Storage>, config: &PlaygroundConfig, path: &Path) -> Result<(), String> {
    let playground = Playground::open(storage, config, PointerCapture::new(), Instant::now());
    let document = compose_document(playground.buffers());
    fs::write(path, document).map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    info!("Exported document to {}", path.display());
    println!("Wrote {}", path.display());
    Ok(())
}

/// Log to a file; the terminal belongs to the UI
fn init_logging(path: &Path) {
    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Logging disabled: cannot open {}: {}", path.display(), e);
            return;
        }
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .is_err()
    {
        warn!("Logging was already initialized");
    }
}
