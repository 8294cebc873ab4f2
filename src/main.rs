use std::fs::File;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod columns;
mod controller;
mod domain;
mod inputter;
mod loader;
mod model;
mod pipeline;
mod record;
mod state;
mod ui;

use controller::Controller;
use domain::{TVConfig, TVError};
use model::{Model, Status};
use record::Dataset;
use ui::TableUI;

/// A tui based tabular data viewer.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// csv, parquet or arrow file to show. Shows a small sample table if omitted.
    path: Option<String>,

    /// Number of records per page
    #[arg(short, long, default_value = "4")]
    page_size: NonZeroUsize,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Table title, defaults to the file name
    #[arg(long)]
    title: Option<String>,
}

impl From<&Args> for TVConfig {
    fn from(args: &Args) -> Self {
        TVConfig {
            page_size: args.page_size,
            event_poll_time: args.poll_ms,
            log_file: args.log_file.clone(),
            log_level: args.log_level.clone(),
            title: args.title.clone(),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Err(e) => {
            error!("Exiting with error: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_tracing(cfg: &TVConfig) -> Result<(), TVError> {
    // The terminal belongs to the ui, so logs only go to a file
    let Some(path) = &cfg.log_file else {
        return Ok(());
    };
    let file = File::create(path)?;
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&cfg.log_level));
    let filter = filter.map_err(|e| TVError::Logging(e.to_string()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| TVError::Logging(e.to_string()))
}

fn run(args: &Args) -> Result<(), TVError> {
    let cfg = TVConfig::from(args);
    init_tracing(&cfg)?;
    info!("Starting tv with {:?}", cfg);

    let dataset = match &args.path {
        Some(raw) => loader::load_data_file(loader::expand_path(raw)?)?,
        None => Dataset::sample(),
    };

    let mut model = Model::init(&cfg, dataset);
    let mut ui = TableUI::new(&cfg);
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();
    let result = event_loop(&mut model, &mut ui, &controller, &mut terminal);
    ratatui::restore();
    result
}

fn event_loop(
    model: &mut Model,
    ui: &mut TableUI,
    controller: &Controller,
    terminal: &mut ratatui::DefaultTerminal,
) -> Result<(), TVError> {
    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(model)?;
        model.update(message);
    }
    info!("Quitting tv");
    Ok(())
}
