//! Application entry point for the particle epidemic simulator.
//!
//! By default this opens an eframe/egui window and delegates all
//! interactive logic and rendering to [`Viewer`] from the `viewer` module.
//! With `--headless` the same engine runs in the terminal instead.

mod headless;
mod viewer;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use epi_core::{config::Config, error::SimError};
use tracing::error;
use tracing_subscriber::EnvFilter;
use viewer::Viewer;

#[derive(Parser, Debug)]
#[command(version, about = "Particle-based epidemic simulator")]
struct Args {
    /// TOML file overriding the default parameters.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of people; overrides the config file.
    #[arg(long)]
    population: Option<usize>,

    /// Run in the terminal without opening a window.
    #[arg(long)]
    headless: bool,

    /// Stop a headless run after this many ticks.
    #[arg(long, requires = "headless")]
    max_ticks: Option<u64>,
}

impl Args {
    fn load_config(&self) -> Result<Config, SimError> {
        let mut cfg = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(population) = self.population {
            cfg.population_size = population;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Starts the native eframe application with a window titled `"Epidemic"`.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn run_gui(viewer: Viewer) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([960.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native("Epidemic", options, Box::new(|_cc| Ok(Box::new(viewer))))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = match args.load_config() {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(%err, "could not load config");
            return ExitCode::FAILURE;
        }
    };

    if args.headless {
        return headless::run(cfg, args.max_ticks);
    }

    let viewer = match Viewer::new(cfg) {
        Ok(viewer) => viewer,
        Err(err) => {
            error!(%err, "could not create simulation");
            return ExitCode::FAILURE;
        }
    };

    match run_gui(viewer) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "viewer failed");
            ExitCode::FAILURE
        }
    }
}
