//! Closure simulator CLI.
//!
//! Loads post offices, retail points, competitor banks and (optionally)
//! census sections, closes one office and prints how its volume is
//! redistributed. A GeoJSON map of the result is written alongside.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use postal_closure::census::CensusIndex;
use postal_closure::config::FractionOverride;
use postal_closure::dataset;
use postal_closure::{ClosureSimulator, Network, SimulationError, SimulationParams};

mod map;
mod report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "simulate")]
#[command(about = "Simulate closing a post office and redistributing its services")]
struct Args {
    /// Post offices CSV (id, nome, latitude, longitude, service volumes)
    #[arg(long)]
    offices: PathBuf,

    /// Retail points CSV (abilitato_<service> flags)
    #[arg(long)]
    retail: PathBuf,

    /// Competitor banks CSV
    #[arg(long)]
    banks: PathBuf,

    /// Census sections GeoJSON; without it the default density is used
    #[arg(long)]
    census: Option<PathBuf>,

    /// TOML file with radius, default density and fraction table
    #[arg(long)]
    config: Option<PathBuf>,

    /// Id of the post office to close
    #[arg(short, long)]
    close: String,

    /// Base search radius in metres
    #[arg(long)]
    base_radius: Option<f64>,

    /// Override one fraction, e.g. `pacchi.same_type=0.45`
    #[arg(long = "set", value_name = "SERVICE.FIELD=VALUE")]
    overrides: Vec<FractionOverride>,

    /// Report format on stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Where to write the GeoJSON map
    #[arg(long, default_value = "closure_map.geojson")]
    map: PathBuf,

    /// Skip writing the map
    #[arg(long)]
    no_map: bool,
}

fn main() -> Result<ExitCode> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut params = match &args.config {
        Some(path) => {
            info!("Loading parameters from {}", path.display());
            SimulationParams::load_from_file(path)?
        }
        None => SimulationParams::default(),
    };
    if let Some(radius) = args.base_radius {
        params.base_radius_m = radius;
    }
    let params = params.with_overrides(&args.overrides)?;

    let offices = dataset::load_post_offices_from_path(&args.offices)?;
    let retail = dataset::load_retail_points_from_path(&args.retail)?;
    let banks = dataset::load_competitors_from_path(&args.banks)?;
    let census = match &args.census {
        Some(path) => CensusIndex::build(dataset::load_census_from_path(path)?),
        None => CensusIndex::empty(),
    };

    let simulator = ClosureSimulator::new(Network::new(offices, retail, banks, census));

    let result = match simulator.simulate(&args.close, &params) {
        Ok(result) => result,
        Err(e @ SimulationError::NotFound { .. }) => {
            error!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        "Closed {}: radius {:.0} m ({} density, {:.1} people/km²)",
        result.closed.id,
        result.radius_m,
        result.density_band,
        result.density_value()
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Text => out.write_all(report::render(&result)?.as_bytes())?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &result)?;
            writeln!(out)?;
        }
    }
    out.flush()?;

    if !args.no_map {
        map::write_map(&result, &args.map)
            .with_context(|| format!("Failed to write map to {}", args.map.display()))?;
        info!("Map written to {}", args.map.display());
    }

    Ok(ExitCode::SUCCESS)
}
