//! gridslice: command-line front end for the grid slicing kernel.
//!
//! Loads gridded fields from JSON/YAML descriptors, runs one kernel
//! operation and prints the result as JSON on stdout. Logs go to stderr.

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geo_common::{EarthLocation, Unit};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use grid_slicer::{GridSlicer, SamplingMode, SlicerConfig, SmoothingKind};

use commands::{parse_level, parse_level_request, parse_location, parse_path};

#[derive(Parser, Debug)]
#[command(name = "gridslice")]
#[command(about = "Cross-sections, plan views and probes of gridded fields")]
struct Args {
    /// YAML configuration file (defaults and SLICER_* variables otherwise)
    #[arg(short, long, env = "SLICER_CONFIG")]
    config: Option<PathBuf>,

    /// Sampling mode: nearest or weighted
    #[arg(long, global = true)]
    mode: Option<SamplingMode>,

    /// Smoothing kind applied to slices
    #[arg(long, global = true)]
    smoothing: Option<SmoothingKind>,

    /// Smoothing factor (passes, half-width or radius)
    #[arg(long, global = true)]
    smoothing_factor: Option<u32>,

    /// Keep every n-th sample of the result
    #[arg(long, global = true, default_value = "0")]
    skip: usize,

    /// Log level
    #[arg(long, default_value = "warn", env = "RUST_LOG")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cross-section along a great circle
    Transect {
        /// Field descriptor file
        field: PathBuf,
        /// Start point, lat,lon (default: derived from the data)
        #[arg(long, value_parser = parse_location)]
        from: Option<EarthLocation>,
        /// End point, lat,lon
        #[arg(long, value_parser = parse_location)]
        to: Option<EarthLocation>,
    },
    /// Plan view at a vertical level
    Level {
        field: PathBuf,
        /// default, index:N or a value such as 500hPa
        #[arg(long, default_value = "default")]
        level: String,
    },
    /// Values at one location over time
    Probe {
        field: PathBuf,
        /// lat,lon or lat,lon,alt (alt in meters)
        #[arg(long, value_parser = parse_location)]
        at: EarthLocation,
    },
    /// Distance along a path of points
    Distance {
        /// lat,lon;lat,lon;...
        path: String,
        /// Distance unit (default from configuration)
        #[arg(long)]
        unit: Option<String>,
    },
    /// Parcel trajectories seeded inside a polygon
    Trajectory {
        /// Eastward wind field
        #[arg(long)]
        u: PathBuf,
        /// Northward wind field
        #[arg(long)]
        v: PathBuf,
        /// Scalar sampled along each path
        #[arg(long)]
        tracer: Option<PathBuf>,
        /// Seed polygon, lat,lon;lat,lon;...
        #[arg(long)]
        polygon: String,
        /// Seed level, e.g. 850hPa
        #[arg(long)]
        level: Option<String>,
    },
}

fn load_config(args: &Args) -> Result<SlicerConfig> {
    let mut config = match &args.config {
        Some(path) => SlicerConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => SlicerConfig::from_env(),
    };

    if let Some(mode) = args.mode {
        config.sampling_mode = mode;
    }
    if let Some(kind) = args.smoothing {
        config.smoothing_kind = kind;
        if config.smoothing_factor == 0 {
            config.smoothing_factor = 1;
        }
    }
    if let Some(factor) = args.smoothing_factor {
        config.smoothing_factor = factor;
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr);
    if args.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    let config = load_config(&args)?;
    info!(mode = %config.sampling_mode, smoothing = %config.smoothing_kind, "Configuration loaded");
    let slicer = GridSlicer::new(config).context("Failed to create slicer")?;

    let value = match args.command {
        Command::Transect { field, from, to } => {
            let field = commands::load_field(&field)?;
            commands::transect(&slicer, &field, from, to, args.mode, args.skip)?
        }
        Command::Level { field, level } => {
            let field = commands::load_field(&field)?;
            let unit = field.vertical().map_or(Unit::Hectopascal, |v| v.unit);
            let request = parse_level_request(&level, unit).map_err(anyhow::Error::msg)?;
            commands::level(&slicer, &field, request, args.mode, args.skip)?
        }
        Command::Probe { field, at } => {
            let field = commands::load_field(&field)?;
            commands::probe(&slicer, &field, at, args.mode)?
        }
        Command::Distance { path, unit } => {
            let symbol = unit.unwrap_or_else(|| slicer.config().distance_unit.clone());
            let unit = Unit::parse(&symbol).with_context(|| format!("Unknown distance unit '{}'", symbol))?;
            let path = parse_path(&path).map_err(anyhow::Error::msg)?;
            commands::distance(&path, unit)?
        }
        Command::Trajectory {
            u,
            v,
            tracer,
            polygon,
            level,
        } => {
            let polygon = parse_path(&polygon).map_err(anyhow::Error::msg)?;
            let u = commands::load_field(&u)?;
            let v = commands::load_field(&v)?;
            let tracer = tracer.as_deref().map(commands::load_field).transpose()?;
            let unit = u.vertical().map_or(Unit::Hectopascal, |axis| axis.unit);
            let level = level
                .as_deref()
                .map(|l| parse_level(l, unit))
                .transpose()
                .map_err(anyhow::Error::msg)?;
            commands::trajectory(&slicer, u, v, tracer, polygon, level).await?
        }
    };

    let text = if args.pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    println!("{}", text);
    Ok(())
}
