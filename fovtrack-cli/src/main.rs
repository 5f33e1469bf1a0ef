//! FovTrack CLI - camera exposure analysis for recorded tracks.
//!
//! Loads a GPX track file and a CSV camera catalog, runs the exposure
//! passes for every track segment, and prints one JSON report document
//! per segment on stdout. Diagnostics go to stderr via `tracing`.

mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use fovtrack::camera::load_catalog;
use fovtrack::exposure::{
    measure_exposure, survey_segment, ExposureConfig, DEFAULT_MARGIN_M, DEFAULT_RESOLUTION_M,
};
use fovtrack::report::build_report;
use fovtrack::track::load_gpx;

use crate::error::CliError;

/// Estimate how exposed a recorded track is to camera surveillance.
#[derive(Debug, Parser)]
#[command(name = "fovtrack", version, about)]
struct Args {
    /// Path to the GPX track file
    #[arg(short, long)]
    gpxfile: PathBuf,

    /// Path to the camera catalog CSV file
    #[arg(short, long)]
    camfile: PathBuf,

    /// Global FOV radius in meters, overriding individual camera settings
    #[arg(short, long)]
    radius: Option<f64>,

    /// Interpolation step in meters between synthesized pseudo points
    #[arg(long, default_value_t = DEFAULT_RESOLUTION_M)]
    resolution: f64,

    /// Acceptance margin in meters added to the FOV radius while probing
    #[arg(long, default_value_t = DEFAULT_MARGIN_M)]
    margin: f64,

    /// Emit compact JSON instead of pretty-printed documents
    #[arg(long)]
    compact: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    if !(args.resolution > 0.0) {
        return Err(CliError::InvalidArgument(format!(
            "resolution must be positive, got {}",
            args.resolution
        )));
    }
    if args.margin < 0.0 {
        return Err(CliError::InvalidArgument(format!(
            "margin must not be negative, got {}",
            args.margin
        )));
    }
    if let Some(radius) = args.radius {
        if !(radius > 0.0) {
            return Err(CliError::InvalidArgument(format!(
                "radius must be positive, got {}",
                radius
            )));
        }
    }

    let mut catalog = load_catalog(&args.camfile)?;
    if let Some(radius) = args.radius {
        catalog = catalog.with_radius_override(radius);
    }

    let tracks = load_gpx(&args.gpxfile)?;
    let source = source_name(&args.gpxfile);
    let config = ExposureConfig {
        resolution_m: args.resolution,
        margin_m: args.margin,
    };

    for (track_index, track) in tracks.iter().enumerate() {
        for (segment_index, segment) in track.segments.iter().enumerate() {
            let survey = survey_segment(segment, &catalog);
            let summary = measure_exposure(segment, &catalog, &survey, &config);

            match build_report(
                &source,
                track_index,
                segment_index,
                segment,
                &catalog,
                &survey,
                &summary,
            ) {
                Ok(report) => {
                    let json = if args.compact {
                        serde_json::to_string(&report)?
                    } else {
                        serde_json::to_string_pretty(&report)?
                    };
                    println!("{json}");
                }
                Err(err) => {
                    warn!(
                        track = track_index,
                        segment = segment_index,
                        "skipping segment: {err}"
                    );
                }
            }
        }
    }

    Ok(())
}

/// Base file name of the track source, falling back to the full path.
fn source_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
