//! Command line front end for converting scene folders into training data.
//!
//! Usage:
//! ```bash
//! persfield-tools convert /data/eth3d --axis-order ZXY --config samples/pipeline.yaml
//! persfield-tools resize /data/eth3d --width 640 --height 480
//! persfield-tools export-csv /data/eth3d all_frames.csv
//! persfield-tools evaluate /data/eth3d/courtyard/test.json predictions.json
//! ```

use clap::{Parser, Subcommand};
use log::{info, warn};
use persfield_tools::config::{PipelineConfig, ReferenceAngles};
use persfield_tools::evaluation::{compare_predictions, export_csv, load_named_predictions};
use persfield_tools::geometry::AxisOrder;
use persfield_tools::imaging::resize_scenes;
use persfield_tools::sequence::{load_records, process_batch};
use std::path::PathBuf;

/// Camera pose normalization for perspective-field datasets
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Pipeline configuration YAML; defaults apply when omitted
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize the poses of every scene folder under BASE_DIR
    Convert {
        base_dir: PathBuf,

        /// Euler axis order (ZYX or ZXY)
        #[arg(short = 'a', long)]
        axis_order: Option<AxisOrder>,

        /// Reference roll in degrees
        #[arg(long, requires = "reference_pitch")]
        reference_roll: Option<f64>,

        /// Reference pitch in degrees
        #[arg(long, requires = "reference_roll")]
        reference_pitch: Option<f64>,

        /// Reject camera records whose parameter count does not match the model
        #[arg(long)]
        strict: bool,

        /// Write the effective configuration to this file
        #[arg(long)]
        save_config: Option<PathBuf>,
    },
    /// Resize the JPEG images of every scene folder under BASE_DIR
    Resize {
        base_dir: PathBuf,

        #[arg(long)]
        width: Option<u32>,

        #[arg(long)]
        height: Option<u32>,
    },
    /// Gather the JSON output of every scene into one CSV table
    ExportCsv { base_dir: PathBuf, output: PathBuf },
    /// Compare predictor output against a scene's JSON output
    Evaluate {
        ground_truth: PathBuf,
        predictions: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(PipelineConfig::load_from_yaml(path)?)
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Convert {
            base_dir,
            axis_order,
            reference_roll,
            reference_pitch,
            strict,
            save_config,
        } => {
            if let Some(order) = axis_order {
                config.axis_order = order;
            }
            if let (Some(roll), Some(pitch)) = (reference_roll, reference_pitch) {
                config.reference = Some(ReferenceAngles { roll, pitch });
            }
            config.strict_intrinsics |= strict;
            if let Some(path) = save_config {
                config.save_to_yaml(&path)?;
                info!("Saved configuration to: {}", path.display());
            }

            let report = process_batch(&base_dir, &config)?;
            info!(
                "Converted {} scenes ({} frames), {} failed",
                report.processed.len(),
                report.total_frames(),
                report.failed.len()
            );
            for (scene, reason) in &report.failed {
                warn!("  {scene}: {reason}");
            }
        }
        Command::Resize {
            base_dir,
            width,
            height,
        } => {
            if let Some(width) = width {
                config.resize.width = width;
            }
            if let Some(height) = height {
                config.resize.height = height;
            }
            let count = resize_scenes(&base_dir, &config.resize)?;
            info!("Resized {count} images");
        }
        Command::ExportCsv { base_dir, output } => {
            export_csv(&base_dir, &config.output_json, &output)?;
        }
        Command::Evaluate {
            ground_truth,
            predictions,
        } => {
            let records = load_records(&ground_truth)?;
            let predictions = load_named_predictions(&predictions)?;
            compare_predictions(&records, &predictions)?;
        }
    }

    Ok(())
}
