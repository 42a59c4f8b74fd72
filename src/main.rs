use anyhow::Result;
use clap::Parser;
use log::{debug, error, info};
use std::path::PathBuf;
use std::time::Instant;

mod output;
mod stage;

use prop_common::{OutputFormat, StageConfig};
use stage::Stage;

/// Command-line arguments for the stage runner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Stage configuration file (.toml)
    #[arg(short, long, default_value = "stage.toml")]
    config: PathBuf,

    /// Override the number of iterations from the config
    #[arg(long)]
    iterations: Option<u32>,
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();
    let args = Args::parse();

    info!("Starting Prop stage runner...");

    // --- Load Configuration ---
    let mut config = StageConfig::load(&args.config)?;
    if let Some(iterations) = args.iterations {
        config.timing.iterations = iterations;
    }

    let mut stage = Stage::new(config)?;
    debug!("Stage configuration: {:#?}", stage.config());

    let start_time = Instant::now();
    if let Err(e) = stage.run() {
        error!("{:#}", e);
        anyhow::bail!("Stage run failed.");
    }

    info!("Replay finished in {:.3} ms.", start_time.elapsed().as_secs_f64() * 1000.0);
    for coord in &stage.config().coords {
        match stage.position(&coord.name) {
            Ok([x, y]) => info!("  {} = ({:.4}, {:.4})", coord.name, x, y),
            Err(_) => info!("  {} (removed)", coord.name),
        }
    }

    // --- Save Recorded Data ---
    let output_config = &stage.config().output;
    let base_filename = output_config.base_filename.as_str();
    let format = output_config.output_format().unwrap_or_else(|| {
        error!("Unknown output format: {:?}. Using JSON instead.", output_config.format);
        OutputFormat::Json
    });

    if output_config.save_snapshots {
        save_or_log(output::save_snapshots(stage.get_recorded_snapshots(), base_filename, format));
    } else {
        info!("Skipping saving snapshots as per config (save_snapshots is false).");
    }

    if format == OutputFormat::Raw {
        save_or_log(output::save_memory_dump(stage.memory(), base_filename));
    }

    if output_config.save_positions {
        save_or_log(output::save_final_positions(&stage.get_results(), base_filename));
    } else {
        info!("Skipping saving final positions as per config.");
    }

    info!("Stage Complete.");
    Ok(())
}

fn save_or_log(result: Result<PathBuf>) {
    if let Err(e) = result {
        error!("{:#}", e);
    }
}
