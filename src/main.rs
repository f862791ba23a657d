use asset_optimizer::config::{self, OptimizeConfig};
use asset_optimizer::process::{self, RunOutcome};
use asset_optimizer::output;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "asset-optimizer")]
#[command(about = "Crop, resize and compress storefront photos into fixed-ratio variants")]
#[command(long_about = "\
Crop, resize and compress storefront photos into fixed-ratio variants

Every image in the source directory is center-cropped to each profile's
aspect ratio, resized to its exact pixel size and re-encoded lossily.

  assets/
  ├── 050-escritorio_gamer.png
  ├── logo.png                          # skipped (excluded prefix)
  └── optimized/
      ├── optimization-report.csv
      ├── mobile-9x16/001-050-escritorio-gamer.webp
      └── desktop-16x9/001-050-escritorio-gamer.webp

Settings come from optimize.toml in the working directory (or --config).
Run 'asset-optimizer gen-config' to print a documented one.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./optimize.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Source directory (overrides source_dir)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Output base directory (overrides output_dir)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate every variant and write the report
    Optimize,
    /// Show what optimize would write, without writing anything
    Plan {
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock optimize.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Optimize => {
            let config = resolve_config(&cli)?;
            match process::optimize(&config, output::print_event)? {
                RunOutcome::NoSources { source_dir } => output::print_no_sources(&source_dir),
                RunOutcome::Completed(summary) => output::print_summary(&summary),
            }
        }
        Command::Plan { json } => {
            let config = resolve_config(&cli)?;
            let plan = process::plan(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                output::print_plan(&plan);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config file, then apply command-line directory overrides.
fn resolve_config(cli: &Cli) -> Result<OptimizeConfig, config::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(Path::new("."))?,
    };
    if let Some(source) = &cli.source {
        config.source_dir = source.clone();
    }
    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }
    config.validate()?;
    Ok(config)
}
