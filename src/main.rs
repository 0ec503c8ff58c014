use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use ma_enrollment::config::{DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR, DEFAULT_YEAR};
use ma_enrollment::inspect::{inspect_files, render, DEFAULT_SAMPLE_ROWS};
use ma_enrollment::{run_pipeline, PipelineConfig, TracingProgress};

#[derive(Parser)]
#[command(name = "ma-enrollment")]
#[command(about = "Yearly Medicare Advantage enrollment tables from monthly CMS extracts")]
#[command(version)]
struct Cli {
    /// Directory holding the monthly CSV extracts
    #[arg(long, global = true, env = "MA_INPUT_DIR", default_value = DEFAULT_INPUT_DIR)]
    input_dir: PathBuf,

    /// Directory the summary tables are written to
    #[arg(long, global = true, env = "MA_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Reporting year in the file names
    #[arg(long, global = true, default_value_t = DEFAULT_YEAR)]
    year: u16,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the three summary tables (default)
    Run,
    /// Show columns and sample rows of the first month's files
    Inspect {
        /// Rows to show per file
        #[arg(long, default_value_t = DEFAULT_SAMPLE_ROWS)]
        rows: usize,
    },
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let cli = Cli::parse();
    let config = PipelineConfig::new(cli.input_dir, cli.output_dir, cli.year);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(&config),
        Commands::Inspect { rows } => {
            print!("{}", render(&inspect_files(&config, rows)));
            Ok(())
        }
    }
}

fn run(config: &PipelineConfig) -> Result<()> {
    let report = run_pipeline(config, &TracingProgress)?;

    println!("{}", report.summary());
    for path in &report.written {
        println!("✓ wrote {}", path.display());
    }

    Ok(())
}
