//! macgraph-predict CLI: pretty-print a frozen MAC network's predictions

use anyhow::Result;
use clap::Parser;
use macgraph_predict::{
    git_model_version, predict, resolve_model_dir, CommandOptions, RunConfig,
};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "macgraph-predict")]
#[command(about = "Inspect attention traces of a frozen MAC network over its knowledge graph")]
#[command(version)]
struct Cli {
    /// Maximum number of prediction records to inspect (not to render)
    #[arg(long, default_value_t = 20)]
    n: usize,

    /// Only records whose type string starts with this prefix
    #[arg(long)]
    filter_type_prefix: Option<String>,

    /// Only records the model predicted as this class
    #[arg(long)]
    filter_output_class: Option<String>,

    /// Only records whose expected class equals this
    #[arg(long)]
    filter_expected_class: Option<String>,

    /// Model directory holding config.yaml (else derived from
    /// prefix/dataset/version)
    #[arg(long)]
    model_dir: Option<PathBuf>,

    #[arg(long, default_value = "output/model")]
    model_dir_prefix: PathBuf,

    /// Name of dataset
    #[arg(long, default_value = "default")]
    dataset: String,

    /// Model version (default: current source-control revision)
    #[arg(long)]
    model_version: Option<String>,

    /// Only print records the model got right
    #[arg(long, conflicts_with = "failed_only")]
    correct_only: bool,

    /// Only print records the model got wrong
    #[arg(long)]
    failed_only: bool,

    /// Print the verdict line only, skip the per-iteration break-down
    #[arg(long)]
    hide_details: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let version = cli
        .model_version
        .clone()
        .unwrap_or_else(git_model_version);
    let model_dir = resolve_model_dir(
        cli.model_dir.as_deref(),
        &cli.model_dir_prefix,
        &cli.dataset,
        &version,
    );
    info!("Model dir: {}", model_dir.display());

    let config = RunConfig::load(&model_dir)?;
    let options = CommandOptions {
        n: cli.n,
        filter_type_prefix: cli.filter_type_prefix,
        filter_output_class: cli.filter_output_class,
        filter_expected_class: cli.filter_expected_class,
        correct_only: cli.correct_only,
        failed_only: cli.failed_only,
        hide_details: cli.hide_details,
    };

    let stdout = std::io::stdout();
    let summary = predict(&config, &options, stdout.lock())?;
    info!(
        "Inspected {} records; {} matched the filters, {} rendered",
        summary.inspected, summary.matched, summary.rendered
    );

    Ok(())
}
