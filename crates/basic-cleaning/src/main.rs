use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use artifact_store::{ArtifactMetadata, LocalArtifactStore};
use basic_cleaning_core::{run_cleaning, CleaningRequest};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

const ARTIFACT_ROOT_ENV: &str = "BASIC_CLEANING_ARTIFACT_ROOT";
const DEFAULT_ARTIFACT_ROOT: &str = "artifact-store";

#[derive(Parser, Debug)]
#[command(author, version, about = "A very basic data cleaning", long_about = None)]
struct Cli {
    /// Name of the input artifact to download, optionally with a `:latest`, `:vN` or `:alias` selector
    #[arg(long = "input_artifact")]
    input_artifact: String,

    /// Name of the output artifact to create
    #[arg(long = "output_artifact")]
    output_artifact: String,

    /// Type of the output artifact
    #[arg(long = "output_type")]
    output_type: String,

    /// The description of the output artifact
    #[arg(long = "output_description")]
    output_description: String,

    /// Minimum price to keep in the dataset
    #[arg(long = "min_price", allow_negative_numbers = true)]
    min_price: f64,

    /// Maximum price to keep in the dataset
    #[arg(long = "max_price", allow_negative_numbers = true)]
    max_price: f64,

    /// Artifact store location (falls back to BASIC_CLEANING_ARTIFACT_ROOT, then ./artifact-store)
    #[arg(long = "artifact_root")]
    artifact_root: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let artifact_root = cli
        .artifact_root
        .clone()
        .or_else(|| env::var_os(ARTIFACT_ROOT_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_ROOT));
    let store = LocalArtifactStore::new(&artifact_root);
    info!(artifact_root = %artifact_root.display(), "Using artifact store");

    let request = CleaningRequest::new(
        &cli.input_artifact,
        ArtifactMetadata::new(cli.output_artifact, cli.output_type, cli.output_description),
        cli.min_price,
        cli.max_price,
    )
    .context("invalid cleaning arguments")?;

    let summary = run_cleaning(&store, &request)
        .await
        .with_context(|| format!("cleaning run for {} failed", request.input))?;

    info!(
        run_id = %summary.run_id,
        output = %summary.output,
        rows = summary.stats.output_rows,
        "Cleaning run finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
