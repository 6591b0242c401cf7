use artifact_store::{ArtifactMetadata, ArtifactRef, ArtifactStore, ArtifactVersion, RunRecord};
use polars::prelude::DataFrame;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dataset::{load_dataset, write_dataset, LAST_REVIEW_COLUMN};
use crate::dates::{normalize_dates, DateStats};
use crate::error::{CleaningError, Result};
use crate::filters::{filter_price_range, PriceFilterStats, PriceRange};

pub const JOB_TYPE: &str = "basic_cleaning";
pub const OUTPUT_FILE_NAME: &str = "clean_sample.csv";

/// Everything one cleaning run needs: where to read, how to filter, what to publish.
#[derive(Debug, Clone)]
pub struct CleaningRequest {
    pub input: ArtifactRef,
    pub output: ArtifactMetadata,
    pub price_range: PriceRange,
}

impl CleaningRequest {
    pub fn new(
        input_artifact: &str,
        output: ArtifactMetadata,
        min_price: f64,
        max_price: f64,
    ) -> Result<Self> {
        let input = ArtifactRef::parse(input_artifact)
            .map_err(|err| CleaningError::Config(err.to_string()))?;
        artifact_store::validate_name(&output.name)
            .map_err(|err| CleaningError::Config(err.to_string()))?;
        let price_range = PriceRange::new(min_price, max_price)?;
        Ok(Self {
            input,
            output,
            price_range,
        })
    }

    /// Configuration snapshot stored with the run record.
    pub fn config_json(&self) -> serde_json::Value {
        json!({
            "input_artifact": self.input.to_string(),
            "output_artifact": self.output.name,
            "output_type": self.output.artifact_type,
            "output_description": self.output.description,
            "min_price": self.price_range.min(),
            "max_price": self.price_range.max(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CleaningStats {
    pub input_rows: usize,
    pub output_rows: usize,
    pub columns: usize,
    pub price: PriceFilterStats,
    pub last_review: DateStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleaningSummary {
    pub run_id: Uuid,
    pub input: ArtifactVersion,
    pub output: ArtifactVersion,
    pub stats: CleaningStats,
}

/// Drop rows outside the price range, then normalize `last_review` on the survivors.
pub fn clean_dataset(df: &DataFrame, range: &PriceRange) -> Result<(DataFrame, CleaningStats)> {
    let (mut cleaned, price) = filter_price_range(df, range)?;
    info!(
        min_price = range.min(),
        max_price = range.max(),
        rows = cleaned.height(),
        columns = cleaned.width(),
        out_of_range = price.out_of_range,
        missing_or_invalid = price.missing_or_invalid,
        "Dropped price outliers"
    );

    let last_review = normalize_dates(&mut cleaned, LAST_REVIEW_COLUMN)?;
    if last_review.unparseable > 0 {
        warn!(
            unparseable = last_review.unparseable,
            "Some last_review values could not be parsed and were left empty"
        );
    }
    info!(precision = ?last_review.precision, "Converted last_review to datetime");

    let stats = CleaningStats {
        input_rows: df.height(),
        output_rows: cleaned.height(),
        columns: cleaned.width(),
        price,
        last_review,
    };
    Ok((cleaned, stats))
}

/// Resolve, clean, export, and publish, recording the run in the store whatever the outcome.
pub async fn run_cleaning<S>(store: &S, request: &CleaningRequest) -> Result<CleaningSummary>
where
    S: ArtifactStore + ?Sized,
{
    let mut run = RunRecord::start(JOB_TYPE, request.config_json());
    info!(run_id = %run.run_id, job_type = JOB_TYPE, "Starting run");

    let outcome = execute(store, request, &mut run).await;
    match &outcome {
        Ok(_) => run.succeed(),
        Err(err) => run.fail(err.to_string()),
    }

    if let Err(err) = store.record_run(&run).await {
        warn!(run_id = %run.run_id, error = %err, "Failed to record run");
    }

    outcome
}

async fn execute<S>(
    store: &S,
    request: &CleaningRequest,
    run: &mut RunRecord,
) -> Result<CleaningSummary>
where
    S: ArtifactStore + ?Sized,
{
    let resolved = store
        .resolve(&request.input)
        .await
        .map_err(CleaningError::Resolution)?;
    run.use_artifact(&resolved.version);
    info!(
        input = %resolved.version,
        path = %resolved.path.display(),
        "Downloaded input artifact"
    );

    let raw = load_dataset(&resolved.path)?;
    let (mut cleaned, stats) = clean_dataset(&raw, &request.price_range)?;

    // The directory, and the export inside it, are removed when `staging` drops.
    let staging = tempfile::tempdir()?;
    let export_path = staging.path().join(OUTPUT_FILE_NAME);
    write_dataset(&mut cleaned, &export_path)?;

    info!(
        artifact = %request.output.name,
        artifact_type = %request.output.artifact_type,
        description = %request.output.description,
        "Creating output artifact"
    );
    let output = store
        .publish(&request.output, &export_path, Some(run.run_id))
        .await
        .map_err(CleaningError::Publish)?;
    run.log_artifact(&output);

    Ok(CleaningSummary {
        run_id: run.run_id,
        input: resolved.version,
        output,
        stats,
    })
}
