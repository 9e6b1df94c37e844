use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use genfetch::config::Config;
use genfetch::dates::DateRange;
use genfetch::fetch::{BatchFetcher, Fetcher};
use genfetch::orchestrator::{Orchestrator, RunMode, RunSummary};
use genfetch::pipeline::{Pipeline, PipelineJob};
use genfetch::sources::SourceRegistry;
use genfetch::storage::{ObjectStoreSink, Sink};

use crate::cli::RunArgs;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn run(config: Config, args: RunArgs) -> Result<RunSummary, AnyError> {
    let api_key = config
        .api
        .api_key
        .clone()
        .ok_or_else(|| AnyError::from("API_KEY environment variable is not set"))?;

    let date_range = DateRange::resolve(
        args.start_date.as_deref(),
        args.end_date.as_deref(),
        args.lookback_days.unwrap_or(config.output.lookback_days),
        Utc::now().date_naive(),
    )?;
    let format = args.output_format.unwrap_or(config.output.format);
    let output_path = args.output_path.unwrap_or_else(|| config.output.path.clone());

    info!(
        base_url = %config.api.base_url,
        output = %output_path.display(),
        %format,
        "Fetching data for date range {}", date_range
    );

    let fetcher = Fetcher::new(&config.http.http_config(), api_key, config.retry.policy())?;
    let batch = BatchFetcher::new(fetcher);
    let sink: Arc<dyn Sink> = Arc::new(ObjectStoreSink::local(&output_path)?);
    let registry = SourceRegistry::with_defaults(&config.api);

    let mode = match args.source.name() {
        Some(name) => RunMode::Single(name.to_string()),
        None => RunMode::All,
    };

    let pipelines = registry
        .iter()
        .filter(|source| match &mode {
            RunMode::Single(name) => &source.name == name,
            RunMode::All => true,
        })
        .map(|source| {
            let job = PipelineJob::new(&source.name, &source.url_template, date_range.clone())
                .with_format(format)
                .with_fetch_settings(config.retry.fetch_settings());
            Pipeline::new(job, batch.clone(), Arc::clone(&source.transformer), Arc::clone(&sink))
        })
        .collect();

    let summary = Orchestrator::new(pipelines).run(mode, !args.no_combine).await?;

    for (name, upload) in &summary.outputs {
        info!(source = %name, key = %upload.key, bytes = upload.size, "Wrote output");
    }
    if let Some(combined) = &summary.combined {
        info!(key = %combined.key, bytes = combined.size, "Wrote combined output");
    }

    Ok(summary)
}
