//! Run one or all pipelines and optionally merge their frames

use polars::prelude::{DataFrame, IntoLazy, PolarsError, lit};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::frame::concat_diagonal;
use crate::pipeline::{Pipeline, PipelineError};
use crate::storage::{SinkError, UploadMetadata, output_file_name};

/// File prefix of the merged output
pub const COMBINED_PREFIX: &str = "combined";
/// Column tagging each merged row with its job name
pub const SOURCE_COLUMN: &str = "source";

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("no pipelines to run")]
    NoJobs,

    #[error("unknown source '{0}'")]
    UnknownSource(String),

    #[error("job {name} failed: {source}")]
    Job {
        name: String,
        #[source]
        source: PipelineError,
    },

    #[error("job task failed: {0}")]
    TaskFailed(String),

    #[error("failed to combine outputs: {0}")]
    Combine(#[from] PolarsError),

    #[error("failed to write combined output: {0}")]
    Sink(#[from] SinkError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Run exactly the named job
    Single(String),
    /// Run every job concurrently
    All,
}

/// Outputs of a successful run, per job in job order
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub outputs: Vec<(String, UploadMetadata)>,
    pub combined: Option<UploadMetadata>,
}

pub struct Orchestrator {
    pipelines: Vec<Pipeline>,
}

impl Orchestrator {
    pub fn new(pipelines: Vec<Pipeline>) -> Self {
        Self { pipelines }
    }

    /// Run according to `mode`.
    ///
    /// `combine` only applies to [`RunMode::All`]: once every job is loaded the
    /// frames are tagged with [`SOURCE_COLUMN`], concatenated in job order and
    /// written through the first job's sink under [`COMBINED_PREFIX`].
    pub async fn run(self, mode: RunMode, combine: bool) -> Result<RunSummary, OrchestratorError> {
        match mode {
            RunMode::Single(name) => self.run_single(&name).await,
            RunMode::All => self.run_all(combine).await,
        }
    }

    async fn run_single(self, name: &str) -> Result<RunSummary, OrchestratorError> {
        let mut pipeline = self
            .pipelines
            .into_iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| OrchestratorError::UnknownSource(name.to_string()))?;

        pipeline.run().await.map_err(|source| OrchestratorError::Job {
            name: name.to_string(),
            source,
        })?;

        Ok(RunSummary {
            outputs: collect_outputs(std::slice::from_ref(&pipeline)),
            combined: None,
        })
    }

    async fn run_all(self, combine: bool) -> Result<RunSummary, OrchestratorError> {
        if self.pipelines.is_empty() {
            return Err(OrchestratorError::NoJobs);
        }

        let total = self.pipelines.len();
        info!(jobs = total, combine, "Running all pipelines");

        let mut tasks = JoinSet::new();
        for (index, mut pipeline) in self.pipelines.into_iter().enumerate() {
            tasks.spawn(async move {
                let result = pipeline.run().await;
                (index, pipeline, result)
            });
        }

        let mut slots: Vec<Option<Pipeline>> = (0..total).map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, pipeline, Ok(()))) => slots[index] = Some(pipeline),
                Ok((_, pipeline, Err(source))) => {
                    tasks.abort_all();
                    error!(source = %pipeline.name(), "Aborting remaining pipelines");
                    return Err(OrchestratorError::Job {
                        name: pipeline.name().to_string(),
                        source,
                    });
                }
                Err(join_error) => {
                    tasks.abort_all();
                    return Err(OrchestratorError::TaskFailed(join_error.to_string()));
                }
            }
        }

        let pipelines: Vec<Pipeline> = slots.into_iter().flatten().collect();
        let outputs = collect_outputs(&pipelines);

        let combined = if combine {
            Some(write_combined(&pipelines).await?)
        } else {
            None
        };

        Ok(RunSummary { outputs, combined })
    }
}

fn collect_outputs(pipelines: &[Pipeline]) -> Vec<(String, UploadMetadata)> {
    pipelines
        .iter()
        .filter_map(|p| p.upload().map(|upload| (p.name().to_string(), upload.clone())))
        .collect()
}

/// Tag every loaded frame with its job name and concatenate in job order
pub fn combine_frames(pipelines: &[Pipeline]) -> Result<DataFrame, PolarsError> {
    let tagged = pipelines.iter().filter_map(|p| {
        p.frame()
            .map(|frame| frame.clone().lazy().with_column(lit(p.name()).alias(SOURCE_COLUMN)))
    });

    concat_diagonal(tagged)
}

async fn write_combined(pipelines: &[Pipeline]) -> Result<UploadMetadata, OrchestratorError> {
    let first = pipelines.first().ok_or(OrchestratorError::NoJobs)?;

    let date_range = pipelines
        .iter()
        .skip(1)
        .fold(first.job().date_range.clone(), |range, p| range.union(&p.job().date_range));

    info!("Combining {} sources for date range {}", pipelines.len(), date_range);

    let frame = combine_frames(pipelines)?;
    let format = first.job().format;
    let file_name = output_file_name(COMBINED_PREFIX, &date_range, format);

    Ok(first.sink().write(&frame, &file_name, format).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_all_without_jobs_fails() {
        let err = Orchestrator::new(Vec::new()).run(RunMode::All, true).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::NoJobs));
    }

    #[tokio::test]
    async fn test_single_unknown_source_fails() {
        let err = Orchestrator::new(Vec::new())
            .run(RunMode::Single("tidal".to_string()), false)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::UnknownSource(name) if name == "tidal"));
    }
}
