//! Extract, transform and load for a single source
//!
//! A [`Pipeline`] moves through `Created -> Extracted -> Transformed -> Loaded`.
//! Any failing phase leaves it in `Failed`.

pub mod job;
pub mod traits;

pub use job::PipelineJob;
pub use traits::{TransformError, Transformer};

use polars::prelude::DataFrame;
use std::fmt;
use std::mem;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::fetch::{BatchFetcher, FetchError, FetchResult};
use crate::storage::{Sink, SinkError, UploadMetadata, output_file_name};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("extract failed: {0}")]
    Extract(#[from] FetchError),

    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error("load failed: {0}")]
    Load(#[from] SinkError),

    #[error("cannot {phase} a pipeline in state {state}")]
    OutOfOrder { phase: &'static str, state: &'static str },
}

/// Pipeline lifecycle; each state owns the data produced by the previous phase
#[derive(Debug, Default)]
pub enum PipelineState {
    #[default]
    Created,
    Extracted(Vec<FetchResult>),
    Transformed(DataFrame),
    Loaded { frame: DataFrame, upload: UploadMetadata },
    Failed,
}

impl PipelineState {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Created => "created",
            PipelineState::Extracted(_) => "extracted",
            PipelineState::Transformed(_) => "transformed",
            PipelineState::Loaded { .. } => "loaded",
            PipelineState::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub struct Pipeline {
    job: PipelineJob,
    fetcher: BatchFetcher,
    transformer: Arc<dyn Transformer>,
    sink: Arc<dyn Sink>,
    state: PipelineState,
}

impl Pipeline {
    pub fn new(
        job: PipelineJob,
        fetcher: BatchFetcher,
        transformer: Arc<dyn Transformer>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        Self {
            job,
            fetcher,
            transformer,
            sink,
            state: PipelineState::Created,
        }
    }

    pub fn name(&self) -> &str {
        &self.job.name
    }

    pub fn job(&self) -> &PipelineJob {
        &self.job
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }

    /// Frame produced by `transform`, available once transformed or loaded
    pub fn frame(&self) -> Option<&DataFrame> {
        match &self.state {
            PipelineState::Transformed(frame) | PipelineState::Loaded { frame, .. } => Some(frame),
            _ => None,
        }
    }

    /// Upload metadata, available once loaded
    pub fn upload(&self) -> Option<&UploadMetadata> {
        match &self.state {
            PipelineState::Loaded { upload, .. } => Some(upload),
            _ => None,
        }
    }

    pub async fn extract(&mut self) -> Result<(), PipelineError> {
        if !matches!(self.state, PipelineState::Created) {
            return Err(self.out_of_order("extract"));
        }

        info!(
            source = %self.job.name,
            "Extracting {} data for date range {}", self.job.name, self.job.date_range
        );

        let fetched = self
            .fetcher
            .fetch_range(
                &self.job.url_template,
                &self.job.date_range,
                self.job.fetch.initial_backoff,
                self.job.fetch.max_retries,
            )
            .await;

        match fetched {
            Ok(payloads) => {
                self.state = PipelineState::Extracted(payloads);
                Ok(())
            }
            Err(e) => Err(self.fail("extract", e.into())),
        }
    }

    pub fn transform(&mut self) -> Result<(), PipelineError> {
        let payloads = match mem::take(&mut self.state) {
            PipelineState::Extracted(payloads) => payloads,
            other => {
                self.state = other;
                return Err(self.out_of_order("transform"));
            }
        };

        info!(
            source = %self.job.name,
            "Transforming {} data for date range {}", self.job.name, self.job.date_range
        );

        match self.transformer.transform(&payloads) {
            Ok(frame) => {
                self.state = PipelineState::Transformed(frame);
                Ok(())
            }
            Err(e) => Err(self.fail("transform", e.into())),
        }
    }

    pub async fn load(&mut self) -> Result<(), PipelineError> {
        let frame = match mem::take(&mut self.state) {
            PipelineState::Transformed(frame) => frame,
            other => {
                self.state = other;
                return Err(self.out_of_order("load"));
            }
        };

        info!(
            source = %self.job.name,
            "Loading {} data for date range {}", self.job.name, self.job.date_range
        );

        let file_name = output_file_name(&self.job.name, &self.job.date_range, self.job.format);
        match self.sink.write(&frame, &file_name, self.job.format).await {
            Ok(upload) => {
                self.state = PipelineState::Loaded { frame, upload };
                Ok(())
            }
            Err(e) => Err(self.fail("load", e.into())),
        }
    }

    /// Extract, transform and load, stopping at the first failure
    pub async fn run(&mut self) -> Result<(), PipelineError> {
        self.extract().await?;
        self.transform()?;
        self.load().await
    }

    fn out_of_order(&self, phase: &'static str) -> PipelineError {
        PipelineError::OutOfOrder {
            phase,
            state: self.state.name(),
        }
    }

    fn fail(&mut self, phase: &'static str, err: PipelineError) -> PipelineError {
        error!(source = %self.job.name, phase, error = %err, "Pipeline failed");
        self.state = PipelineState::Failed;
        err
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("job", &self.job)
            .field("state", &self.state.name())
            .finish()
    }
}
