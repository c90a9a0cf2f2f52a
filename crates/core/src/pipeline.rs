//! Handles to the per-source upload pipelines of one build

use std::fmt;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::error;

/// Where a batch of files comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchSource {
    /// The primary directory
    Directory(PathBuf),
    /// The bundler's emitted assets
    Assets,
    /// One of the configured static directories
    StaticDir(PathBuf),
}

impl fmt::Display for BatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchSource::Directory(dir) => write!(f, "directory {}", dir.display()),
            BatchSource::Assets => write!(f, "assets"),
            BatchSource::StaticDir(dir) => write!(f, "static directory {}", dir.display()),
        }
    }
}

/// Stages a batch goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Enumerating,
    Filtering,
    Uploading,
    Done,
    Errored,
}

/// How a pipeline ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every filtered file was uploaded
    Done { source: BatchSource, uploaded: usize },
    /// The batch failed. Failures inside the batch are recorded on the
    /// build; a panic of the pipeline task itself is only reported here.
    Errored { source: BatchSource },
    /// The pipeline was aborted before it finished
    Cancelled { source: BatchSource },
}

impl BatchOutcome {
    pub fn source(&self) -> &BatchSource {
        match self {
            BatchOutcome::Done { source, .. }
            | BatchOutcome::Errored { source }
            | BatchOutcome::Cancelled { source } => source,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, BatchOutcome::Done { .. })
    }
}

/// A running pipeline
#[derive(Debug)]
pub struct Pipeline {
    source: BatchSource,
    handle: JoinHandle<BatchOutcome>,
}

impl Pipeline {
    pub fn new(source: BatchSource, handle: JoinHandle<BatchOutcome>) -> Self {
        Self { source, handle }
    }

    pub fn source(&self) -> &BatchSource {
        &self.source
    }

    pub async fn join(self) -> BatchOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => BatchOutcome::Cancelled {
                source: self.source,
            },
            Err(e) => {
                error!(source = %self.source, error = %e, "Pipeline task failed");
                BatchOutcome::Errored {
                    source: self.source,
                }
            }
        }
    }
}

/// The pipelines started by one build-complete event.
///
/// Dropping the set detaches the pipelines; they still run to completion.
#[derive(Debug, Default)]
pub struct PipelineSet {
    pipelines: Vec<Pipeline>,
}

impl PipelineSet {
    pub fn new(pipelines: Vec<Pipeline>) -> Self {
        Self { pipelines }
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub fn sources(&self) -> Vec<&BatchSource> {
        self.pipelines.iter().map(Pipeline::source).collect()
    }

    /// Cancel every pipeline that has not finished yet.
    pub fn abort(&self) {
        for pipeline in &self.pipelines {
            pipeline.handle.abort();
        }
    }

    /// Wait for every pipeline, in start order.
    pub async fn join(self) -> Vec<BatchOutcome> {
        futures::future::join_all(self.pipelines.into_iter().map(Pipeline::join)).await
    }
}
