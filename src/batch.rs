//! Batch execution of the pipeline with per-item failure isolation.
//!
//! [`BatchRunner`] drives one [`SpeechPipeline`] run per input item. A
//! failing item is captured as that item's result and never aborts its
//! siblings; results come back in input order regardless of how items were
//! scheduled.

use crate::audio::AudioData;
use crate::defaults;
use crate::error::VoxbridgeError;
use crate::pipeline::{ProcessedAudio, SpeechPipeline};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// A captured per-item failure, with the originating input preserved.
#[derive(Debug)]
pub struct BatchItemFailure {
    pub input: AudioData,
    pub error: VoxbridgeError,
}

/// Outcome of one batch item.
#[derive(Debug)]
pub struct BatchItemResult {
    /// Position of the item in the input sequence.
    pub index: usize,
    pub outcome: std::result::Result<ProcessedAudio, BatchItemFailure>,
}

impl BatchItemResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn processed(&self) -> Option<&ProcessedAudio> {
        self.outcome.as_ref().ok()
    }

    pub fn failure(&self) -> Option<&BatchItemFailure> {
        self.outcome.as_ref().err()
    }
}

/// Drives independent per-item pipeline executions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRunner {
    parallelism: usize,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self {
            parallelism: defaults::BATCH_PARALLELISM,
        }
    }
}

impl BatchRunner {
    /// Sequential runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner executing up to `parallelism` items concurrently.
    ///
    /// Parallelism is a throughput knob, not a correctness requirement;
    /// results are reassembled into input order either way.
    pub fn with_parallelism(parallelism: usize) -> Self {
        Self {
            parallelism: parallelism.max(1),
        }
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Runs the pipeline over every item, continuing on error.
    ///
    /// The returned sequence has the same length and order as `items`; an
    /// empty input is a no-op success with zero results.
    pub async fn run(
        &self,
        pipeline: Arc<SpeechPipeline>,
        items: Vec<AudioData>,
    ) -> Vec<BatchItemResult> {
        if items.is_empty() {
            return Vec::new();
        }

        if self.parallelism <= 1 {
            let mut results = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                results.push(run_item(&pipeline, index, item).await);
            }
            return results;
        }

        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let mut handles = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let pipeline = pipeline.clone();
            let semaphore = semaphore.clone();
            handles.push(tokio::spawn(async move {
                // Closed semaphore is unreachable: the Arc lives in this task
                let _permit = semaphore.acquire_owned().await;
                run_item(&pipeline, index, item).await
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(result) => results.push(result),
                Err(join_error) => {
                    // A panicked task loses its input payload; record the
                    // failure so the batch still returns one result per item.
                    tracing::warn!(index, error = %join_error, "batch item task panicked");
                    results.push(BatchItemResult {
                        index,
                        outcome: Err(BatchItemFailure {
                            input: AudioData::linear16(Vec::new()),
                            error: VoxbridgeError::Audio {
                                message: format!("batch item task panicked: {}", join_error),
                            },
                        }),
                    });
                }
            }
        }
        results.sort_by_key(|result| result.index);
        results
    }
}

async fn run_item(pipeline: &SpeechPipeline, index: usize, item: AudioData) -> BatchItemResult {
    match pipeline.process(&item).await {
        Ok(processed) => BatchItemResult {
            index,
            outcome: Ok(processed),
        },
        Err(error) => {
            tracing::warn!(index, error = %error, "batch item failed");
            BatchItemResult {
                index,
                outcome: Err(BatchItemFailure { input: item, error }),
            }
        }
    }
}

/// Aggregate view over one batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Mean confidence over successful items; `None` when none succeeded.
    pub mean_confidence: Option<f32>,
    /// Sum of per-item pipeline durations.
    pub total_elapsed: Duration,
}

impl BatchSummary {
    pub fn of(results: &[BatchItemResult]) -> Self {
        let succeeded: Vec<&ProcessedAudio> =
            results.iter().filter_map(|r| r.processed()).collect();
        let mean_confidence = if succeeded.is_empty() {
            None
        } else {
            let sum: f32 = succeeded.iter().map(|p| p.confidence).sum();
            Some(sum / succeeded.len() as f32)
        };
        Self {
            total: results.len(),
            succeeded: succeeded.len(),
            failed: results.len() - succeeded.len(),
            mean_confidence,
            total_elapsed: succeeded.iter().map(|p| p.elapsed).sum(),
        }
    }
}

/// Row status in a batch export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportStatus {
    Ok,
    Failed,
}

/// One exportable record per batch item, ready for tabular rendering.
///
/// Rendering (CSV, HTML, CLI) is a downstream concern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub index: usize,
    pub status: ExportStatus,
    /// Excerpt of the transcript, or of the error for failed items.
    pub transcript_excerpt: String,
    pub processed_excerpt: String,
    pub confidence: Option<f32>,
    pub duration_ms: u64,
}

/// Builds export rows in item order, one per result.
pub fn export_rows(results: &[BatchItemResult]) -> Vec<ExportRow> {
    results
        .iter()
        .map(|result| match &result.outcome {
            Ok(processed) => ExportRow {
                index: result.index,
                status: ExportStatus::Ok,
                transcript_excerpt: excerpt(&processed.transcript),
                processed_excerpt: excerpt(&processed.processed_text),
                confidence: Some(processed.confidence),
                duration_ms: processed.elapsed.as_millis() as u64,
            },
            Err(failure) => ExportRow {
                index: result.index,
                status: ExportStatus::Failed,
                transcript_excerpt: excerpt(&failure.error.to_string()),
                processed_excerpt: String::new(),
                confidence: None,
                duration_ms: 0,
            },
        })
        .collect()
}

/// Truncates text to the export column width, marking the cut.
fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(defaults::EXCERPT_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}
