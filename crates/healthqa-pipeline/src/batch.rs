use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::artifacts::{ArtifactPaths, ArtifactSink};
use crate::pipeline::HealthcarePipeline;
use crate::report::CombinedReport;
use crate::sources::{SourceDefinition, SourceType};

/// Per-source outcome: a full result bundle or an error, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceJobResult {
    Success {
        source_type: SourceType,
        dataset_name: String,
        report: Box<CombinedReport>,
        artifacts: ArtifactPaths,
    },
    Failure {
        source_type: SourceType,
        dataset_name: String,
        error: String,
    },
}

impl SourceJobResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SourceJobResult::Success { .. })
    }

    pub fn dataset_name(&self) -> &str {
        match self {
            SourceJobResult::Success { dataset_name, .. }
            | SourceJobResult::Failure { dataset_name, .. } => dataset_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_sources: usize,
    pub processed_successfully: usize,
    pub failed_processing: usize,
    /// `processed_successfully / total_sources`, 0 for an empty batch.
    pub success_rate: f64,
}

impl BatchSummary {
    pub fn from_results(results: &[SourceJobResult]) -> Self {
        let total_sources = results.len();
        let processed_successfully = results.iter().filter(|result| result.is_success()).count();
        let success_rate = if total_sources == 0 {
            0.0
        } else {
            processed_successfully as f64 / total_sources as f64
        };
        Self {
            total_sources,
            processed_successfully,
            failed_processing: total_sources - processed_successfully,
            success_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub per_source: Vec<SourceJobResult>,
    pub summary: BatchSummary,
}

/// Run every source in input order. Errors and panics inside one source become
/// that source's failure; the batch always completes.
pub fn batch_process(
    pipeline: &HealthcarePipeline,
    sources: &[SourceDefinition],
    sink: &dyn ArtifactSink,
) -> BatchReport {
    info!(sources = sources.len(), "batch started");

    let mut per_source = Vec::with_capacity(sources.len());
    for source in sources {
        let outcome = catch_unwind(AssertUnwindSafe(|| pipeline.run_source(source, sink)));
        let result = match outcome {
            Ok(Ok(run)) => {
                info!(dataset = %source.dataset_name, "source processed");
                SourceJobResult::Success {
                    source_type: source.source_type,
                    dataset_name: source.dataset_name.clone(),
                    report: Box::new(run.report),
                    artifacts: run.artifacts,
                }
            }
            Ok(Err(err)) => {
                warn!(dataset = %source.dataset_name, error = %err, "source failed");
                SourceJobResult::Failure {
                    source_type: source.source_type,
                    dataset_name: source.dataset_name.clone(),
                    error: err.to_string(),
                }
            }
            Err(panic) => {
                let message = panic_message(panic);
                warn!(dataset = %source.dataset_name, error = %message, "source panicked");
                SourceJobResult::Failure {
                    source_type: source.source_type,
                    dataset_name: source.dataset_name.clone(),
                    error: format!("panic: {message}"),
                }
            }
        };
        per_source.push(result);
    }

    let summary = BatchSummary::from_results(&per_source);
    info!(
        total = summary.total_sources,
        succeeded = summary.processed_successfully,
        failed = summary.failed_processing,
        "batch finished"
    );
    BatchReport {
        per_source,
        summary,
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic while processing source".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(name: &str) -> SourceJobResult {
        SourceJobResult::Failure {
            source_type: SourceType::Csv,
            dataset_name: name.to_string(),
            error: "boom".to_string(),
        }
    }

    #[test]
    fn empty_batch_summary_is_all_zero() {
        let summary = BatchSummary::from_results(&[]);
        assert_eq!(
            summary,
            BatchSummary {
                total_sources: 0,
                processed_successfully: 0,
                failed_processing: 0,
                success_rate: 0.0,
            }
        );
    }

    #[test]
    fn failures_count_against_success_rate() {
        let summary = BatchSummary::from_results(&[failure("a"), failure("b")]);
        assert_eq!(summary.failed_processing, 2);
        assert_eq!(summary.success_rate, 0.0);
    }

    #[test]
    fn panic_payloads_become_messages() {
        let payload: Box<dyn Any + Send> = Box::new("loader exploded");
        assert_eq!(panic_message(payload), "loader exploded");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload), "owned");
    }
}
