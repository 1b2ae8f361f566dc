use std::path::Path;

use chrono::Utc;
use healthqa_clean::{Cleaner, CleaningConfig, CleaningOutcome};
use healthqa_core::Dataset;
use healthqa_eval::{RiskAssessment, RiskAssessor, ValidationResult, Validator};
use tracing::info;
use uuid::Uuid;

use crate::artifacts::{ArtifactPaths, ArtifactSink, FsArtifactSink};
use crate::batch::{BatchReport, batch_process};
use crate::config::AppConfig;
use crate::errors::Result;
use crate::report::{CombinedReport, RunSummary};
use crate::sources::{LoaderRegistry, SourceDefinition, SourceType};

/// Cleaned dataset plus the report describing how it was produced.
#[derive(Debug, Clone)]
pub struct ProcessedDataset {
    pub cleaned: Dataset,
    pub report: CombinedReport,
}

/// Outcome of a persisted source run.
#[derive(Debug, Clone)]
pub struct SourceRun {
    pub report: CombinedReport,
    pub artifacts: ArtifactPaths,
}

/// Validator, cleaner and risk assessor bound to one configuration.
pub struct HealthcarePipeline {
    validator: Validator,
    cleaner: Cleaner,
    assessor: RiskAssessor,
    cleaning: CleaningConfig,
    loaders: LoaderRegistry,
}

impl HealthcarePipeline {
    /// Build a pipeline; every config section is checked up front.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let catalog = config.catalog.compile()?;
        config.cleaning.validate()?;
        Ok(Self {
            validator: Validator::new(catalog.clone(), &config.validation)?,
            cleaner: Cleaner::new(catalog.clone()),
            assessor: RiskAssessor::new(catalog, &config.risk)?,
            cleaning: config.cleaning.clone(),
            loaders: LoaderRegistry::default(),
        })
    }

    pub fn with_loaders(mut self, loaders: LoaderRegistry) -> Self {
        self.loaders = loaders;
        self
    }

    pub fn loaders(&self) -> &LoaderRegistry {
        &self.loaders
    }

    pub fn validate_data(&self, dataset: &Dataset) -> ValidationResult {
        self.validator.validate(dataset)
    }

    /// Clean with the configured steps.
    pub fn clean_data(&self, dataset: &Dataset) -> Result<CleaningOutcome> {
        self.clean_data_with(dataset, &self.cleaning)
    }

    pub fn clean_data_with(
        &self,
        dataset: &Dataset,
        config: &CleaningConfig,
    ) -> Result<CleaningOutcome> {
        Ok(self.cleaner.clean(dataset, config)?)
    }

    pub fn assess_risks(&self, dataset: &Dataset) -> RiskAssessment {
        self.assessor.assess(dataset)
    }

    /// Validate the raw data, clean it, then assess the cleaned result.
    pub fn process_dataset(&self, dataset_name: &str, dataset: &Dataset) -> Result<ProcessedDataset> {
        self.process(dataset_name, None, dataset)
    }

    /// Load, process and persist one source.
    pub fn run_source(&self, source: &SourceDefinition, sink: &dyn ArtifactSink) -> Result<SourceRun> {
        source.validate()?;
        let dataset = self.loaders.load(source)?;
        let processed = self.process(&source.dataset_name, Some(source.source_type), &dataset)?;
        let artifacts = sink.persist(&source.dataset_name, &processed.cleaned, &processed.report)?;
        Ok(SourceRun {
            report: processed.report,
            artifacts,
        })
    }

    /// Process every source in order, writing artifacts below `output_dir`.
    pub fn batch_process(&self, sources: &[SourceDefinition], output_dir: &Path) -> BatchReport {
        let sink = FsArtifactSink::new(output_dir);
        self.batch_process_sources(sources, &sink)
    }

    pub fn batch_process_sources(
        &self,
        sources: &[SourceDefinition],
        sink: &dyn ArtifactSink,
    ) -> BatchReport {
        batch_process(self, sources, sink)
    }

    fn process(
        &self,
        dataset_name: &str,
        source_type: Option<SourceType>,
        dataset: &Dataset,
    ) -> Result<ProcessedDataset> {
        let run_id = Uuid::new_v4();
        info!(
            run_id = %run_id,
            dataset = %dataset_name,
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "processing dataset"
        );

        let validation = self.validate_data(dataset);
        let outcome = self.clean_data(dataset)?;
        let risk_assessment = self.assess_risks(&outcome.dataset);

        let summary = RunSummary {
            run_id,
            dataset_name: dataset_name.to_string(),
            source_type,
            total_records: dataset.row_count(),
            processing_date: Utc::now(),
        };
        let report = CombinedReport::new(
            summary,
            validation,
            outcome.summary,
            outcome.report,
            risk_assessment,
        );
        Ok(ProcessedDataset {
            cleaned: outcome.dataset,
            report,
        })
    }
}
