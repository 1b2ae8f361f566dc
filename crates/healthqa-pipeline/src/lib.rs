pub mod artifacts;
pub mod batch;
pub mod config;
pub mod errors;
pub mod pipeline;
pub mod report;
pub mod sample;
pub mod sources;

pub use artifacts::{
    ArtifactPaths, ArtifactSink, CLEANED_FILE, FsArtifactSink, REPORT_JSON_FILE, REPORT_MD_FILE,
    write_dataset_csv, write_json_atomic,
};
pub use batch::{BatchReport, BatchSummary, SourceJobResult, batch_process};
pub use config::{AppConfig, DEFAULT_CONFIG_FILE, DEFAULT_OUTPUT_DIR};
pub use errors::{PipelineError, Result};
pub use pipeline::{HealthcarePipeline, ProcessedDataset, SourceRun};
pub use report::{CleaningSection, CombinedReport, RunSummary, render_report};
pub use sample::{
    DEFAULT_SAMPLE_RECORDS, DEFAULT_SAMPLE_SEED, MAX_SAMPLE_RECORDS, SAMPLE_COLUMNS,
    generate_sample,
};
pub use sources::{
    FileLoader, LoaderRegistry, SampleLoader, SourceDefinition, SourceLoader, SourceType,
    read_csv, read_json,
};
