mod logging;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use healthqa_eval::Severity;
use healthqa_pipeline::{
    AppConfig, ArtifactSink, BatchReport, CombinedReport, DEFAULT_CONFIG_FILE, DEFAULT_SAMPLE_RECORDS,
    DEFAULT_SAMPLE_SEED, FsArtifactSink, HealthcarePipeline, MAX_SAMPLE_RECORDS, PipelineError,
    SourceDefinition, SourceJobResult, SourceType, generate_sample, write_dataset_csv,
    write_json_atomic,
};
use logging::init_logging;
use thiserror::Error;

const BATCH_SUMMARY_FILE: &str = "batch_summary.json";
const SAMPLE_FILE: &str = "sample_healthcare_data.csv";
const DEMO_DATA_FILE: &str = "demo_data.csv";
const DEMO_DATASET: &str = "demo_dataset";

#[derive(Debug, Error)]
enum CliError {
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("core error: {0}")]
    Core(#[from] healthqa_core::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

#[derive(Parser, Debug)]
#[command(name = "healthqa", version, about = "Healthcare data quality pipeline")]
struct Cli {
    /// Configuration file; defaults are used when it does not exist.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Output directory (overrides `output_dir` from the config file).
    #[arg(long, global = true)]
    output: Option<PathBuf>,
    /// Enable debug logging.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load, validate, clean and assess one source.
    Run(RunArgs),
    /// Process every `[[batch_sources]]` entry of the config file.
    Batch,
    /// Run the full pipeline on the synthetic sample.
    Demo,
    /// Write the synthetic sample dataset as CSV.
    CreateSample(CreateSampleArgs),
    /// Check the config file without processing data.
    ValidateConfig,
    /// List the supported source types.
    ListSources,
    /// Print the JSON Schema of the config file.
    EmitSchema,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Source type (cdc, cms, fda, mimic, eicu, uci_heart, csv, json, sample).
    #[arg(long)]
    source: SourceType,
    /// Dataset name; also the artifact directory name.
    #[arg(long)]
    name: String,
    /// Input file for file-backed sources.
    #[arg(long)]
    path: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CreateSampleArgs {
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RECORDS, value_parser = parse_sample_records)]
    records: usize,
    #[arg(long, default_value_t = DEFAULT_SAMPLE_SEED)]
    seed: u64,
    /// File name inside the output directory.
    #[arg(long, default_value = SAMPLE_FILE)]
    file: PathBuf,
}

fn parse_sample_records(raw: &str) -> Result<usize, String> {
    let records: usize = raw
        .parse()
        .map_err(|err| format!("invalid record count '{raw}': {err}"))?;
    if records > MAX_SAMPLE_RECORDS {
        return Err(format!("record count must be at most {MAX_SAMPLE_RECORDS}"));
    }
    Ok(records)
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::ListSources => {
            init_logging(cli.verbose, None).map_err(CliError::Logging)?;
            list_sources();
            Ok(())
        }
        Command::EmitSchema => {
            init_logging(cli.verbose, None).map_err(CliError::Logging)?;
            emit_schema()
        }
        Command::ValidateConfig => {
            init_logging(cli.verbose, None).map_err(CliError::Logging)?;
            validate_config(&cli.config)
        }
        command => {
            let config = AppConfig::load_or_default(&cli.config)?;
            let output_dir = cli.output.unwrap_or_else(|| config.output_dir.clone());
            init_logging(cli.verbose, Some(&output_dir)).map_err(CliError::Logging)?;
            tracing::info!(
                event = "cli_started",
                config = %cli.config.display(),
                output = %output_dir.display()
            );

            match command {
                Command::Run(args) => run_single(&config, &output_dir, args),
                Command::Batch => run_batch(&config, &output_dir),
                Command::Demo => run_demo(&config, &output_dir),
                Command::CreateSample(args) => create_sample(&output_dir, args),
                Command::ListSources | Command::EmitSchema | Command::ValidateConfig => Ok(()),
            }
        }
    }
}

fn list_sources() {
    println!("Available data sources:");
    for source in SourceType::ALL {
        println!("- {}: {}", source.as_str(), source.description());
    }
}

fn emit_schema() -> Result<(), CliError> {
    let schema = schemars::schema_for!(AppConfig);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn validate_config(path: &Path) -> Result<(), CliError> {
    let config = AppConfig::load(path)?;
    config.validate()?;
    HealthcarePipeline::new(&config)?;
    println!("Configuration file '{}' is valid", path.display());
    println!("  batch sources: {}", config.batch_sources.len());
    Ok(())
}

fn run_single(config: &AppConfig, output_dir: &Path, args: RunArgs) -> Result<(), CliError> {
    let RunArgs { source, name, path } = args;
    let mut definition = SourceDefinition::new(source, &name);
    if let Some(path) = path {
        definition = definition.with_param("path", path.display().to_string());
    }

    let pipeline = HealthcarePipeline::new(config)?;
    let sink = FsArtifactSink::new(output_dir);
    let run = pipeline.run_source(&definition, &sink)?;

    print_report_summary(&run.report);
    println!("Files created:");
    println!("  cleaned data: {}", run.artifacts.cleaned_csv.display());
    println!("  report: {}", run.artifacts.report_json.display());
    println!("  markdown: {}", run.artifacts.report_md.display());
    Ok(())
}

fn run_batch(config: &AppConfig, output_dir: &Path) -> Result<(), CliError> {
    config.validate()?;
    if config.batch_sources.is_empty() {
        tracing::warn!(event = "batch_empty", "no batch_sources configured");
    }

    let pipeline = HealthcarePipeline::new(config)?;
    let report = pipeline.batch_process(&config.batch_sources, output_dir);

    let summary_path = output_dir.join(BATCH_SUMMARY_FILE);
    write_json_atomic(&summary_path, &report)?;
    tracing::info!(event = "batch_summary_written", path = %summary_path.display());

    print_batch_summary(&report);
    println!("Summary: {}", summary_path.display());
    Ok(())
}

fn run_demo(config: &AppConfig, output_dir: &Path) -> Result<(), CliError> {
    let dataset = generate_sample(DEFAULT_SAMPLE_RECORDS, DEFAULT_SAMPLE_SEED)?;
    let sample_path = output_dir.join(DEMO_DATA_FILE);
    write_dataset_csv(&sample_path, &dataset)?;
    println!("Created sample data: {} records", dataset.row_count());

    let pipeline = HealthcarePipeline::new(config)?;
    let processed = pipeline.process_dataset(DEMO_DATASET, &dataset)?;
    let sink = FsArtifactSink::new(output_dir);
    let artifacts = sink.persist(DEMO_DATASET, &processed.cleaned, &processed.report)?;

    print_report_summary(&processed.report);
    println!("Files created:");
    println!("  sample data: {}", sample_path.display());
    println!("  cleaned data: {}", artifacts.cleaned_csv.display());
    println!("  report: {}", artifacts.report_json.display());
    println!("  markdown: {}", artifacts.report_md.display());
    Ok(())
}

fn create_sample(output_dir: &Path, args: CreateSampleArgs) -> Result<(), CliError> {
    if args.file.as_os_str().is_empty() {
        return Err(CliError::InvalidArgs("--file must not be empty".to_string()));
    }
    let dataset = generate_sample(args.records, args.seed)?;
    let path = output_dir.join(&args.file);
    write_dataset_csv(&path, &dataset)?;

    println!("Sample data created: {}", path.display());
    println!("  records: {}", dataset.row_count());
    println!("  columns: {}", dataset.columns().join(", "));
    Ok(())
}

fn print_report_summary(report: &CombinedReport) {
    let cleaning = &report.cleaning.summary;
    let risks = &report.risk_assessment.summary;
    let critical = risks
        .severity_distribution
        .get(&Severity::Critical)
        .copied()
        .unwrap_or(0);

    println!("Results for '{}':", report.summary.dataset_name);
    println!("  original records: {}", cleaning.records_before);
    println!("  cleaned records: {}", cleaning.records_after);
    println!("  quality score: {:.3}", report.validation.overall_score);
    println!("  total risks: {}", risks.total_risks);
    println!("  critical risks: {critical}");
}

fn print_batch_summary(report: &BatchReport) {
    let summary = &report.summary;
    println!("Batch processing results:");
    println!("  total sources: {}", summary.total_sources);
    println!("  processed successfully: {}", summary.processed_successfully);
    println!("  failed: {}", summary.failed_processing);
    println!("  success rate: {:.1}%", summary.success_rate * 100.0);
    for result in &report.per_source {
        match result {
            SourceJobResult::Success { dataset_name, .. } => {
                println!("  [ok] {dataset_name}");
            }
            SourceJobResult::Failure {
                dataset_name,
                error,
                ..
            } => {
                println!("  [failed] {dataset_name}: {error}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_apply_after_subcommand() {
        let cli = Cli::try_parse_from([
            "healthqa",
            "run",
            "--source",
            "uci-heart",
            "--name",
            "heart",
            "--output",
            "reports",
            "--verbose",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.output, Some(PathBuf::from("reports")));
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.source, SourceType::UciHeart);
                assert_eq!(args.name, "heart");
                assert!(args.path.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_source_type_is_rejected() {
        let result = Cli::try_parse_from(["healthqa", "run", "--source", "nhs", "--name", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn create_sample_defaults() {
        let cli = Cli::try_parse_from(["healthqa", "create-sample"]).unwrap();
        match cli.command {
            Command::CreateSample(args) => {
                assert_eq!(args.records, DEFAULT_SAMPLE_RECORDS);
                assert_eq!(args.seed, DEFAULT_SAMPLE_SEED);
                assert_eq!(args.file, PathBuf::from(SAMPLE_FILE));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn create_sample_rejects_oversized_record_counts() {
        let result = Cli::try_parse_from(["healthqa", "create-sample", "--records", "1000000000000"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from(["healthqa", "create-sample", "--records", "250"]).unwrap();
        match cli.command {
            Command::CreateSample(args) => assert_eq!(args.records, 250),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn create_sample_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let args = CreateSampleArgs {
            records: 12,
            seed: 3,
            file: PathBuf::from("sample.csv"),
        };
        create_sample(dir.path(), args).unwrap();

        let dataset = healthqa_pipeline::read_csv(&dir.path().join("sample.csv")).unwrap();
        assert_eq!(dataset.row_count(), 12);
        assert_eq!(dataset.column_count(), healthqa_pipeline::SAMPLE_COLUMNS.len());
    }

    #[test]
    fn batch_writes_summary_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.batch_sources = vec![
            SourceDefinition::new(SourceType::Sample, "synthetic").with_param("records", 8u64),
        ];
        run_batch(&config, dir.path()).unwrap();

        let text = std::fs::read_to_string(dir.path().join(BATCH_SUMMARY_FILE)).unwrap();
        let report: BatchReport = serde_json::from_str(&text).unwrap();
        assert_eq!(report.summary.total_sources, 1);
        assert_eq!(report.summary.processed_successfully, 1);
        assert!(dir.path().join("synthetic").join("report.md").is_file());
    }
}
