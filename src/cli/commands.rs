//! CLI command implementations
//!
//! Each command loads configuration first, then the log, and never
//! produces partial output: any fatal error aborts before anything is
//! written.

use std::path::{Path, PathBuf};

use serde_json::json;
use uuid::Uuid;

use crate::causality::{
    analyze_transitions, CausalityEvaluator, EvaluationSet, ReferenceTable, Status,
};
use crate::config::PipelineConfig;
use crate::features::{DatasetProfile, ExampleDataset, ProfileChoice, TraceFeatureExtractor};
use crate::log::{EventLog, LogLoader};
use crate::model::{evaluate, rank_importances};
use crate::observability::{log_event_with_fields, Event, Logger, ObservationScope, RunCounters};
use crate::transform::{train_test_split, DataTransformer};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{write_document, write_response};
use super::report::RunReport;

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Detect { log, config } => detect(&log, config.as_deref()),
        Command::Extract {
            log,
            config,
            profile,
            output,
        } => extract(&log, config.as_deref(), profile.as_deref(), output.as_deref()),
        Command::Run {
            config,
            log,
            profile,
            references,
            output_dir,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(log) = log {
                config.log.path = Some(log);
            }
            if let Some(profile) = profile {
                config.profile = parse_profile(&profile)?;
            }
            if let Some(references) = references {
                config.causality.reference_path = Some(references);
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            run_analysis(&config)
        }
    }
}

/// Loads the configuration file, or defaults when none is given, and
/// applies its log level
pub fn load_config(path: Option<&Path>) -> CliResult<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    Logger::set_min_severity(config.severity()?);
    Ok(config)
}

fn parse_profile(name: &str) -> CliResult<ProfileChoice> {
    name.parse()
        .map_err(|e: crate::features::FeatureError| CliError::config_error(e.to_string()))
}

fn load_log(config: &PipelineConfig, path: &Path) -> CliResult<EventLog> {
    Ok(LogLoader::new(config.log.columns.clone()).load_path(path)?)
}

fn resolve_profile(config: &PipelineConfig, log: &EventLog) -> DatasetProfile {
    let profile = config.profile.resolve(log.columns(), &config.extraction);
    let source = if config.profile == ProfileChoice::Auto {
        "detected"
    } else {
        "configured"
    };
    log_event_with_fields(
        Event::ProfileDetected,
        &[("profile", profile.as_str()), ("source", source)],
    );
    profile
}

/// Print the profile detected for a log together with its columns
pub fn detect(log_path: &Path, config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let log = load_log(&config, log_path)?;
    let profile = crate::features::detect_profile_with(log.columns(), &config.extraction);

    let columns: serde_json::Map<String, serde_json::Value> = log
        .columns()
        .names()
        .map(|name| {
            let kind = log
                .columns()
                .kind(name)
                .map(|k| json!(k))
                .unwrap_or(serde_json::Value::Null);
            (name.to_string(), kind)
        })
        .collect();

    write_response(json!({
        "profile": profile,
        "traces": log.traces().len(),
        "events": log.event_count(),
        "columns": columns,
    }))
}

/// Extract the example dataset of one log
pub fn extract(
    log_path: &Path,
    config_path: Option<&Path>,
    profile: Option<&str>,
    output: Option<&Path>,
) -> CliResult<()> {
    let mut config = load_config(config_path)?;
    if let Some(profile) = profile {
        config.profile = parse_profile(profile)?;
    }

    let log = load_log(&config, log_path)?;
    let profile = resolve_profile(&config, &log);
    let dataset = extract_dataset(&config, profile, &log)?;
    let document = dataset.to_document();

    match output {
        Some(path) => {
            write_document(path, &document)?;
            write_response(json!({
                "profile": profile,
                "examples": dataset.len(),
                "features": dataset.schema().len(),
                "fingerprint": document.fingerprint,
                "output": path.display().to_string(),
            }))
        }
        None => write_response(json!({
            "profile": profile,
            "dataset": document,
        })),
    }
}

fn extract_dataset(
    config: &PipelineConfig,
    profile: DatasetProfile,
    log: &EventLog,
) -> CliResult<ExampleDataset> {
    let extractor = TraceFeatureExtractor::for_log(profile, log, &config.extraction)?;
    Ok(extractor.extract_log(log)?)
}

/// Run the whole analysis and write the report
pub fn run_analysis(config: &PipelineConfig) -> CliResult<()> {
    let counters = RunCounters::new();
    let scope = ObservationScope::new("RUN");

    let report = match run_pipeline(config, &counters) {
        Ok(report) => report,
        Err(e) => {
            scope.fail_fatal(&e.to_string());
            return Err(e);
        }
    };

    let path = report_path(&config.output_dir, &report);
    write_document(&path, &report)?;

    let fields = counters.snapshot().as_fields();
    let fields: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
    scope.complete_with_fields(&fields);

    write_response(json!({
        "run_id": report.run_id,
        "profile": report.profile,
        "report": path.display().to_string(),
        "accuracy": report.metrics.accuracy,
        "summary": report.summary,
    }))
}

fn report_path(dir: &Path, report: &RunReport) -> PathBuf {
    dir.join(report.file_name())
}

/// Load → extract → split → fit → train → evaluate → profile transitions
/// → test hypotheses
pub fn run_pipeline(config: &PipelineConfig, counters: &RunCounters) -> CliResult<RunReport> {
    let log_path = config
        .log
        .path
        .as_deref()
        .ok_or_else(|| CliError::config_error("no event log: set log.path or pass --log"))?;

    let log = load_log(config, log_path)?;
    counters.record_log(log.event_count() as u64, log.traces().len() as u64);
    for _ in log.traces().iter().filter(|t| t.len() < 2) {
        counters.increment_short_traces();
    }

    let profile = resolve_profile(config, &log);
    let dataset = extract_dataset(config, profile, &log)?;
    counters.add_examples(dataset.len() as u64);

    let split = train_test_split(&dataset, config.split.test_size, config.split.random_state)?;
    log_event_with_fields(
        Event::SplitComplete,
        &[
            ("train", &split.train.len().to_string()),
            ("test", &split.test.len().to_string()),
        ],
    );

    let transformer = DataTransformer::new(config.split.transform_config());
    let (train_set, fitted) = transformer.fit_transform(&split.train)?;

    let mut model = config.model.build()?;
    model.train(train_set.rows(), train_set.labels())?;
    log_event_with_fields(
        Event::ModelTrained,
        &[
            ("model", model.name()),
            ("rows", &train_set.len().to_string()),
            ("classes", &model.classes().len().to_string()),
        ],
    );

    let evaluation = EvaluationSet::from_dataset(&fitted, &split.test)?;
    let metrics = evaluate(model.as_ref(), evaluation.scaled_rows(), evaluation.labels())?;
    log_event_with_fields(
        Event::ModelEvaluated,
        &[
            ("accuracy", &format!("{:.4}", metrics.accuracy)),
            ("macro_f1", &format!("{:.4}", metrics.macro_f1)),
            ("samples", &metrics.samples.to_string()),
        ],
    );

    let feature_importances = rank_importances(model.as_ref(), train_set.feature_names())?;
    let predictions = model.predict(evaluation.scaled_rows())?;
    let transitions = analyze_transitions(
        &split.test,
        &predictions,
        &feature_importances,
        config.causality.transition_features,
        config.causality.min_transition_cases,
    )?;

    let references = match &config.causality.reference_path {
        Some(path) => ReferenceTable::load(path)?,
        None => ReferenceTable::empty(),
    };
    let evaluator = CausalityEvaluator::new(config.causality.clone(), references);
    let hypotheses = evaluator.define_hypotheses(profile, train_set.feature_names());
    let results = evaluator.run_tests(&hypotheses, model.as_ref(), &evaluation);
    for r in &results {
        counters.record_hypothesis(
            r.supported(),
            r.status == Status::Skipped,
            r.status == Status::Error,
            r.is_fallback(),
        );
    }
    let summary = evaluator.summary(&results);

    Ok(RunReport {
        run_id: Uuid::new_v4(),
        profile,
        schema_fingerprint: dataset.schema().fingerprint(),
        feature_names: train_set.feature_names().to_vec(),
        model: model.name().to_string(),
        train_examples: split.train.len(),
        test_examples: split.test.len(),
        metrics,
        feature_importances,
        transitions,
        hypotheses: results,
        summary,
        counters: Some(counters.snapshot()),
    })
}
