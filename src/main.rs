//! flow-sentry entrypoint: inspect raw exports, build the training table, persist the
//! feature schema, and score new traffic into a ranked alert table.

use clap::{Parser, Subcommand};
use flow_sentry::{
    alerts::{self, ScoredFlow, ScoringOptions},
    config::{validate_threshold, Config},
    dataset::{self, DatasetBuilder, TARGET_COLUMN},
    error::{FlowError, FlowResult},
    features::{FeatureSchema, LeakageFilter},
    flows,
    inspect,
    logging::StructuredLogger,
    model::OnnxClassifier,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "flow-sentry", version, about = "Binary flow classifier feature pipeline and alerting")]
struct Cli {
    /// JSON configuration file (defaults apply when absent)
    #[arg(long, env = "FLOW_SENTRY_CONFIG", default_value = "flow-sentry.json", global = true)]
    config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check raw files exist, load the first rows and show columns and label counts
    Inspect {
        #[arg(long)]
        raw_dir: Option<PathBuf>,
        #[arg(long, default_value_t = 5000)]
        nrows: usize,
    },
    /// Build the labeled training table from every raw CSV
    Build {
        #[arg(long)]
        raw_dir: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Rows kept per file (0 = all)
        #[arg(long)]
        sample_per_file: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Persist the feature schema of a training table
    Schema {
        #[arg(long)]
        dataset: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Score a raw flow CSV and write the alert table
    Predict {
        /// Raw CIC CSV to score
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Alert when prob_malicious >= threshold
        #[arg(long)]
        threshold: Option<f32>,
        /// Rows to score (0 = all)
        #[arg(long, default_value_t = 0)]
        nrows: usize,
        /// Write the alert table in ranked order instead of input order
        #[arg(long)]
        ranked: bool,
        /// Ranked alerts printed to stdout as JSON lines
        #[arg(long)]
        top: Option<usize>,
        #[arg(long)]
        model: Option<PathBuf>,
        #[arg(long)]
        schema: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct AlertLine<'a> {
    rank: usize,
    #[serde(flatten)]
    flow: &'a ScoredFlow,
}

fn run_inspect(config: &Config, raw_dir: Option<PathBuf>, nrows: usize) -> FlowResult<()> {
    let raw_dir = raw_dir.unwrap_or_else(|| config.paths.raw_dir.clone());
    let report = inspect::inspect(&raw_dir, nrows, &config.columns.label)?;
    info!(files = report.file_count, first = %report.first_file, rows = report.rows_loaded, "raw input found");
    info!(columns = ?report.columns, "first columns");
    match &report.label_counts {
        Some(counts) => info!(label = %config.columns.label, counts = ?counts, "label counts (top)"),
        None => warn!(
            label = %config.columns.label,
            candidates = ?report.label_like_columns,
            "label column not found"
        ),
    }
    Ok(())
}

fn run_build(
    config: &Config,
    raw_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    sample_per_file: Option<usize>,
    seed: Option<u64>,
) -> FlowResult<()> {
    let mut config = config.clone();
    if let Some(n) = sample_per_file {
        config.dataset.sample_per_file = n;
    }
    if let Some(s) = seed {
        config.dataset.seed = s;
    }
    let raw_dir = raw_dir.unwrap_or_else(|| config.paths.raw_dir.clone());
    let output = output.unwrap_or_else(|| config.paths.dataset_path.clone());

    let (table, report) = DatasetBuilder::new(&config).build_dir(&raw_dir)?;
    dataset::write_training_table(&output, &table)?;
    report.save(&config.paths.report_path)?;
    info!(
        dataset = %output.display(),
        report = %config.paths.report_path.display(),
        worst_columns = ?report.missing.worst_columns(5),
        "dataset built"
    );
    Ok(())
}

fn run_schema(config: &Config, dataset: Option<PathBuf>, output: Option<PathBuf>) -> FlowResult<()> {
    let dataset = dataset.unwrap_or_else(|| config.paths.dataset_path.clone());
    let output = output.unwrap_or_else(|| config.paths.schema_path.clone());
    if !dataset.exists() {
        return Err(FlowError::MissingArtifact {
            what: "training table (run `build` first)",
            path: dataset,
        });
    }
    let header = flows::read_header(&dataset)?;
    if !header.iter().any(|h| h == TARGET_COLUMN) {
        return Err(FlowError::InvalidArtifact {
            what: "training table",
            path: dataset,
            reason: format!("no '{}' column", TARGET_COLUMN),
        });
    }
    FeatureSchema::from_training_header(&header).save(&output)
}

struct PredictArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    threshold: Option<f32>,
    nrows: usize,
    ranked: bool,
    top: Option<usize>,
    model: Option<PathBuf>,
    schema: Option<PathBuf>,
}

fn run_predict(config: &Config, args: PredictArgs) -> FlowResult<()> {
    let threshold = args.threshold.unwrap_or(config.scoring.threshold);
    validate_threshold(threshold)?;
    let schema_path = args.schema.unwrap_or_else(|| config.paths.schema_path.clone());
    let model_path = args.model.unwrap_or_else(|| config.paths.model_path.clone());
    let output = args.output.unwrap_or_else(|| config.paths.alerts_path.clone());

    let schema = FeatureSchema::load(&schema_path)?;
    let model = OnnxClassifier::load(&model_path, schema.len(), &config.scoring.output_name)?;
    let filter = LeakageFilter::inference(&config.columns);
    let options = ScoringOptions {
        threshold,
        nrows: args.nrows,
        batch_size: config.scoring.batch_size,
    };

    let (table, audit) = alerts::score_file(&args.input, &model, &schema, &filter, &options)?;
    alerts::write_alert_table(&output, &table, args.ranked)?;
    info!(
        input = %args.input.display(),
        scored = table.len(),
        alerts = table.alert_count(),
        benign = table.len() - table.alert_count(),
        threshold,
        missing_substitutions = audit.total(),
        "prediction summary"
    );

    let top = args.top.unwrap_or(config.scoring.top);
    let mut stdout = std::io::stdout().lock();
    for (i, flow) in table.top(top).iter().enumerate() {
        StructuredLogger::emit_json(&AlertLine { rank: i + 1, flow }, &mut stdout)
            .map_err(|e| FlowError::io("<stdout>", e))?;
    }
    Ok(())
}

fn run(cli: Cli, config: &Config) -> FlowResult<()> {
    match cli.command {
        Command::Inspect { raw_dir, nrows } => run_inspect(config, raw_dir, nrows),
        Command::Build {
            raw_dir,
            output,
            sample_per_file,
            seed,
        } => run_build(config, raw_dir, output, sample_per_file, seed),
        Command::Schema { dataset, output } => run_schema(config, dataset, output),
        Command::Predict {
            input,
            output,
            threshold,
            nrows,
            ranked,
            top,
            model,
            schema,
        } => run_predict(
            config,
            PredictArgs {
                input,
                output,
                threshold,
                nrows,
                ranked,
                top,
                model,
                schema,
            },
        ),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let loaded = Config::load(&cli.config);
    let log = loaded
        .as_ref()
        .map(|c| c.log.clone())
        .unwrap_or_default();
    StructuredLogger::init(cli.json_logs || log.json, &log.level);

    let config = match loaded {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "configuration rejected");
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, configuration = e.is_configuration(), "flow-sentry failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
