//! CLI entry point for the loan preprocessing pipeline.

use anyhow::{Result, anyhow};
use clap::Parser;
use dotenv::dotenv;
use loan_processing::{
    ColumnClassification, Pipeline, PipelineConfig, PipelineResult, RateColumn, ReportGenerator,
    RunReport, schema,
};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Worst-case preprocessing of loan datasets",
    long_about = "Turns a raw loan export into a fully numeric table: worst-case imputation,\n\
                  categorical encoding and currency normalization at the issue-month rate.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  RUST_LOG              Log filter, overrides --log-level (may be set in .env)\n\n\
                  EXAMPLES:\n  \
                  # Basic usage\n  \
                  loan-processing -i loan-data.csv --rates EUR-USD.csv\n\n  \
                  # Continue from the checkpoints of a previous run\n  \
                  loan-processing -i loan-data.csv --rates EUR-USD.csv --resume\n\n  \
                  # Preview column groups and output layout\n  \
                  loan-processing -i loan-data.csv --dry-run"
)]
struct Args {
    /// Path to the loan table
    #[arg(short, long)]
    input: PathBuf,

    /// Path to the monthly exchange-rate table
    #[arg(long)]
    rates: Option<PathBuf>,

    /// Output directory for results
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Output file name (without extension)
    #[arg(long, default_value = "loan-data-preprocessed")]
    output_name: String,

    /// Directory holding the per-group checkpoints
    #[arg(long, default_value = "checkpoints")]
    checkpoint_dir: PathBuf,

    /// Do not persist the column groups before assembly
    #[arg(long)]
    no_checkpoints: bool,

    /// Load existing checkpoints instead of recomputing their groups
    #[arg(long)]
    resume: bool,

    /// Fail on unrecognised state codes instead of assigning the unknown region
    #[arg(long)]
    strict_regions: bool,

    /// Field delimiter of the loan table
    #[arg(long, default_value = ";")]
    delimiter: char,

    /// Field delimiter of the exchange-rate table
    #[arg(long, default_value = ",")]
    rates_delimiter: char,

    /// Exchange-rate column holding the rate: zero-based index or header name
    #[arg(long, default_value = "3")]
    rate_column: RateColumn,

    /// Preview column groups, statistics and output layout without processing
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output the JSON run report to stdout instead of a human-readable summary
    ///
    /// Disables all logs.
    #[arg(long)]
    json: bool,

    /// Write the JSON run report to the output directory
    ///
    /// The report will be saved as <output_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    // .env may set RUST_LOG, so load it before the subscriber reads the environment
    dotenv().ok();
    init_logging(&args.log_level, args.quiet, args.json);

    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    let config = PipelineConfig::builder()
        .loan_delimiter(args.delimiter)
        .rates_delimiter(args.rates_delimiter)
        .rate_column(args.rate_column.clone())
        .output_dir(&args.output)
        .output_name(&args.output_name)
        .checkpoint_dir(&args.checkpoint_dir)
        .write_checkpoints(!args.no_checkpoints)
        .resume_from_checkpoints(args.resume)
        .strict_regions(args.strict_regions)
        .build()?;

    let pipeline = build_pipeline(&args, config)?;

    if args.dry_run {
        return run_dry_run(&args, &pipeline);
    }

    let rates = args
        .rates
        .as_deref()
        .ok_or_else(|| anyhow!("--rates is required unless --dry-run is given"))?;
    if !rates.exists() {
        return Err(anyhow!("Exchange-rate file not found: {}", rates.display()));
    }

    run_pipeline(&pipeline, &args, rates)
}

fn build_pipeline(args: &Args, config: PipelineConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Run pipeline and print results
fn run_pipeline(pipeline: &Pipeline, args: &Args, rates: &Path) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting loan preprocessing pipeline...");
    info!("{}", "=".repeat(80));

    match pipeline.process_files(&args.input, rates) {
        Ok(result) => handle_pipeline_output(&result, args, rates),
        Err(e) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            }
            error!("Pipeline failed [{}]: {}", e.error_code(), e);
            Err(anyhow!("Pipeline failed: {}", e))
        }
    }
}

/// Handle pipeline output based on CLI flags.
///
/// Output behavior:
/// - Default: Print human-readable summary to stdout
/// - `--json`: Print JSON to stdout only (no logs)
/// - `--emit-report`: Write JSON report to file
fn handle_pipeline_output(result: &PipelineResult, args: &Args, rates: &Path) -> Result<()> {
    let report = ReportGenerator::build_report(Some(args.input.as_path()), Some(rates), result);

    if args.emit_report {
        let generator = ReportGenerator::new(args.output.clone(), args.output_name.clone());
        let report_path = generator.write_report_to_file(&report)?;
        info!("Report written to: {}", report_path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(&report);
    Ok(())
}

/// Print a human-readable summary of the preprocessing results.
fn print_human_readable_summary(report: &RunReport) {
    println!();
    println!("{}", "=".repeat(80));
    println!("PREPROCESSING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        report.input_file.as_deref().unwrap_or("-"),
        report.rows_before,
        report.header_before.len()
    );
    println!(
        "Output: {} ({} rows x {} columns)",
        report.output_file.as_deref().unwrap_or("(not saved)"),
        report.rows_after,
        report.header_after.len()
    );
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", report.duration_ms);
    println!("  Dropped columns: {}", report.dropped_columns.join(", "));
    println!(
        "  Exchange rates: {} months, mean {:.4}",
        report.exchange_rates.len(),
        report.mean_exchange_rate
    );
    println!("  Subgrades encoded: {}", report.subgrade_encoding.len());
    if !report.resumed_groups.is_empty() {
        println!("  Resumed from: {}", report.resumed_groups.join(", "));
    }
    println!();

    if !report.imputations.is_empty() {
        println!("Missing Values:");
        for imputation in &report.imputations {
            println!(
                "  - {:<22} {:>6} missing -> {}",
                imputation.column,
                imputation.missing,
                imputation.substitute.as_deref().unwrap_or("kept as unknown")
            );
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings:");
        for warning in &report.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save detailed JSON report");
    println!("{}", "=".repeat(80));
}

/// Run dry-run mode - show what would happen without processing
///
/// Note: This function uses `println!` intentionally for user-facing CLI output.
/// Unlike logging (`info!`, `debug!`), this output should always be visible
/// regardless of log level settings since it's the primary purpose of --dry-run.
fn run_dry_run(args: &Args, pipeline: &Pipeline) -> Result<()> {
    let classification = pipeline.inspect(&args.input)?;
    let config = pipeline.config();

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Preview of preprocessing actions");
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", args.input.display());
    println!("  Rows: {}", classification.rows);
    println!("  Columns: {}", classification.column_profiles.len());
    println!();

    print_column_groups(&classification);

    println!("SCHEMA CHECK");
    println!("{}", "-".repeat(40));
    match schema::validate_classification(&classification) {
        Ok(()) => println!("  Every column matches its transformation rule"),
        Err(e) => println!("  ERROR [{}]: {}", e.error_code(), e),
    }
    println!();

    println!("PLANNED OUTPUT LAYOUT");
    println!("{}", "-".repeat(40));
    let layout =
        schema::output_layout(&config.source_currency, &config.target_currency, false);
    for (position, column) in layout.iter().enumerate() {
        println!("  {:>2}. {}", position + 1, column);
    }
    println!(
        "  ('{}' is appended if '{}' differs from '{}')",
        schema::REFERENCE_OUT,
        schema::URL,
        schema::ID
    );
    println!();

    println!("OUTPUT FILES (will be created)");
    println!("{}", "-".repeat(40));
    println!(
        "  - {}",
        args.output.join(format!("{}.csv", args.output_name)).display()
    );
    if !args.no_checkpoints {
        println!("  - {}/ (column group checkpoints)", args.checkpoint_dir.display());
    }
    if args.emit_report {
        println!(
            "  - {}",
            args.output
                .join(format!("{}_report.json", args.output_name))
                .display()
        );
    }
    println!();

    println!("{}", "=".repeat(80));
    println!("To execute this preprocessing, run without --dry-run");
    println!("{}", "=".repeat(80));

    Ok(())
}

fn print_column_groups(classification: &ColumnClassification) {
    println!("COLUMN GROUPS");
    println!("{}", "-".repeat(40));
    println!(
        "{:<22} {:<12} {:>8} {:>8} {:>12} {:>12} {:>12}",
        "Column", "Group", "Missing", "Invalid", "Min", "Mean", "Max"
    );
    println!("{}", "-".repeat(92));

    for profile in &classification.column_profiles {
        let (min, mean, max) = match profile.stats {
            Some(stats) => (
                format!("{:.2}", stats.min),
                format!("{:.2}", stats.mean),
                format!("{:.2}", stats.max),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        println!(
            "{:<22} {:<12} {:>8} {:>8} {:>12} {:>12} {:>12}",
            truncate_str(&profile.name, 21),
            profile.group.as_str(),
            profile.missing_count,
            profile.unparseable_count,
            min,
            mean,
            max
        );
    }
    println!();
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
