//! Ocus CLI - Command-line interface for Ocustream
//!
//! Commands:
//! - transform: Classify a recorded measurement series (batch mode)
//! - run: Classify streaming NDJSON measurements from stdin (streaming mode)
//! - validate: Validate measurement records against ocu.frame.v1
//! - schema: Print schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ocustream::schema::{self, FrameRecord, SCHEMA_VERSION};
use ocustream::{
    SessionReportEncoder, StreamConfig, StreamController, StreamError, PRODUCER_NAME, VERSION,
};

/// Ocus - On-device ocular state classification from eye-openness streams
#[derive(Parser)]
#[command(name = "ocus")]
#[command(version = VERSION)]
#[command(about = "Classify blink and fatigue state from EAR measurements", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a recorded measurement series (batch mode)
    Transform {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        #[command(flatten)]
        tuning: TuningArgs,

        /// Load engine state from file (resume a session)
        #[arg(long)]
        load_state: Option<PathBuf>,

        /// Save engine state to file after processing
        #[arg(long)]
        save_state: Option<PathBuf>,

        /// Write a session report (osr.session.v1) to file after processing
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Classify streaming NDJSON measurements from stdin (streaming mode)
    Run {
        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        #[command(flatten)]
        tuning: TuningArgs,

        /// Load engine state from file
        #[arg(long)]
        load_state: Option<PathBuf>,

        /// Save engine state to file on exit
        #[arg(long)]
        save_state: Option<PathBuf>,

        /// Write a session report to file on exit
        #[arg(long)]
        report: Option<PathBuf>,

        /// Flush output after each record
        #[arg(long, default_value = "true")]
        flush: bool,
    },

    /// Validate measurement records against the input schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

/// Engine tuning flags shared by transform and run
#[derive(clap::Args)]
struct TuningArgs {
    /// Calibration window in seconds
    #[arg(long, default_value = "5.0")]
    calibration_secs: f64,

    /// Fraction of the mean open-eye EAR used as the closed threshold
    #[arg(long, default_value = "0.75")]
    calibration_factor: f64,

    /// Consecutive closed frames required for a blink
    #[arg(long, default_value = "3")]
    consec_frames: u32,

    /// Trailing blink-rate window in seconds
    #[arg(long, default_value = "60.0")]
    window_secs: f64,

    /// Blink rate above which the subject is Fatigued
    #[arg(long, default_value = "25.0")]
    rate_threshold: f64,

    /// Continuous closure in seconds that indicates Drowsy
    #[arg(long, default_value = "1.5")]
    drowsy_secs: f64,

    /// Nominal frame period in seconds
    #[arg(long, default_value = "0.03333333333333333")]
    frame_dt: f64,
}

impl TuningArgs {
    fn to_config(&self) -> Result<StreamConfig, StreamError> {
        let config = StreamConfig {
            calibration_secs: self.calibration_secs,
            calibration_factor: self.calibration_factor,
            consec_frames: self.consec_frames,
            window_secs: self.window_secs,
            rate_threshold: self.rate_threshold,
            drowsy_secs: self.drowsy_secs,
            frame_dt: self.frame_dt,
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one measurement per line)
    Ndjson,
    /// JSON array of measurements
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one frame result per line)
    Ndjson,
    /// JSON array of frame results
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (ocu.frame.v1)
    Input,
    /// Output schema (frame results and osr.session.v1)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), OcusCliError> {
    match cli.command {
        Commands::Transform {
            input,
            output,
            input_format,
            output_format,
            tuning,
            load_state,
            save_state,
            report,
        } => cmd_transform(
            &input,
            &output,
            input_format,
            output_format,
            &tuning,
            load_state.as_deref(),
            save_state.as_deref(),
            report.as_deref(),
        ),

        Commands::Run {
            output_format,
            tuning,
            load_state,
            save_state,
            report,
            flush,
        } => cmd_run(
            output_format,
            &tuning,
            load_state.as_deref(),
            save_state.as_deref(),
            report.as_deref(),
            flush,
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Schema { schema_type } => {
            cmd_schema(schema_type);
            Ok(())
        }
    }
}

fn make_controller(
    tuning: &TuningArgs,
    load_state: Option<&Path>,
) -> Result<StreamController, OcusCliError> {
    match load_state {
        Some(path) => {
            let json = fs::read_to_string(path)?;
            Ok(StreamController::load_state(&json)?)
        }
        None => Ok(StreamController::with_config(tuning.to_config()?)?),
    }
}

fn finish_session(
    controller: &StreamController,
    save_state: Option<&Path>,
    report: Option<&Path>,
) -> Result<(), OcusCliError> {
    if let Some(path) = save_state {
        fs::write(path, controller.save_state()?)?;
    }
    if let Some(path) = report {
        let encoder = SessionReportEncoder::new();
        fs::write(path, encoder.encode_to_json(controller)?)?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_transform(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    tuning: &TuningArgs,
    load_state: Option<&Path>,
    save_state: Option<&Path>,
    report: Option<&Path>,
) -> Result<(), OcusCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let records = match input_format {
        InputFormat::Ndjson => schema::parse_ndjson(&input_data)?,
        InputFormat::Json => schema::parse_array(&input_data)?,
    };

    if records.is_empty() {
        return Err(OcusCliError::NoRecords);
    }

    let mut controller = make_controller(tuning, load_state)?;
    let mut results = Vec::with_capacity(records.len());

    for record in &records {
        record.validate()?;
        results.push(controller.process_frame(record.to_measurement())?);
    }

    finish_session(&controller, save_state, report)?;

    let output_data = format_output(&results, &output_format)?;
    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_run(
    output_format: OutputFormat,
    tuning: &TuningArgs,
    load_state: Option<&Path>,
    save_state: Option<&Path>,
    report: Option<&Path>,
    flush: bool,
) -> Result<(), OcusCliError> {
    if atty::is(atty::Stream::Stdin) {
        eprintln!("[ocus] reading NDJSON measurements from terminal; pipe input or press Ctrl-D to end");
    }

    let mut controller = make_controller(tuning, load_state)?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut results = Vec::new();

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let record: FrameRecord = serde_json::from_str(trimmed)
            .map_err(|e| OcusCliError::ParseError(format!("failed to parse record: {e}")))?;
        record.validate()?;

        let result = controller.process_frame(record.to_measurement())?;

        match output_format {
            OutputFormat::Ndjson => {
                writeln!(stdout, "{}", serde_json::to_string(&result)?)?;
                if flush {
                    stdout.flush()?;
                }
            }
            // Array outputs are buffered until the stream ends
            OutputFormat::Json | OutputFormat::JsonPretty => results.push(result),
        }
    }

    match output_format {
        OutputFormat::Ndjson => {}
        OutputFormat::Json => writeln!(stdout, "{}", serde_json::to_string(&results)?)?,
        OutputFormat::JsonPretty => {
            writeln!(stdout, "{}", serde_json::to_string_pretty(&results)?)?
        }
    }
    stdout.flush()?;

    finish_session(&controller, save_state, report)
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), OcusCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let records = match input_format {
        InputFormat::Ndjson => schema::parse_ndjson(&input_data)?,
        InputFormat::Json => schema::parse_array(&input_data)?,
    };

    let errors = schema::validate_records(&records);
    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - errors.len(),
        invalid_records: errors.len(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - record {}: {}", err.index, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(OcusCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType) {
    match schema_type {
        SchemaType::Input => {
            println!("Input Schema: {}", SCHEMA_VERSION);
            println!();
            println!("One measurement per record:");
            println!("  t      - monotonic capture time in seconds (required, finite)");
            println!("  ear    - eye-openness scalar; lower = more closed (required,");
            println!("           NaN is treated as eyes-open by the engine)");
            println!("  source - optional capture pipeline identifier");
            println!();
            println!("Timestamps must be non-decreasing across records.");
        }
        SchemaType::Output => {
            println!("Output Schemas");
            println!();
            println!("Frame result (one per measurement):");
            println!("  timestamp, ear, threshold, calibrating, blink_count,");
            println!("  blink_rate, state (normal | fatigued | drowsy)");
            println!();
            println!("Session report (osr.session.v1, via --report):");
            println!("  producer: {{ name: {}, version, instance_id }}", PRODUCER_NAME);
            println!("  computed_at_utc, frames, calibration, blinks, ear, state_frames");
        }
    }
}

fn format_output(
    results: &[ocustream::FrameResult],
    format: &OutputFormat,
) -> Result<String, OcusCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::with_capacity(results.len());
            for result in results {
                lines.push(serde_json::to_string(result)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(results)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(results)?),
    }
}

// Error types

#[derive(Debug)]
enum OcusCliError {
    Io(io::Error),
    Stream(StreamError),
    Json(serde_json::Error),
    NoRecords,
    ValidationFailed(usize),
    ParseError(String),
}

impl From<io::Error> for OcusCliError {
    fn from(e: io::Error) -> Self {
        OcusCliError::Io(e)
    }
}

impl From<StreamError> for OcusCliError {
    fn from(e: StreamError) -> Self {
        OcusCliError::Stream(e)
    }
}

impl From<serde_json::Error> for OcusCliError {
    fn from(e: serde_json::Error) -> Self {
        OcusCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<OcusCliError> for CliError {
    fn from(e: OcusCliError) -> Self {
        match e {
            OcusCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            OcusCliError::Stream(e) => {
                let hint = match &e {
                    StreamError::Calibration(_) => {
                        "Ensure eyes-open frames are present during the calibration window"
                    }
                    StreamError::Ordering { .. } => {
                        "Timestamps must be finite and non-decreasing"
                    }
                    _ => "Check configuration and input values",
                };
                CliError {
                    code: "STREAM_ERROR".to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            OcusCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            OcusCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No measurement records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            OcusCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            OcusCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some(format!("Ensure input matches {} schema", SCHEMA_VERSION)),
            },
        }
    }
}

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<schema::RecordError>,
}
