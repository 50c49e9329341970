//! AIBPS CLI - command-line interface for the AIBPS engine
//!
//! Commands:
//! - compute: build the monthly composite table from per-pillar series files
//! - validate: validate a configuration file without computing
//! - schema: print the input and output contracts

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use aibps::encoder::TableEncoder;
use aibps::ingest::read_series_file;
use aibps::{compute_index, IndexConfig, IndexError, Pillar, PillarInputs, ENGINE_VERSION};

/// AIBPS - compute the AI Bubble Pressure Score composite index
#[derive(Parser)]
#[command(name = "aibps")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Compute the AI Bubble Pressure Score from raw series", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the composite table from per-pillar series files
    Compute {
        /// Raw sub-series as PILLAR=PATH (repeatable; multiple files per
        /// pillar become sub-series of that pillar)
        #[arg(short, long = "series", value_name = "PILLAR=PATH")]
        series: Vec<String>,

        /// Configuration JSON file (use - for stdin; defaults when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "csv")]
        format: OutputFormat,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration JSON file (use - for stdin)
        #[arg(short, long)]
        config: PathBuf,

        /// Output the validation result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the input or output contract
    Schema {
        /// Contract to print
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Flat CSV table
    Csv,
    /// JSON payload with producer/provenance metadata
    Json,
    /// Pretty-printed JSON payload
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input contract (series files and configuration surface)
    Input,
    /// Output contract (table columns)
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

fn run(cli: Cli) -> Result<(), AibpsCliError> {
    match cli.command {
        Commands::Compute {
            series,
            config,
            output,
            format,
        } => cmd_compute(&series, config.as_deref(), &output, format),
        Commands::Validate { config, json } => cmd_validate(&config, json),
        Commands::Schema { schema_type } => cmd_schema(schema_type),
    }
}

fn cmd_compute(
    series_args: &[String],
    config_path: Option<&Path>,
    output: &Path,
    format: OutputFormat,
) -> Result<(), AibpsCliError> {
    if series_args.is_empty() {
        return Err(AibpsCliError::NoSeries);
    }

    let config = load_config(config_path)?;
    let mut inputs = PillarInputs::new();

    for arg in series_args {
        let (pillar_name, path) = arg
            .split_once('=')
            .ok_or_else(|| AibpsCliError::BadSeriesArg(arg.clone()))?;
        let pillar = Pillar::parse(pillar_name.trim())
            .ok_or_else(|| AibpsCliError::UnknownPillar(pillar_name.trim().to_string()))?;
        let raw = read_series_file(Path::new(path.trim()))?;
        inputs.entry(pillar).or_default().push(raw);
    }

    let table = compute_index(&inputs, &config)?;
    let encoder = TableEncoder::new();

    let output_data = match format {
        OutputFormat::Csv => encoder.encode_csv(&table)?,
        OutputFormat::Json => serde_json::to_string(&encoder.encode_payload(&table))?,
        OutputFormat::JsonPretty => encoder.encode_json(&table)?,
    };

    if output.to_string_lossy() == "-" {
        print!("{output_data}");
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(config_path: &Path, json: bool) -> Result<(), AibpsCliError> {
    let result = load_config(Some(config_path)).map(|_| ());

    let report = match &result {
        Ok(()) => ValidationReport {
            valid: true,
            error: None,
        },
        Err(e) => ValidationReport {
            valid: false,
            error: Some(e.to_string()),
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.valid {
        println!("Configuration is valid.");
    } else {
        println!(
            "Configuration is invalid: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
    }

    result
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), AibpsCliError> {
    match schema_type {
        SchemaType::Input => {
            println!("Input contract");
            println!();
            println!("Series files: CSV with a header row and `date,value` columns.");
            println!("  - date: YYYY-MM-DD or YYYY-MM (first of month)");
            println!("  - value: decimal number, or empty for missing");
            println!("  - any frequency; the engine aligns to calendar months");
            println!();
            println!("Pillars: Market, Credit, Capex_Supply, Infra, Adoption, Sentiment");
            println!();
            println!("Configuration (JSON):");
            println!("  - start_month: first month of the timeline");
            println!("  - smoothing_window: trailing months of AIBPS_RA (>= 1)");
            println!("  - pillars.<name>.window: rolling window in months (>= 2)");
            println!("  - pillars.<name>.z_clip: symmetric z-score clip (> 0)");
            println!("  - pillars.<name>.blend: normalize-then-blend | blend-then-normalize");
            println!("  - pillars.<name>.weight: composite weight (>= 0)");
            println!("  - pillars.<name>.fill: \"none\" | {{\"forward\":{{\"max_gap\":N}}}}");
        }
        SchemaType::Output => {
            println!("Output contract");
            println!();
            println!("One row per month, ascending, monthly-aligned. Columns:");
            println!("  month, Market, Credit, Capex_Supply, Infra, Adoption, Sentiment,");
            println!("  AIBPS, AIBPS_RA");
            println!();
            println!("Every numeric cell is in [0, 100] or empty (missing).");
            println!("AIBPS is the weighted pillar composite; AIBPS_RA its trailing average.");
        }
    }

    Ok(())
}

// Helper functions

fn load_config(path: Option<&Path>) -> Result<IndexConfig, AibpsCliError> {
    let Some(path) = path else {
        return Ok(IndexConfig::default());
    };

    let json = if path.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            eprintln!("reading configuration from stdin (end with EOF)...");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(path)?
    };

    let config = IndexConfig::from_json(&json)?;
    config.validate()?;
    Ok(config)
}

// Error types

#[derive(Debug)]
enum AibpsCliError {
    Io(io::Error),
    Engine(IndexError),
    Json(serde_json::Error),
    NoSeries,
    BadSeriesArg(String),
    UnknownPillar(String),
}

impl std::fmt::Display for AibpsCliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AibpsCliError::Io(e) => write!(f, "{e}"),
            AibpsCliError::Engine(e) => write!(f, "{e}"),
            AibpsCliError::Json(e) => write!(f, "{e}"),
            AibpsCliError::NoSeries => write!(f, "No input series provided"),
            AibpsCliError::BadSeriesArg(arg) => write!(f, "Expected PILLAR=PATH, got `{arg}`"),
            AibpsCliError::UnknownPillar(name) => write!(f, "Unknown pillar `{name}`"),
        }
    }
}

impl From<io::Error> for AibpsCliError {
    fn from(e: io::Error) -> Self {
        AibpsCliError::Io(e)
    }
}

impl From<IndexError> for AibpsCliError {
    fn from(e: IndexError) -> Self {
        AibpsCliError::Engine(e)
    }
}

impl From<serde_json::Error> for AibpsCliError {
    fn from(e: serde_json::Error) -> Self {
        AibpsCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<AibpsCliError> for CliError {
    fn from(e: AibpsCliError) -> Self {
        match e {
            AibpsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            AibpsCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'aibps schema input' for the input contract".to_string()),
            },
            AibpsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            AibpsCliError::NoSeries => CliError {
                code: "NO_SERIES".to_string(),
                message: "No input series provided".to_string(),
                hint: Some("Pass at least one --series PILLAR=PATH".to_string()),
            },
            AibpsCliError::BadSeriesArg(arg) => CliError {
                code: "BAD_SERIES_ARG".to_string(),
                message: format!("Expected PILLAR=PATH, got `{arg}`"),
                hint: Some("Example: --series Market=data/soxx.csv".to_string()),
            },
            AibpsCliError::UnknownPillar(name) => CliError {
                code: "UNKNOWN_PILLAR".to_string(),
                message: format!("Unknown pillar `{name}`"),
                hint: Some(
                    "Valid pillars: Market, Credit, Capex_Supply, Infra, Adoption, Sentiment"
                        .to_string(),
                ),
            },
        }
    }
}

#[derive(serde::Serialize)]
struct ValidationReport {
    valid: bool,
    error: Option<String>,
}
