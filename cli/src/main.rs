use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use json_mapper_core::DecodeResult;
use json_mapper_lint::{
    ConverterTable, DEFAULT_CONFIG_FILE, DeclarationFile, FileReport, MapperConfig, check_paths,
    collect_declaration_paths,
};
use serde_json::{Value, json};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Exit status used when checks or decodes report problems.
const EXIT_FINDINGS: i32 = 2;

#[derive(Debug, Parser)]
#[command(name = "json-mapper")]
#[command(about = "Check schema declarations and decode JSON against them")]
struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check declaration files for fields the decoder cannot honour.
    Check(CheckArgs),
    /// Decode a JSON document into an instance of a declared schema.
    Decode(DecodeArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Declaration files (.json, .yml, .yaml) and/or directories containing them.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Configuration file path.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Only report the outcome through the exit status.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Args)]
struct DecodeArgs {
    /// Declaration file holding the schema.
    #[arg(long)]
    schema: PathBuf,
    /// Name of the schema to decode into.
    #[arg(long)]
    name: String,
    /// JSON input file (default: stdin).
    #[arg(long)]
    input: Option<PathBuf>,
    /// Look fields up by their declared names instead of snake_case keys.
    #[arg(long)]
    disable_transform_keys: bool,
    /// Configuration file path.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Clean,
    Findings,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Decode(args) => run_decode(args),
    };

    match result {
        Ok(Outcome::Clean) => {}
        Ok(Outcome::Findings) => std::process::exit(EXIT_FINDINGS),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_check(args: CheckArgs) -> Result<Outcome, String> {
    let config = MapperConfig::load_or_default(&args.config).map_err(|e| e.to_string())?;
    let quiet = args.quiet || config.check.quiet;

    let paths: Vec<PathBuf> = collect_declaration_paths(&args.paths)
        .map_err(|e| e.to_string())?
        .into_iter()
        .filter(|path| {
            let excluded = config.is_excluded(path);
            if excluded {
                debug!(path = %path.display(), "Skipping excluded declaration file");
            }
            !excluded
        })
        .collect();

    if paths.is_empty() {
        info!("No declaration files to check");
        return Ok(Outcome::Clean);
    }

    let reports = check_paths(&paths).map_err(|e| e.to_string())?;
    let mut outcome = Outcome::Clean;
    for report in reports.iter().filter(|report| !report.report.is_clean()) {
        outcome = Outcome::Findings;
        if !quiet {
            for line in render_report(report) {
                println!("{line}");
            }
        }
    }

    info!(files = reports.len(), clean = outcome == Outcome::Clean, "Check finished");
    Ok(outcome)
}

fn run_decode(args: DecodeArgs) -> Result<Outcome, String> {
    let config = MapperConfig::load_or_default(&args.config).map_err(|e| e.to_string())?;
    let mut options = config.decode;
    options.disable_transform_keys |= args.disable_transform_keys;

    let catalog = DeclarationFile::load(&args.schema)
        .and_then(|file| file.into_catalog(&ConverterTable::with_builtins()))
        .map_err(|e| format!("Failed to load '{}': {e}", args.schema.display()))?;

    let raw = match &args.input {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?,
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .map_err(|err| format!("Failed to read stdin: {err}"))?;
            raw
        }
    };
    let raw: Value =
        serde_json::from_str(&raw).map_err(|err| format!("Failed to parse input JSON: {err}"))?;

    let result = catalog
        .decode(&args.name, &raw, &options)
        .map_err(|e| e.to_string())?;
    let outcome = if result.is_clean() {
        Outcome::Clean
    } else {
        Outcome::Findings
    };

    let output = serde_json::to_string_pretty(&render_decode(result))
        .map_err(|err| format!("Failed to serialize decode result: {err}"))?;
    println!("{output}");
    Ok(outcome)
}

fn render_report(file: &FileReport) -> Vec<String> {
    let mut lines = vec![format!("● {}", file.path.display())];
    for schema in &file.report.schemas {
        lines.push(format!(" class: {}", schema.schema));
        lines.extend(schema.messages.iter().map(|message| format!("  {message}")));
    }
    lines
}

fn render_decode(result: DecodeResult) -> Value {
    let (instance, errors) = result.into_parts();
    json!({
        "instance": instance.to_json(),
        "errors": errors,
    })
}
