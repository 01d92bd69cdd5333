use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use hl7::DatePolicy;
use ips_core::{
    constants::{DATE_POLICY_ENV, PRETTY_JSON_ENV},
    date_policy_from_env_value, pretty_from_env_value, ConversionMode, ConversionService,
    CoreConfig,
};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Read standard input when INPUT is this value (or absent).
const STDIN_MARKER: &str = "-";

/// Default per-crate log levels; diagnostics go to stderr so stdout stays pure JSON.
const LOG_DIRECTIVES: &[&str] = &["ips_core=warn", "hl7=warn", "fhir=warn"];

#[derive(Parser)]
#[command(name = "ips")]
#[command(about = "HL7 v2 to International Patient Summary converter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    output: OutputArgs,

    /// Date handling for HL7 fields: uniform or legacy (overrides IPS_DATE_POLICY)
    #[arg(long, global = true, value_parser = parse_date_policy)]
    date_policy: Option<DatePolicy>,

    /// Emit compact JSON instead of pretty-printed (overrides IPS_PRETTY_JSON)
    #[arg(long, global = true)]
    compact: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an HL7 v2 message to intermediate record JSON
    Record {
        /// HL7 message file, or '-' for stdin
        input: Option<PathBuf>,
    },
    /// Convert an HL7 v2 message to an IPS document Bundle
    Bundle {
        /// HL7 message file, or '-' for stdin
        input: Option<PathBuf>,
    },
    /// Convert intermediate record JSON to an IPS document Bundle
    RecordToBundle {
        /// Record JSON file, or '-' for stdin
        input: Option<PathBuf>,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Write the result to this file instead of stdout
    #[arg(long, global = true, conflicts_with = "save_dir")]
    output: Option<PathBuf>,

    /// Write the result into this directory as <family>_<packageUUID>.json
    #[arg(long, global = true)]
    save_dir: Option<PathBuf>,
}

impl Commands {
    fn mode(&self) -> ConversionMode {
        match self {
            Commands::Record { .. } => ConversionMode::Record,
            Commands::Bundle { .. } => ConversionMode::Bundle,
            Commands::RecordToBundle { .. } => ConversionMode::RecordToBundle,
        }
    }

    fn input(&self) -> Option<&Path> {
        match self {
            Commands::Record { input }
            | Commands::Bundle { input }
            | Commands::RecordToBundle { input } => input.as_deref(),
        }
    }
}

fn parse_date_policy(value: &str) -> Result<DatePolicy, String> {
    value.parse::<DatePolicy>().map_err(|e| e.to_string())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(log_filter()?)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let mut cfg = CoreConfig::new(
        date_policy_from_env_value(std::env::var(DATE_POLICY_ENV).ok())?,
        pretty_from_env_value(std::env::var(PRETTY_JSON_ENV).ok())?,
    );
    if let Some(policy) = cli.date_policy {
        cfg = cfg.with_date_policy(policy);
    }
    if cli.compact {
        cfg = cfg.with_pretty(false);
    }

    let service = ConversionService::new(Arc::new(cfg));
    let mode = cli.command.mode();
    let input = read_input(cli.command.input())?;

    let conversion = service
        .convert(mode, &input)
        .with_context(|| format!("{mode} conversion failed"))?;

    match output_path(&cli.output, &conversion.suggested_filename)? {
        Some(path) => {
            write_output(&path, &conversion.json)?;
            eprintln!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(conversion.json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}

fn log_filter() -> anyhow::Result<EnvFilter> {
    LOG_DIRECTIVES
        .iter()
        .try_fold(EnvFilter::from_default_env(), |filter, directive| -> anyhow::Result<_> {
            Ok(filter.add_directive(directive.parse()?))
        })
}

/// Read the whole input from `path`, or stdin when `path` is absent or `-`.
fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) if path != Path::new(STDIN_MARKER) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        _ => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read standard input")?;
            Ok(buffer)
        }
    }
}

/// Where the result goes: an explicit file, a file named `filename` inside the save
/// directory (created if needed), or `None` for stdout.
fn output_path(args: &OutputArgs, filename: &str) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = &args.output {
        return Ok(Some(path.clone()));
    }
    let Some(dir) = &args.save_dir else {
        return Ok(None);
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create save directory {}", dir.display()))?;
    Ok(Some(dir.join(filename)))
}

fn write_output(path: &Path, json: &str) -> anyhow::Result<()> {
    fs::write(path, format!("{json}\n"))
        .with_context(|| format!("failed to write {}", path.display()))
}
