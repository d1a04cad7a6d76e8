//! tabforge CLI - apply derived columns and flag rules to CSV files

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tabforge::prelude::*;
use tabforge::{CsvReadOptions, CsvReader, CsvWriteOptions, CsvWriter};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tabforge")]
#[command(
    author,
    version,
    about = "Validated, replayable column transformations for CSV files"
)]
struct Cli {
    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Field delimiter for input and output
    #[arg(short, long, global = true, default_value = ",")]
    delimiter: char,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply operations to a CSV file and write the result
    Apply {
        /// Input CSV file
        input: PathBuf,

        /// Derived column, as NAME=EXPRESSION (repeatable)
        #[arg(long = "derive", value_name = "NAME=EXPR", value_parser = parse_assignment)]
        derive: Vec<(String, String)>,

        /// Flag rule, as NAME=CONDITION (repeatable)
        #[arg(long = "flag", value_name = "NAME=COND", value_parser = parse_assignment)]
        flag: Vec<(String, String)>,

        /// Collaborator suggestions JSON file
        #[arg(long, value_name = "FILE")]
        suggestions: Option<PathBuf>,

        /// Keep only rows START..=END (0-based) before applying anything
        #[arg(long, value_name = "START:END", value_parser = parse_range)]
        crop: Option<RowRange>,

        /// Engine options JSON file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output CSV file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the output even if some operations were rejected
        #[arg(long)]
        keep_going: bool,
    },

    /// Print the collaborator context for a CSV file as JSON
    Context {
        /// Input CSV file
        input: PathBuf,

        /// Engine options JSON file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Validate an expression against a CSV file's columns
    Check {
        /// Input CSV file
        input: PathBuf,

        /// Expression to check
        expression: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let delimiter = u8::try_from(cli.delimiter).context("Delimiter must be an ASCII character")?;

    match cli.command {
        Commands::Apply {
            input,
            derive,
            flag,
            suggestions,
            crop,
            config,
            output,
            keep_going,
        } => {
            let mut proposals: Vec<Proposal> = derive
                .into_iter()
                .map(|(name, expr)| Proposal::derived_column(name, expr))
                .chain(
                    flag.into_iter()
                        .map(|(name, cond)| Proposal::flag_rule(name, cond)),
                )
                .collect();

            let options = load_options(config.as_deref())?;
            if let Some(path) = suggestions {
                let json = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read '{}'", path.display()))?;
                let parsed = AnalysisSuggestions::from_json(&json)
                    .with_context(|| format!("Failed to parse '{}'", path.display()))?;
                proposals.extend(parsed.into_proposals(&options.flag_prefix));
            }

            apply(
                &input,
                delimiter,
                options,
                crop,
                &proposals,
                output.as_deref(),
                keep_going,
            )
        }
        Commands::Context { input, config } => {
            let options = load_options(config.as_deref())?;
            let engine = TransformEngine::with_options(read_csv(&input, delimiter)?, options);
            let json = engine
                .suggestion_context()
                .to_json()
                .context("Failed to serialize context")?;
            println!("{}", json);
            Ok(())
        }
        Commands::Check { input, expression } => {
            let engine = TransformEngine::new(read_csv(&input, delimiter)?);
            let validated = engine
                .check(&expression)
                .with_context(|| format!("Invalid expression '{}'", expression))?;
            println!("dtype: {}", validated.dtype);
            let deps: Vec<_> = validated.dependencies.into_iter().collect();
            println!("dependencies: {}", deps.join(", "));
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn apply(
    input: &Path,
    delimiter: u8,
    options: EngineOptions,
    crop: Option<RowRange>,
    proposals: &[Proposal],
    output: Option<&Path>,
    keep_going: bool,
) -> Result<()> {
    let mut engine = TransformEngine::with_options(read_csv(input, delimiter)?, options);

    if let Some(range) = crop {
        let result = engine.crop_rows(range.start, range.end);
        if let Some(error) = result.error {
            bail!("Cannot crop to {}: {}", range, error.message);
        }
    }

    let mut rejected = 0;
    for proposal in proposals {
        let result = engine.apply_proposal(proposal);
        match &result.error {
            None => eprintln!("ok     {} ({})", proposal.name, proposal.kind),
            Some(error) => {
                rejected += 1;
                eprintln!("failed {} [{}] {}", proposal.name, error.kind, error.message);
            }
        }
    }

    if rejected > 0 && !keep_going {
        bail!(
            "{} of {} operations rejected (use --keep-going to write anyway)",
            rejected,
            proposals.len()
        );
    }

    debug!(history = engine.list_history().len(), "writing result");
    let write_options = CsvWriteOptions {
        delimiter,
        ..Default::default()
    };

    if let Some(output_path) = output {
        CsvWriter::write_file(engine.dataset(), output_path, &write_options)
            .with_context(|| format!("Failed to write '{}'", output_path.display()))?;
        eprintln!(
            "Wrote {} rows x {} columns to '{}'",
            engine.dataset().row_count(),
            engine.dataset().column_count(),
            output_path.display()
        );
    } else {
        let text = CsvWriter::write_string(engine.dataset(), &write_options)
            .context("Failed to render CSV")?;
        io::stdout()
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
    }

    Ok(())
}

fn read_csv(input: &Path, delimiter: u8) -> Result<Dataset> {
    let options = CsvReadOptions {
        delimiter,
        ..Default::default()
    };
    CsvReader::read_file(input, &options)
        .with_context(|| format!("Failed to open '{}'", input.display()))
}

fn load_options(path: Option<&Path>) -> Result<EngineOptions> {
    let Some(path) = path else {
        return Ok(EngineOptions::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config '{}'", path.display()))
}

/// Split `NAME=EXPRESSION` at the first `=`
fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    let (name, expression) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=EXPRESSION, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing column name in '{}'", s));
    }
    Ok((name.to_string(), expression.trim().to_string()))
}

fn parse_range(s: &str) -> std::result::Result<RowRange, String> {
    RowRange::parse(s).ok_or_else(|| format!("expected START:END, got '{}'", s))
}
