use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};

use testnorm::report::{failure_list, summary_line};
use testnorm::{
    CanonicalResult, Config, EnvironmentInfo, Framework, ParseOptions, ParseOverrides,
    ParserRegistry,
};

/// Normalize test-framework reports into one canonical JSON schema
#[derive(Parser)]
#[command(name = "testnorm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Report files, glob patterns, or `-` for stdin
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Framework that produced the reports (mocha, jest, vitest); sniffed when omitted
    #[arg(short, long)]
    framework: Option<Framework>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Keep backslash path separators as reported
    #[arg(long)]
    no_normalize_paths: bool,

    /// Drop captured console output from metadata
    #[arg(long)]
    no_console: bool,

    /// Config file (defaults to ./testnorm.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Exit with status 1 when any report is unsuccessful or unparseable
    #[arg(long)]
    check: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Canonical result JSON
    #[default]
    Json,
    /// One line of counts per report
    Summary,
    /// Failed tests with their first error line
    Failures,
}

/// One raw report and where it came from.
struct Input {
    label: String,
    raw: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable.
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            Config::load(&cwd)
        }
    };

    let format = match (cli.format, config.output.format.as_deref()) {
        (Some(format), _) => format,
        (None, Some(name)) => OutputFormat::from_str(name, true)
            .map_err(|e| anyhow::anyhow!("invalid output format in config: {}", e))?,
        (None, None) => OutputFormat::default(),
    };
    let pretty = cli.pretty || config.output.pretty;

    let overrides = config.parser.merge(ParseOverrides {
        normalize_file_paths: cli.no_normalize_paths.then_some(false),
        include_console_output: cli.no_console.then_some(false),
    });

    let registry = ParserRegistry::new(EnvironmentInfo::current(), ParseOptions::default());
    let inputs = read_inputs(&cli.inputs)?;

    let mut results = Vec::with_capacity(inputs.len());
    for input in &inputs {
        let parser = registry
            .select(&input.raw, cli.framework)
            .context("no parser registered for the selected framework")?;
        tracing::debug!(input = %input.label, framework = %parser.framework(), "parsing");
        results.push(parser.parse(&input.raw, &overrides));
    }

    print_results(&inputs, &results, format, pretty)?;

    if cli.check && results.iter().any(|r| !r.summary.success) {
        std::process::exit(1);
    }

    Ok(())
}

/// Expand `-`, plain paths and glob patterns into raw report contents.
fn read_inputs(patterns: &[String]) -> Result<Vec<Input>> {
    let mut inputs = Vec::new();
    for pattern in patterns {
        if pattern == "-" {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read report from stdin")?;
            inputs.push(Input {
                label: "<stdin>".to_string(),
                raw,
            });
            continue;
        }

        let literal = PathBuf::from(pattern);
        let paths = if literal.is_file() {
            vec![literal]
        } else {
            glob::glob(pattern)
                .with_context(|| format!("invalid glob pattern '{}'", pattern))?
                .flatten()
                .filter(|p| p.is_file())
                .collect::<Vec<_>>()
        };

        if paths.is_empty() {
            bail!("no report files match '{}'", pattern);
        }

        for path in paths {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            inputs.push(Input {
                label: path.to_string_lossy().to_string(),
                raw,
            });
        }
    }
    Ok(inputs)
}

fn print_results(
    inputs: &[Input],
    results: &[CanonicalResult],
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = match results {
                [single] => serde_json::to_value(single)?,
                many => serde_json::to_value(many)?,
            };
            let text = if pretty {
                serde_json::to_string_pretty(&json)?
            } else {
                serde_json::to_string(&json)?
            };
            println!("{}", text);
        }
        OutputFormat::Summary => {
            for (input, result) in inputs.iter().zip(results) {
                println!("{}", summary_line(&input.label, result));
            }
        }
        OutputFormat::Failures => {
            for (input, result) in inputs.iter().zip(results) {
                print!("{}", failure_list(&input.label, result));
            }
        }
    }
    Ok(())
}
