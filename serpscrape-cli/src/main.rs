//! Command-line front end: fetches search results for a keyword file and
//! writes the aggregated JSON document.

use anyhow::{Context, Result};
use clap::Parser;
use serpscrape::prelude::*;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "serpscrape")]
#[command(about = "Fetch search results for a list of keywords and save structured JSON")]
struct Cli {
    /// Path to settings.json; built-in defaults are used when omitted
    #[arg(long = "config")]
    config_path: Option<PathBuf>,

    /// Input keywords file, one keyword per line
    #[arg(long = "input", default_value = "data/input_keywords.txt")]
    input_file: PathBuf,

    /// Where to write the JSON results
    #[arg(long = "output", default_value = "data/example_output.json")]
    output_file: PathBuf,

    /// Country code for results (e.g. US)
    #[arg(long)]
    gl: Option<String>,

    /// Interface language (e.g. en)
    #[arg(long)]
    hl: Option<String>,

    /// Time-based filter (e.g. qdr:d)
    #[arg(long)]
    tbs: Option<String>,

    /// Start offset into the results
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    start: i64,

    /// Maximum results per query
    #[arg(long, default_value_t = 20, allow_negative_numbers = true)]
    limit: i64,

    /// Maximum pages fetched per query
    #[arg(long, default_value_t = 2, allow_negative_numbers = true)]
    pages: i64,

    /// Queries processed at once (overrides the settings file)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Keep results collected before a query fails
    #[arg(long)]
    keep_partial: bool,

    /// Log output format: text or json
    #[arg(long, default_value = "text")]
    log_format: LogFormat,
}

impl Cli {
    fn run_params(&self) -> RunParams {
        RunParams {
            gl: self.gl.clone(),
            hl: self.hl.clone(),
            tbs: self.tbs.clone(),
            start: self.start,
            limit: self.limit,
            pages: self.pages,
        }
    }
}

/// Settings and validated options, or the run-level error that aborts
/// before any request is made.
fn prepare(cli: &Cli) -> std::result::Result<(SerpSettings, QueryOptions), SerpError> {
    let mut settings = match &cli.config_path {
        Some(path) => load_settings(path)?,
        None => SerpSettings::default(),
    };
    if let Some(concurrency) = cli.concurrency {
        settings.max_concurrent_queries = concurrency;
    }
    if cli.keep_partial {
        settings.partial_results = PartialResultPolicy::Keep;
    }

    let path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("<defaults>"));
    settings
        .check()
        .map_err(|message| ConfigError::new(path, message))?;

    let options = cli.run_params().validate()?;
    Ok((settings, options))
}

async fn run(cli: Cli, settings: SerpSettings, options: QueryOptions) -> Result<()> {
    let keywords = load_keywords(&cli.input_file)
        .with_context(|| format!("reading keywords from {}", cli.input_file.display()))?;

    let fetcher = HttpFetcher::new(&settings).context("building HTTP client")?;
    let runner = BatchRunner::from_settings(
        Arc::new(fetcher),
        Arc::new(SerpExtractor::default()),
        &settings,
    );

    let sink = JsonFileSink::new(&cli.output_file);
    let output = runner
        .run_to_sink(&keywords, &options, &sink)
        .await
        .with_context(|| format!("writing results to {}", cli.output_file.display()))?;

    println!(
        "Wrote {} query result blocks to {}",
        output.len(),
        cli.output_file.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.log_format, "serpscrape=info") {
        eprintln!("failed to initialise logging: {e}");
    }

    let (settings, options) = match prepare(&cli) {
        Ok(prepared) => prepared,
        Err(e) => {
            eprintln!("[config/validation error] {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        input = %cli.input_file.display(),
        limit = options.limit,
        pages = options.pages,
        concurrency = settings.max_concurrent_queries,
        "Starting run"
    );

    match run(cli, settings, options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
