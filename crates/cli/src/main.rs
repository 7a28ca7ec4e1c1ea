// ABOUTME: CLI binary running the event extraction engine over configured sources.
// ABOUTME: Fetches each source page (or reads a local snapshot) and prints the records as JSON or TSV.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use evscrape_engine::{
    combine, load_builtin_schemas, load_schemas_from_path, render, run_sources, Engine,
    ExtractError, OutputFormat, SchemaSet, SiteSchema,
};
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "evscrape")]
#[command(about = "Extract event listings from configured sources")]
struct Args {
    /// Schema set JSON file (default: builtin sources)
    #[arg(long = "schemas")]
    schemas: Option<PathBuf>,

    /// Only run these source ids (repeatable)
    #[arg(long = "source")]
    sources: Vec<String>,

    /// Read a source from a local HTML file instead of fetching: <id>=<path> (repeatable)
    #[arg(long = "html", value_parser = parse_html_arg)]
    html: Vec<(String, PathBuf)>,

    /// Output format: json (default) or tsv
    #[arg(short = 'f', long = "format", default_value = "json")]
    format: String,

    /// Output compact JSON instead of pretty
    #[arg(long, default_value_t = false)]
    compact: bool,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Maximum events per source
    #[arg(long = "max-items")]
    max_items: Option<usize>,

    /// Text used when an event lists a date but no time
    #[arg(long = "time-label")]
    time_label: Option<String>,

    /// Fetch timeout in seconds
    #[arg(long = "timeout", default_value_t = 30)]
    timeout: u64,

    /// Print the configured source ids and exit
    #[arg(long = "list-sources")]
    list_sources: bool,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn parse_html_arg(raw: &str) -> Result<(String, PathBuf), String> {
    match raw.split_once('=') {
        Some((id, path)) if !id.trim().is_empty() && !path.trim().is_empty() => {
            Ok((id.trim().to_string(), PathBuf::from(path.trim())))
        }
        _ => Err(format!("expected <source-id>=<path>, got {:?}", raw)),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_schemas(args: &Args) -> Result<SchemaSet> {
    let mut schemas = match &args.schemas {
        Some(path) => load_schemas_from_path(path)?,
        None => load_builtin_schemas()?,
    };

    for id in args.sources.iter().chain(args.html.iter().map(|(id, _)| id)) {
        if schemas.get(id).is_none() {
            bail!("unknown source {:?}", id);
        }
    }
    if !args.sources.is_empty() {
        schemas.retain_sources(&args.sources);
    }
    Ok(schemas)
}

/// Reads the local snapshot of a source, or fetches its page URL.
fn fetch_source(
    client: &reqwest::blocking::Client,
    snapshots: &BTreeMap<String, PathBuf>,
    schema: &SiteSchema,
) -> Result<String, ExtractError> {
    let unavailable = |op: &str, err: anyhow::Error| {
        ExtractError::unavailable(&schema.source_id, op, Some(err))
    };

    if let Some(path) = snapshots.get(&schema.source_id) {
        return fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))
            .map_err(|err| unavailable("read", err));
    }

    let url = schema
        .page_url
        .as_deref()
        .ok_or_else(|| unavailable("fetch", anyhow!("no page_url configured")))?;
    tracing::debug!(url, "fetching source page");
    client
        .get(url)
        .send()
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.text())
        .map_err(|err| unavailable("fetch", err.into()))
}

fn run(args: Args) -> Result<()> {
    let schemas = load_schemas(&args)?;

    if args.list_sources {
        for schema in schemas.iter() {
            println!(
                "{}\t{}",
                schema.source_id,
                schema.page_url.as_deref().unwrap_or("-")
            );
        }
        return Ok(());
    }

    let mut builder = Engine::builder();
    if let Some(max) = args.max_items {
        builder = builder.max_items_per_source(max);
    }
    if let Some(label) = &args.time_label {
        builder = builder.time_unavailable(label.clone());
    }
    let engine = builder.build();

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .user_agent(concat!("evscrape/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client")?;
    let snapshots: BTreeMap<String, PathBuf> = args.html.iter().cloned().collect();

    let outcomes = run_sources(&engine, &schemas, |schema| {
        fetch_source(&client, &snapshots, schema)
    });
    let failed = outcomes.values().filter(|o| !o.is_ok()).count();
    let records = combine(outcomes);
    tracing::info!(records = records.len(), failed, "extraction finished");

    let mut output = render(&records, OutputFormat::from(args.format.as_str()), args.compact)?;
    if !output.ends_with('\n') {
        output.push('\n');
    }
    match &args.output {
        Some(path) => {
            fs::write(path, output).with_context(|| format!("writing {}", path.display()))?
        }
        None => io::stdout().lock().write_all(output.as_bytes())?,
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
