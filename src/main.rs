use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use sectorscope::analysis::{self, AnalysisResult};
use sectorscope::classify::concepts::score_matches;
use sectorscope::classify::ClassifyOptions;
use sectorscope::config::Config;
use sectorscope::distribution::Dimension;
use sectorscope::input::{normalize, validate_batch};
use sectorscope::output::terminal;
use sectorscope::progress::{BarProgress, NoopProgress, ProgressReporter};
use sectorscope::reference::{
    ClassificationKind, LoadedReference, ReferenceSnapshot, SnapshotBuilder,
};
use sectorscope::source::{
    CachedSource, HttpMarketSource, MarketDataSource, StaticMarketSource,
};

/// sectorscope: industry and concept breakdown for a batch of stock codes.
///
/// Classifies each code into one industry and up to five ranked concepts,
/// then reports how the batch is distributed across both.
#[derive(Parser)]
#[command(name = "sectorscope", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a batch of stock codes
    Analyze {
        /// Stock codes, e.g. 600519 SZ000001 (any mix of spaces, commas and 、)
        codes: Vec<String>,

        /// Read codes from a text file ("-" for stdin)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Use a saved reference snapshot instead of fetching one
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Read reference data from a JSON source document
        #[arg(long)]
        source_file: Option<PathBuf>,

        /// Parallel fetches and classifications (default: 8)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,

        /// Show the score breakdown behind each stock's concepts
        #[arg(long)]
        explain: bool,

        /// List every distribution label instead of the top nine plus "other"
        #[arg(long)]
        full: bool,

        /// Only list stocks whose code or name contains this text
        #[arg(long)]
        search: Option<String>,

        /// List the stocks under one label, e.g. industry=Banks or concept=other
        #[arg(long, value_parser = parse_show)]
        show: Vec<ShowTarget>,
    },

    /// Analyze one batch per line from stdin, reusing fetched reference data
    Session {
        /// Read reference data from a JSON source document
        #[arg(long)]
        source_file: Option<PathBuf>,

        /// Parallel fetches and classifications (default: 8)
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Build a reference snapshot and save it as JSON
    Snapshot {
        /// Where to write the snapshot
        #[arg(long)]
        out: PathBuf,

        /// Read reference data from a JSON source document
        #[arg(long)]
        source_file: Option<PathBuf>,
    },

    /// List the boards of one catalog with rank, change rate and size
    Catalog {
        #[arg(long, value_enum, default_value = "industry")]
        kind: KindArg,

        /// Number of boards to show
        #[arg(long, default_value = "30")]
        limit: usize,

        /// Use a saved reference snapshot instead of fetching one
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Read reference data from a JSON source document
        #[arg(long)]
        source_file: Option<PathBuf>,
    },
}

/// A distribution label picked with --show.
#[derive(Clone, Debug)]
struct ShowTarget {
    dimension: Dimension,
    label: String,
}

fn parse_show(arg: &str) -> std::result::Result<ShowTarget, String> {
    let (dimension, label) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected <industry|concept>=<label>, got '{arg}'"))?;
    let label = label.trim();
    if label.is_empty() {
        return Err("label must not be empty".to_string());
    }
    Ok(ShowTarget {
        dimension: dimension.parse()?,
        label: label.to_string(),
    })
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Industry,
    Concept,
}

impl From<KindArg> for ClassificationKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Industry => ClassificationKind::Industry,
            KindArg::Concept => ClassificationKind::Concept,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sectorscope=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            codes,
            file,
            snapshot,
            source_file,
            concurrency,
            json,
            explain,
            full,
            search,
            show,
        } => {
            let config = Config::load()?;
            let concurrency = concurrency.unwrap_or(config.concurrency).max(1);

            let text = gather_input(&codes, file.as_deref()).await?;
            let input = normalize(&text);
            // Reject a bad batch before fetching any reference data
            if let Err(e) = validate_batch(&input) {
                terminal::display_invalid_tokens(&input.invalid);
                return Err(e.into());
            }

            let setup =
                prepare_reference(&config, snapshot, source_file, concurrency, json).await?;

            let options = ClassifyOptions {
                concurrency,
                live_timeout: config.live_timeout,
                ..ClassifyOptions::default()
            };
            let progress: Box<dyn ProgressReporter> = if json {
                Box::new(NoopProgress)
            } else {
                Box::new(BarProgress::new())
            };

            let result = analysis::run(
                &input,
                &setup.reference,
                setup.live.as_deref(),
                &options,
                progress.as_ref(),
            )
            .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            display_result(&result, full, search.as_deref());

            for target in &show {
                let distribution = result.distribution(target.dimension);
                match distribution.display_bucket(&target.label) {
                    Some(bucket) => terminal::display_bucket_members(target.dimension, &bucket),
                    None => terminal::display_unknown_label(
                        target.dimension,
                        &target.label,
                        &distribution.selectable(),
                    ),
                }
            }

            if explain {
                let weights = &options.concept_weights;
                for record in &result.records {
                    let matches =
                        score_matches(record.code.as_str(), &setup.reference.snapshot, weights);
                    terminal::display_explain(record, &matches, weights.max_concepts);
                }
            }
        }

        Commands::Session {
            source_file,
            concurrency,
        } => {
            let config = Config::load()?;
            let concurrency = concurrency.unwrap_or(config.concurrency).max(1);
            let source = open_source(&config, source_file.as_deref())?;
            let options = ClassifyOptions {
                concurrency,
                live_timeout: config.live_timeout,
                ..ClassifyOptions::default()
            };

            println!("Enter stock codes, one batch per line. An empty line ends the session.");

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut batches = 0usize;

            while let Some(line) = lines.next_line().await? {
                if line.trim().is_empty() {
                    break;
                }

                let input = normalize(&line);
                if let Err(e) = validate_batch(&input) {
                    terminal::display_invalid_tokens(&input.invalid);
                    println!("  {} {e}", "Skipped:".yellow());
                    continue;
                }

                // Rebuilt every batch; the cached source only refetches
                // listings older than the TTL.
                let reference = build_reference(source.as_ref(), concurrency, false).await;
                let progress = BarProgress::new();
                let result = analysis::run(
                    &input,
                    &reference,
                    Some(source.as_ref()),
                    &options,
                    &progress,
                )
                .await?;

                display_result(&result, false, None);
                batches += 1;
            }

            println!("\n{}", format!("Session over. {batches} batches analyzed.").bold());
        }

        Commands::Snapshot { out, source_file } => {
            let config = Config::load()?;
            let source = open_source(&config, source_file.as_deref())?;

            let reference = build_reference(source.as_ref(), config.concurrency, false).await;
            reference.snapshot.write_to_file(&out)?;

            println!("\n{}", "Snapshot saved.".bold());
            println!("  Path: {}", out.display());
            println!("  Stocks: {}", reference.snapshot.stock_count());
            println!("  Industries: {}", reference.snapshot.industries().len());
            println!("  Concepts: {}", reference.snapshot.concepts().len());
            terminal::display_advisories(&reference.advisories);
        }

        Commands::Catalog {
            kind,
            limit,
            snapshot,
            source_file,
        } => {
            let config = Config::load()?;
            let setup =
                prepare_reference(&config, snapshot, source_file, config.concurrency, false)
                    .await?;

            let kind = ClassificationKind::from(kind);
            terminal::display_catalog(kind, setup.reference.snapshot.catalog(kind), limit);
            terminal::display_advisories(&setup.reference.advisories);
        }
    }

    Ok(())
}

/// Reference data for a run plus the source used for live lookups, if any.
struct ReferenceSetup {
    reference: LoadedReference,
    live: Option<Box<dyn MarketDataSource>>,
}

/// Pick the reference data for a command.
///
/// An explicit --snapshot wins, then --source-file, then SECTORSCOPE_SNAPSHOT,
/// then the HTTP source. With a snapshot file, live industry lookups are
/// only available when a source is also configured.
async fn prepare_reference(
    config: &Config,
    snapshot: Option<PathBuf>,
    source_file: Option<PathBuf>,
    concurrency: usize,
    quiet: bool,
) -> Result<ReferenceSetup> {
    let snapshot_path = snapshot.or_else(|| {
        if source_file.is_none() {
            config.snapshot_path.clone()
        } else {
            None
        }
    });

    if let Some(path) = snapshot_path {
        let snapshot = ReferenceSnapshot::load_from_file(&path)?;
        info!(
            path = %path.display(),
            stocks = snapshot.stock_count(),
            "Loaded reference snapshot"
        );

        let live = if source_file.is_some() || config.source_url.is_some() {
            Some(open_source(config, source_file.as_deref())?)
        } else {
            None
        };

        return Ok(ReferenceSetup {
            reference: LoadedReference::from_snapshot(snapshot),
            live,
        });
    }

    let source = open_source(config, source_file.as_deref())?;
    let reference = build_reference(source.as_ref(), concurrency, quiet).await;
    Ok(ReferenceSetup {
        reference,
        live: Some(source),
    })
}

/// Open the configured market data source behind a TTL cache.
fn open_source(config: &Config, source_file: Option<&Path>) -> Result<Box<dyn MarketDataSource>> {
    match source_file {
        Some(path) => {
            let source = StaticMarketSource::from_file(path)?;
            Ok(Box::new(CachedSource::new(source, config.cache_ttl)))
        }
        None => {
            let url = config.require_source()?;
            let source = HttpMarketSource::new(url, config.requests_per_second)?;
            Ok(Box::new(CachedSource::new(source, config.cache_ttl)))
        }
    }
}

async fn build_reference(
    source: &dyn MarketDataSource,
    concurrency: usize,
    quiet: bool,
) -> LoadedReference {
    if quiet {
        return SnapshotBuilder::new(source, concurrency, &NoopProgress)
            .build()
            .await;
    }

    println!("Building reference data...");
    let progress = BarProgress::new();
    SnapshotBuilder::new(source, concurrency, &progress)
        .build()
        .await
}

/// Join positional codes and file contents into one text blob.
async fn gather_input(codes: &[String], file: Option<&Path>) -> Result<String> {
    let mut text = codes.join(" ");

    if let Some(path) = file {
        let contents = if path == Path::new("-") {
            let mut buf = String::new();
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                buf.push_str(&line);
                buf.push('\n');
            }
            buf
        } else {
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read codes from {}", path.display()))?
        };
        text.push(' ');
        text.push_str(&contents);
    }

    Ok(text)
}

fn display_result(result: &AnalysisResult, full: bool, search: Option<&str>) {
    let search = search.map(str::trim).filter(|term| !term.is_empty());
    match search {
        Some(term) => terminal::display_records(&result.search(term), Some(term)),
        None => {
            let all: Vec<_> = result.records.iter().collect();
            terminal::display_records(&all, None);
        }
    }
    terminal::display_distribution("Industry Distribution", &result.industry, full);
    terminal::display_distribution("Concept Distribution", &result.concept, full);
    terminal::display_warnings(result);
}
