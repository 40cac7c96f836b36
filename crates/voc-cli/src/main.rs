//! `voc`: enrich customer reviews with sentiment and issue tags.
//!
//! ```bash
//! # Enrich a review export and print the report
//! voc analyze reviews.csv
//!
//! # Write the enriched table, read from stdin, JSON report on stdout
//! cat reviews.csv | voc analyze - -o enriched.csv --format json
//!
//! # Score ad-hoc text
//! voc score "Runs small" "Love the fabric!"
//! ```

mod display;
mod pipeline;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voc_ai::{
    CompoundScorer, Enrichment, EnrichmentEngine, Insights, Lexicon, SentimentScorer, VaderScorer,
};
use voc_core::Normalizer;
use voc_core::normalize::{DEFAULT_GROUP_LABEL, DEFAULT_TEXT_LABEL, UNKNOWN_GROUP};

use crate::display::RunSummary;
use crate::pipeline::STDIO;

#[derive(Parser)]
#[command(name = "voc")]
#[command(version)]
#[command(about = "Score, label and tag customer reviews")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich a review CSV and report negative hot spots
    Analyze(AnalyzeArgs),

    /// Score one or more texts
    Score {
        /// Texts to score
        #[arg(required = true)]
        texts: Vec<String>,

        /// Score with the bundled retail lexicon plus this file (VADER
        /// tab-separated format) instead of the full VADER lexicon
        #[arg(long, env = "VOC_LEXICON")]
        lexicon: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Review CSV, or `-` for stdin
    input: PathBuf,

    /// Write the enriched CSV here (`-` for stdout, which suppresses the report)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Score with the bundled retail lexicon plus this file (VADER
    /// tab-separated format) instead of the full VADER lexicon
    #[arg(long, env = "VOC_LEXICON")]
    lexicon: Option<PathBuf>,

    /// Header label identifying the review text column
    #[arg(long, env = "VOC_TEXT_LABEL", default_value = DEFAULT_TEXT_LABEL)]
    text_label: String,

    /// Header label identifying the grouping column
    #[arg(long, env = "VOC_GROUP_LABEL", default_value = DEFAULT_GROUP_LABEL)]
    group_label: String,

    /// Group value for rows without one
    #[arg(long, env = "VOC_DEFAULT_GROUP", default_value = UNKNOWN_GROUP)]
    default_group: String,

    #[arg(long, value_enum, default_value = "text")]
    format: Format,

    /// Maximum rows in the action list
    #[arg(long, default_value_t = 20)]
    limit: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Serialize)]
struct Report<'a> {
    generated_at: String,
    input_rows: usize,
    dropped_rows: usize,
    #[serde(flatten)]
    insights: &'a Insights,
}

#[derive(Serialize)]
struct ScoredText<'a> {
    text: &'a str,
    #[serde(flatten)]
    enrichment: Enrichment,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so reports and CSV on stdout stay clean.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("voc v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Analyze(args) => analyze(args),
        Commands::Score {
            texts,
            lexicon,
            format,
        } => score(&texts, lexicon.as_deref(), format),
    }
}

fn analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let custom;
    let scorer: &dyn SentimentScorer = match &args.lexicon {
        Some(path) => {
            custom = load_scorer(path)?;
            &custom
        }
        None => VaderScorer::shared(),
    };

    let normalizer = Normalizer::new()
        .with_text_label(&args.text_label)
        .with_group_label(&args.group_label)
        .with_default_group(&args.default_group);
    let engine = EnrichmentEngine::new(scorer);

    let bytes = pipeline::read_input(&args.input)?;
    let out = pipeline::run_pipeline(&bytes, &normalizer, &engine)?;

    let csv_to_stdout = args.output.as_deref() == Some(Path::new(STDIO));
    if let Some(path) = &args.output {
        if csv_to_stdout {
            let csv = voc_store::serialize_csv(&out.enriched)?;
            std::io::stdout()
                .write_all(&csv)
                .context("writing enriched csv to stdout")?;
            return Ok(());
        }
        voc_store::write_csv(path, &out.enriched)
            .with_context(|| format!("writing {}", path.display()))?;
        eprintln!(
            "Wrote {} enriched rows to {}",
            out.enriched.num_rows(),
            path.display()
        );
    }

    let insights = Insights::from_batch(&out.enriched).context("building report")?;
    match args.format {
        Format::Text => {
            let run = RunSummary {
                input_rows: out.input_rows,
                dropped_rows: out.dropped_rows,
                elapsed_secs: out.elapsed_secs,
            };
            print!(
                "{}",
                display::render_report(&out.enriched, &insights, &run, args.limit)?
            );
        }
        Format::Json => {
            let report = Report {
                generated_at: Utc::now().to_rfc3339(),
                input_rows: out.input_rows,
                dropped_rows: out.dropped_rows,
                insights: &insights,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn score(texts: &[String], lexicon: Option<&Path>, format: Format) -> anyhow::Result<()> {
    let custom;
    let scorer: &dyn SentimentScorer = match lexicon {
        Some(path) => {
            custom = load_scorer(path)?;
            &custom
        }
        None => VaderScorer::shared(),
    };
    let engine = EnrichmentEngine::new(scorer);

    for text in texts {
        let enrichment = engine.enrich_text(text);
        match format {
            Format::Text => println!("{}", display::render_score(text, &enrichment)),
            Format::Json => println!(
                "{}",
                serde_json::to_string(&ScoredText { text, enrichment })?
            ),
        }
    }
    Ok(())
}

/// Bundled lexicon with the file at `path` merged over it.
fn load_scorer(path: &Path) -> anyhow::Result<CompoundScorer> {
    let overlay =
        Lexicon::from_path(path).with_context(|| format!("loading lexicon {}", path.display()))?;
    let mut lexicon = CompoundScorer::shared().lexicon().clone();
    lexicon.merge(&overlay);
    info!(
        path = %path.display(),
        entries = lexicon.len(),
        "loaded custom lexicon"
    );
    Ok(CompoundScorer::new(lexicon))
}
