//! Agreement scoring for RT/CTAE annotations.
//!
//! ```bash
//! # every annotator against every other annotator
//! rt_ctae_eval --corpus-json export.json --annotator-table annotators.tsv
//!
//! # model output against a gold export, one report per document
//! rt_ctae_eval --corpus-json model.json --reference-json gold.json --per-document
//! ```

use anyhow::{Context, Result, bail};
use clap::Parser;
use eval::{
    CollectedReport, EvalConfig, PairScores, ReportSink, TextReport, generate_plots, score_corpus,
    score_corpus_all_annotators,
};
use ingest::{LoaderConfig, flatten, load_annotator_table, load_corpus};
use std::io::BufWriter;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Score agreement between annotators, or between a prediction export and
/// a reference export.
#[derive(Parser)]
#[command(name = "rt_ctae_eval", version, about)]
struct Cli {
    /// Label Studio export: a JSON file or a directory of them
    #[arg(long)]
    corpus_json: PathBuf,

    /// Tab-separated annotator table: name, comma-separated ids
    #[arg(long)]
    annotator_table: Option<PathBuf>,

    /// Score the corpus as a prediction against this reference export
    #[arg(long)]
    reference_json: Option<PathBuf>,

    /// Match spans by overlap instead of exact offsets (diagnostic only)
    #[arg(long)]
    overlap: bool,

    /// Report every document instead of corpus totals
    #[arg(long)]
    per_document: bool,

    /// Require relation arguments to match in annotated order
    #[arg(long)]
    directed: bool,

    /// Also score documents that only the reference annotated
    #[arg(long)]
    include_reference_only: bool,

    /// Write a JSON report to this path
    #[arg(long)]
    json_out: Option<PathBuf>,

    /// Write F1 charts to this directory
    #[arg(long)]
    plots: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn eval_config(&self) -> EvalConfig {
        EvalConfig {
            directed_relations: self.directed,
            include_reference_only: self.include_reference_only,
            ..EvalConfig::new(self.overlap, self.per_document)
        }
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // stdout is reserved for reports
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config = cli.eval_config();
    let loader = LoaderConfig::default();

    let corpus = load_corpus(&cli.corpus_json, &loader)
        .await
        .with_context(|| format!("Failed to load corpus {:?}", cli.corpus_json))?;

    let stdout = BufWriter::new(std::io::stdout().lock());
    let mut sinks = (TextReport::new(stdout), CollectedReport::new(config.clone()));

    let runs: Vec<PairScores> = match &cli.reference_json {
        Some(reference_path) => {
            let reference = load_corpus(reference_path, &loader)
                .await
                .with_context(|| format!("Failed to load reference {:?}", reference_path))?;

            let prediction_corpus = flatten(&corpus, "prediction");
            let reference_corpus = flatten(&reference, "reference");

            sinks.pair_header("prediction", "reference")?;
            let scores = score_corpus(&prediction_corpus, &reference_corpus, &config, &mut sinks)?;
            vec![PairScores {
                prediction: "prediction".to_string(),
                reference: "reference".to_string(),
                scores,
            }]
        }
        None => {
            let table = match &cli.annotator_table {
                Some(path) => Some(load_annotator_table(path).await?),
                None => None,
            };

            let runs =
                score_corpus_all_annotators(&corpus, table.as_ref(), &config, &mut sinks)?;
            if runs.is_empty() {
                bail!(
                    "Pairwise scoring needs at least two annotators in {:?}",
                    cli.corpus_json
                );
            }
            runs
        }
    };

    let (text, mut collected) = sinks;
    text.into_inner()
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to flush report")?;

    if let Some(path) = &cli.plots {
        generate_plots(&runs, path)
            .with_context(|| format!("Failed to write plots to {:?}", path))?;
        eprintln!("Plots saved to {:?}", path);
    }

    if let Some(path) = &cli.json_out {
        collected.add_runs(runs);
        let json = serde_json::to_string_pretty(&collected)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write report {:?}", path))?;
        eprintln!("Report saved to {:?}", path);
    }

    Ok(())
}
