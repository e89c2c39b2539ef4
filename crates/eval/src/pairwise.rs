use annotations::SingleAnnotatorCorpus;
use ingest::{AnnotatorTable, MultiAnnotatorCorpus, group_by_annotator};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::EvalConfig;
use crate::corpus::{CorpusScores, score_corpus};
use crate::error::Result;
use crate::report::ReportSink;

/// One ordered comparison: `prediction` scored against `reference`.
#[derive(Debug, Clone, Serialize)]
pub struct PairScores {
    pub prediction: String,
    pub reference: String,
    pub scores: CorpusScores,
}

impl PairScores {
    pub fn label(&self) -> String {
        format!("{} vs {}", self.prediction, self.reference)
    }
}

/// Score every annotator against every other annotator of a raw corpus.
///
/// Raw annotator ids are resolved through `table` when given. Each ordered
/// pair of distinct annotators is scored once, in name order.
pub fn score_corpus_all_annotators(
    corpus: &MultiAnnotatorCorpus,
    table: Option<&AnnotatorTable>,
    config: &EvalConfig,
    sink: &mut dyn ReportSink,
) -> Result<Vec<PairScores>> {
    let groups = group_by_annotator(corpus, table);
    score_annotator_pairs(&groups, config, sink)
}

pub fn score_annotator_pairs(
    groups: &BTreeMap<String, SingleAnnotatorCorpus>,
    config: &EvalConfig,
    sink: &mut dyn ReportSink,
) -> Result<Vec<PairScores>> {
    if groups.len() < 2 {
        tracing::warn!(
            annotators = groups.len(),
            "Need at least two annotators for pairwise agreement"
        );
        return Ok(Vec::new());
    }

    let mut runs = Vec::with_capacity(groups.len() * (groups.len() - 1));

    for (prediction, prediction_corpus) in groups {
        for (reference, reference_corpus) in groups {
            if prediction == reference {
                continue;
            }

            sink.pair_header(prediction, reference)?;
            let scores = score_corpus(prediction_corpus, reference_corpus, config, sink)?;
            tracing::info!(
                prediction = %prediction,
                reference = %reference,
                documents = scores.documents_scored,
                "Scored annotator pair"
            );

            runs.push(PairScores {
                prediction: prediction.clone(),
                reference: reference.clone(),
                scores,
            });
        }
    }

    Ok(runs)
}
