use annotations::{AnnotatedFile, SingleAnnotatorCorpus};
use score::SpanMatching;
use serde::Serialize;

use crate::config::EvalConfig;
use crate::error::Result;
use crate::report::{ReportSink, Side};
use crate::scoring::{Category, InvalidRelationCounts, ScoreSummary, score_file};

/// Scores for one document of a corpus comparison.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentScores {
    pub file_id: String,
    pub scores: ScoreSummary,
    pub invalid_relations: InvalidRelationCounts,
    /// Scored against an empty prediction because only the reference had it
    pub reference_only: bool,
}

/// Mean and sample standard deviation of per-document F1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spread {
    pub mean: f64,
    pub std_dev: Option<f64>,
}

impl Spread {
    fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mean = statistical::mean(values);
        let std_dev =
            (values.len() > 1).then(|| statistical::standard_deviation(values, Some(mean)));
        Some(Self { mean, std_dev })
    }
}

/// Per-document F1 averaged over documents, per category. A document only
/// counts towards a category when either side annotated something in it;
/// `None` when no document did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroF1 {
    pub rt_entities: Option<Spread>,
    pub adverse_event_entities: Option<Spread>,
    pub causal_relations: Option<Spread>,
}

impl MacroF1 {
    pub fn get(&self, category: Category) -> Option<&Spread> {
        match category {
            Category::RtEntities => self.rt_entities.as_ref(),
            Category::AdverseEventEntities => self.adverse_event_entities.as_ref(),
            Category::CausalRelations => self.causal_relations.as_ref(),
        }
    }
}

/// Result of comparing a prediction corpus against a reference corpus.
#[derive(Debug, Clone, Serialize)]
pub struct CorpusScores {
    pub matching: SpanMatching,
    /// Overlap-mode scores are informational, not an evaluation
    pub diagnostic: bool,
    pub documents_scored: usize,
    pub totals: ScoreSummary,
    pub invalid_relations: InvalidRelationCounts,
    /// Filled in per-document mode only
    pub documents: Vec<DocumentScores>,
    pub macro_f1: Option<MacroF1>,
}

struct Accumulator {
    totals: ScoreSummary,
    invalid_relations: InvalidRelationCounts,
    documents: Vec<DocumentScores>,
    f1: [Vec<f64>; 3],
    documents_scored: usize,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            totals: ScoreSummary::default(),
            invalid_relations: InvalidRelationCounts::default(),
            documents: Vec::new(),
            f1: [Vec::new(), Vec::new(), Vec::new()],
            documents_scored: 0,
        }
    }

    fn add(
        &mut self,
        prediction_file: &AnnotatedFile,
        reference_file: &AnnotatedFile,
        reference_only: bool,
        config: &EvalConfig,
        sink: &mut dyn ReportSink,
    ) -> Result<()> {
        let scores = score_file(prediction_file, reference_file, config)?;
        let summary = scores.summary();
        let file_id = &prediction_file.file_id;

        if scores.invalid_relations.prediction > 0 {
            sink.invalid_relations(file_id, Side::Prediction, scores.invalid_relations.prediction)?;
        }
        if scores.invalid_relations.reference > 0 {
            sink.invalid_relations(file_id, Side::Reference, scores.invalid_relations.reference)?;
        }

        self.totals.merge(&summary);
        self.invalid_relations.merge(&scores.invalid_relations);
        for (values, category) in self.f1.iter_mut().zip(Category::ALL) {
            let counts = summary.get(category);
            if !counts.is_empty() {
                values.push(counts.f1());
            }
        }
        self.documents_scored += 1;

        if config.per_document() {
            let document = DocumentScores {
                file_id: file_id.clone(),
                scores: summary,
                invalid_relations: scores.invalid_relations,
                reference_only,
            };
            sink.document(&document, config.matching)?;
            self.documents.push(document);
        }

        Ok(())
    }

    fn finish(self, matching: SpanMatching) -> CorpusScores {
        let macro_f1 = (self.documents_scored > 0).then(|| MacroF1 {
            rt_entities: Spread::of(&self.f1[0]),
            adverse_event_entities: Spread::of(&self.f1[1]),
            causal_relations: Spread::of(&self.f1[2]),
        });

        CorpusScores {
            matching,
            diagnostic: matching.is_diagnostic(),
            documents_scored: self.documents_scored,
            totals: self.totals,
            invalid_relations: self.invalid_relations,
            documents: self.documents,
            macro_f1,
        }
    }
}

/// Score every predicted document against the same document in the
/// reference corpus.
///
/// A predicted document the reference never annotated is scored against an
/// empty document. Documents only the reference annotated are skipped
/// unless `include_reference_only` is set.
pub fn score_corpus(
    prediction_corpus: &SingleAnnotatorCorpus,
    reference_corpus: &SingleAnnotatorCorpus,
    config: &EvalConfig,
    sink: &mut dyn ReportSink,
) -> Result<CorpusScores> {
    let mut acc = Accumulator::new();

    for prediction_file in prediction_corpus.files() {
        let missing;
        let reference_file = match reference_corpus.get(&prediction_file.file_id) {
            Some(file) => file,
            None => {
                tracing::debug!(
                    file_id = %prediction_file.file_id,
                    reference = %reference_corpus.annotator,
                    "No reference annotations, scoring against an empty document"
                );
                missing = AnnotatedFile::empty(prediction_file.file_id.clone());
                &missing
            }
        };

        acc.add(prediction_file, reference_file, false, config, sink)?;
    }

    if config.include_reference_only {
        for reference_file in reference_corpus.files() {
            if prediction_corpus.get(&reference_file.file_id).is_some() {
                continue;
            }
            let empty = AnnotatedFile::empty(reference_file.file_id.clone());
            acc.add(&empty, reference_file, true, config, sink)?;
        }
    }

    let scores = acc.finish(config.matching);
    tracing::debug!(
        prediction = %prediction_corpus.annotator,
        reference = %reference_corpus.annotator,
        documents = scores.documents_scored,
        "Scored corpus"
    );

    if !config.per_document() {
        sink.corpus(&scores)?;
    }

    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::RecordingSink;
    use crate::rt_ctae::RT_CUI;
    use annotations::{Entity, Relation, Span};
    use score::MatrixCounts;
    use std::collections::BTreeSet;

    fn rt(file_id: &str, start: usize) -> Entity {
        let cuis = BTreeSet::from([RT_CUI.to_string()]);
        Entity::new(file_id, Span::new(start, start + 5), "RT", "BEFORE", cuis)
    }

    fn ae(file_id: &str, start: usize) -> Entity {
        let cuis = BTreeSet::from(["C0011603".to_string()]);
        Entity::new(file_id, Span::new(start, start + 5), "rash", "AFTER", cuis)
    }

    fn document(file_id: &str, entities: Vec<Entity>, relations: Vec<Relation>) -> AnnotatedFile {
        AnnotatedFile::new(file_id, entities, relations)
    }

    fn prediction() -> SingleAnnotatorCorpus {
        SingleAnnotatorCorpus::from_files(
            "model",
            [
                document(
                    "d1",
                    vec![rt("d1", 0), ae("d1", 10), ae("d1", 30)],
                    vec![Relation::new(rt("d1", 0), ae("d1", 10), "Possible", false)],
                ),
                document("d2", vec![rt("d2", 0), ae("d2", 10)], vec![]),
            ],
        )
    }

    fn reference() -> SingleAnnotatorCorpus {
        SingleAnnotatorCorpus::from_files(
            "gold",
            [
                document(
                    "d1",
                    vec![rt("d1", 0), ae("d1", 10)],
                    vec![
                        Relation::new(ae("d1", 10), rt("d1", 0), "Possible", true),
                        Relation::new(ae("d1", 10), ae("d1", 10), "Possible", true),
                    ],
                ),
                document("d3", vec![ae("d3", 0)], vec![]),
            ],
        )
    }

    #[test]
    fn test_missing_reference_document_contributes_false_positives() {
        let mut sink = RecordingSink::default();
        let scores = score_corpus(
            &prediction(),
            &reference(),
            &EvalConfig::new(false, true),
            &mut sink,
        )
        .unwrap();

        let d2 = scores.documents.iter().find(|d| d.file_id == "d2").unwrap();
        assert_eq!(d2.scores.rt_entities, MatrixCounts::new(0, 1, 0));
        assert_eq!(d2.scores.adverse_event_entities, MatrixCounts::new(0, 1, 0));
        assert_eq!(d2.scores.causal_relations, MatrixCounts::default());
    }

    #[test]
    fn test_totals_equal_sum_of_documents() {
        let mut sink = RecordingSink::default();
        let scores = score_corpus(
            &prediction(),
            &reference(),
            &EvalConfig::new(false, true),
            &mut sink,
        )
        .unwrap();

        let mut summed = ScoreSummary::default();
        for document in &scores.documents {
            summed.merge(&document.scores);
        }
        assert_eq!(scores.totals, summed);
        assert_eq!(scores.documents_scored, 2);

        assert_eq!(scores.totals.rt_entities, MatrixCounts::new(1, 1, 0));
        assert_eq!(scores.totals.adverse_event_entities, MatrixCounts::new(1, 2, 0));
        assert_eq!(scores.totals.causal_relations, MatrixCounts::new(1, 0, 0));

        // one report per document, no aggregate report
        assert_eq!(sink.documents, ["d1", "d2"]);
        assert_eq!(sink.corpora, 0);
    }

    #[test]
    fn test_aggregate_mode_reports_once() {
        let mut sink = RecordingSink::default();
        let scores = score_corpus(
            &prediction(),
            &reference(),
            &EvalConfig::default(),
            &mut sink,
        )
        .unwrap();

        assert!(scores.documents.is_empty());
        assert!(sink.documents.is_empty());
        assert_eq!(sink.corpora, 1);
        assert_eq!(scores.totals.rt_entities, MatrixCounts::new(1, 1, 0));
        assert!(scores.macro_f1.is_some());
    }

    #[test]
    fn test_invalid_relations_reach_the_sink() {
        let mut sink = RecordingSink::default();
        let scores = score_corpus(
            &prediction(),
            &reference(),
            &EvalConfig::default(),
            &mut sink,
        )
        .unwrap();

        assert_eq!(scores.invalid_relations, InvalidRelationCounts { prediction: 0, reference: 1 });
        assert_eq!(sink.invalid, [("d1".to_string(), Side::Reference, 1)]);
    }

    #[test]
    fn test_reference_only_documents() {
        let mut sink = RecordingSink::default();
        let default = score_corpus(&prediction(), &reference(), &EvalConfig::default(), &mut sink)
            .unwrap();
        assert_eq!(default.totals.adverse_event_entities.false_negatives, 0);

        let config = EvalConfig {
            include_reference_only: true,
            ..EvalConfig::new(false, true)
        };
        let extended = score_corpus(&prediction(), &reference(), &config, &mut sink).unwrap();
        assert_eq!(extended.documents_scored, 3);
        assert_eq!(extended.totals.adverse_event_entities.false_negatives, 1);

        let d3 = extended.documents.iter().find(|d| d.file_id == "d3").unwrap();
        assert!(d3.reference_only);
    }

    #[test]
    fn test_corpus_against_itself_is_perfect() {
        let mut sink = RecordingSink::default();
        let corpus = prediction();
        let scores = score_corpus(&corpus, &corpus, &EvalConfig::default(), &mut sink).unwrap();

        for category in Category::ALL {
            let counts = scores.totals.get(category);
            assert!(!counts.is_empty());
            assert_eq!(counts.precision(), 1.0);
            assert_eq!(counts.recall(), 1.0);
            assert_eq!(counts.f1(), 1.0);
        }
    }

    #[test]
    fn test_empty_category_scores_zero_against_itself() {
        let mut sink = RecordingSink::default();
        let corpus =
            SingleAnnotatorCorpus::from_files("a", [document("d1", vec![ae("d1", 0)], vec![])]);
        let scores = score_corpus(&corpus, &corpus, &EvalConfig::default(), &mut sink).unwrap();

        assert_eq!(scores.totals.adverse_event_entities.f1(), 1.0);
        assert_eq!(scores.totals.rt_entities.f1(), 0.0);
        assert_eq!(scores.totals.causal_relations.f1(), 0.0);
    }

    #[test]
    fn test_macro_f1() {
        let mut sink = RecordingSink::default();
        let scores = score_corpus(&prediction(), &reference(), &EvalConfig::default(), &mut sink)
            .unwrap();
        let macro_f1 = scores.macro_f1.unwrap();

        // d1 RT f1 = 1, d2 RT f1 = 0
        let rt = macro_f1.rt_entities.unwrap();
        assert!((rt.mean - 0.5).abs() < 1e-9);
        assert!(rt.std_dev.is_some());
        assert_eq!(macro_f1.get(Category::RtEntities), Some(&rt));

        // only d1 has causal relations on either side
        let causal = macro_f1.causal_relations.unwrap();
        assert_eq!(causal.mean, 1.0);
        assert_eq!(causal.std_dev, None);
    }

    #[test]
    fn test_macro_f1_skips_documents_without_the_category() {
        let corpus = SingleAnnotatorCorpus::from_files(
            "a",
            [
                document("d1", vec![rt("d1", 0)], vec![]),
                document("d2", vec![ae("d2", 0)], vec![]),
            ],
        );
        let mut sink = RecordingSink::default();
        let scores = score_corpus(&corpus, &corpus, &EvalConfig::default(), &mut sink).unwrap();
        let macro_f1 = scores.macro_f1.unwrap();

        assert_eq!(scores.totals.rt_entities.f1(), 1.0);
        assert_eq!(macro_f1.rt_entities, Some(Spread { mean: 1.0, std_dev: None }));
        assert_eq!(
            macro_f1.adverse_event_entities,
            Some(Spread { mean: 1.0, std_dev: None })
        );
        assert_eq!(macro_f1.causal_relations, None);
    }

    #[test]
    fn test_empty_prediction_corpus() {
        let mut sink = RecordingSink::default();
        let scores = score_corpus(
            &SingleAnnotatorCorpus::new("nobody"),
            &reference(),
            &EvalConfig::default(),
            &mut sink,
        )
        .unwrap();

        assert_eq!(scores.documents_scored, 0);
        assert_eq!(scores.totals, ScoreSummary::default());
        assert!(scores.macro_f1.is_none());
    }

    #[test]
    fn test_overlap_scores_are_flagged() {
        let mut sink = RecordingSink::default();
        let scores = score_corpus(
            &prediction(),
            &reference(),
            &EvalConfig::new(true, false),
            &mut sink,
        )
        .unwrap();
        assert!(scores.diagnostic);
    }
}
