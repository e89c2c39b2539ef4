use score::{MatrixCounts, SpanMatching};
use serde::Serialize;
use std::io::Write;

use crate::config::EvalConfig;
use crate::corpus::{CorpusScores, DocumentScores};
use crate::error::Result;
use crate::pairwise::PairScores;
use crate::scoring::{Category, ScoreSummary};

/// Which side of a comparison an annotation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Prediction,
    Reference,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Prediction => "prediction",
            Side::Reference => "reference",
        }
    }
}

/// Receives everything the scorers report. Scoring code never prints.
pub trait ReportSink {
    fn pair_header(&mut self, _prediction: &str, _reference: &str) -> Result<()> {
        Ok(())
    }

    fn invalid_relations(&mut self, _file_id: &str, _side: Side, _count: usize) -> Result<()> {
        Ok(())
    }

    fn document(&mut self, document: &DocumentScores, matching: SpanMatching) -> Result<()>;

    fn corpus(&mut self, scores: &CorpusScores) -> Result<()>;
}

impl<A: ReportSink, B: ReportSink> ReportSink for (A, B) {
    fn pair_header(&mut self, prediction: &str, reference: &str) -> Result<()> {
        self.0.pair_header(prediction, reference)?;
        self.1.pair_header(prediction, reference)
    }

    fn invalid_relations(&mut self, file_id: &str, side: Side, count: usize) -> Result<()> {
        self.0.invalid_relations(file_id, side, count)?;
        self.1.invalid_relations(file_id, side, count)
    }

    fn document(&mut self, document: &DocumentScores, matching: SpanMatching) -> Result<()> {
        self.0.document(document, matching)?;
        self.1.document(document, matching)
    }

    fn corpus(&mut self, scores: &CorpusScores) -> Result<()> {
        self.0.corpus(scores)?;
        self.1.corpus(scores)
    }
}

const OVERLAP_NOTE: &str =
    "  (overlap matching: diagnostic counts, not one-to-one, do not report as scores)";

/// Human-readable reports written line by line.
pub struct TextReport<W: Write> {
    out: W,
}

impl<W: Write> TextReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn summary(&mut self, summary: &ScoreSummary) -> Result<()> {
        for category in Category::ALL {
            self.category_line(category.label(), summary.get(category))?;
        }
        Ok(())
    }

    fn category_line(&mut self, label: &str, counts: &MatrixCounts) -> Result<()> {
        writeln!(
            self.out,
            "  {:<24} precision {:.4}  recall {:.4}  f1 {:.4}  (tp {} fp {} fn {})",
            label,
            counts.precision(),
            counts.recall(),
            counts.f1(),
            counts.true_positives,
            counts.false_positives,
            counts.false_negatives,
        )?;
        Ok(())
    }
}

impl<W: Write> ReportSink for TextReport<W> {
    fn pair_header(&mut self, prediction: &str, reference: &str) -> Result<()> {
        writeln!(self.out, "\n=== prediction: {} | reference: {} ===", prediction, reference)?;
        Ok(())
    }

    fn invalid_relations(&mut self, file_id: &str, side: Side, count: usize) -> Result<()> {
        writeln!(
            self.out,
            "  {}: {} invalid relation(s) in {}, not scored",
            file_id,
            count,
            side.as_str()
        )?;
        Ok(())
    }

    fn document(&mut self, document: &DocumentScores, matching: SpanMatching) -> Result<()> {
        let suffix = if document.reference_only { " (reference only)" } else { "" };
        writeln!(self.out, "--- document {}{} ---", document.file_id, suffix)?;
        if matching.is_diagnostic() {
            writeln!(self.out, "{}", OVERLAP_NOTE)?;
        }
        self.summary(&document.scores)
    }

    fn corpus(&mut self, scores: &CorpusScores) -> Result<()> {
        writeln!(self.out, "--- corpus: {} document(s) ---", scores.documents_scored)?;
        if scores.diagnostic {
            writeln!(self.out, "{}", OVERLAP_NOTE)?;
        }
        self.summary(&scores.totals)?;

        if let Some(macro_f1) = &scores.macro_f1 {
            for category in Category::ALL {
                let Some(spread) = macro_f1.get(category) else {
                    writeln!(self.out, "  {:<24} macro f1 n/a", category.label())?;
                    continue;
                };
                match spread.std_dev {
                    Some(std_dev) => writeln!(
                        self.out,
                        "  {:<24} macro f1 {:.4} ± {:.4}",
                        category.label(),
                        spread.mean,
                        std_dev
                    )?,
                    None => writeln!(
                        self.out,
                        "  {:<24} macro f1 {:.4}",
                        category.label(),
                        spread.mean
                    )?,
                }
            }
        }

        let invalid = scores.invalid_relations;
        if invalid.total() > 0 {
            writeln!(
                self.out,
                "  invalid relations: {} prediction, {} reference",
                invalid.prediction, invalid.reference
            )?;
        }
        Ok(())
    }
}

/// An invalid-relation diagnostic tied to the run it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidRelationNote {
    pub prediction: String,
    pub reference: String,
    pub file_id: String,
    pub side: Side,
    pub count: usize,
}

/// Machine-readable report, serialized once all runs are done.
#[derive(Debug, Clone, Serialize)]
pub struct CollectedReport {
    pub config: EvalConfig,
    pub runs: Vec<PairScores>,
    pub invalid_relations: Vec<InvalidRelationNote>,
    #[serde(skip)]
    current: (String, String),
}

impl CollectedReport {
    pub fn new(config: EvalConfig) -> Self {
        Self {
            config,
            runs: Vec::new(),
            invalid_relations: Vec::new(),
            current: (String::new(), String::new()),
        }
    }

    pub fn add_runs(&mut self, runs: impl IntoIterator<Item = PairScores>) {
        self.runs.extend(runs);
    }
}

impl ReportSink for CollectedReport {
    fn pair_header(&mut self, prediction: &str, reference: &str) -> Result<()> {
        self.current = (prediction.to_string(), reference.to_string());
        Ok(())
    }

    fn invalid_relations(&mut self, file_id: &str, side: Side, count: usize) -> Result<()> {
        self.invalid_relations.push(InvalidRelationNote {
            prediction: self.current.0.clone(),
            reference: self.current.1.clone(),
            file_id: file_id.to_string(),
            side,
            count,
        });
        Ok(())
    }

    // scores arrive through `add_runs`
    fn document(&mut self, _document: &DocumentScores, _matching: SpanMatching) -> Result<()> {
        Ok(())
    }

    fn corpus(&mut self, _scores: &CorpusScores) -> Result<()> {
        Ok(())
    }
}
