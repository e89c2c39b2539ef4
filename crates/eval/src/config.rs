use score::SpanMatching;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalConfig {
    pub matching: SpanMatching,
    pub report: ReportMode,
    /// Require relation arguments to match in annotated order
    pub directed_relations: bool,
    /// Also score documents only the reference annotated, so they count
    /// as false negatives
    pub include_reference_only: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    Aggregate,   // One report per corpus comparison
    PerDocument, // One report per document
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            matching: SpanMatching::Exact,
            report: ReportMode::Aggregate,
            directed_relations: false,
            include_reference_only: false,
        }
    }
}

impl EvalConfig {
    pub fn new(overlap: bool, per_document: bool) -> Self {
        Self {
            matching: SpanMatching::from_overlap_flag(overlap),
            report: if per_document {
                ReportMode::PerDocument
            } else {
                ReportMode::Aggregate
            },
            ..Self::default()
        }
    }

    pub fn per_document(&self) -> bool {
        self.report == ReportMode::PerDocument
    }
}
