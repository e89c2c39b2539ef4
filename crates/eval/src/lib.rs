pub mod config;
pub mod corpus;
pub mod error;
pub mod pairwise;
pub mod plots;
pub mod report;
pub mod rt_ctae;
pub mod scoring;

pub use config::{EvalConfig, ReportMode};
pub use corpus::{CorpusScores, DocumentScores, MacroF1, Spread, score_corpus};
pub use error::{EvalError, Result};
pub use pairwise::{PairScores, score_annotator_pairs, score_corpus_all_annotators};
pub use plots::generate_plots;
pub use report::{CollectedReport, InvalidRelationNote, ReportSink, Side, TextReport};
pub use rt_ctae::{
    AdverseEventEntity, CausalRelation, NaranjoScale, RT_CUI, RtEntity, is_adverse_event_entity,
    is_rt_entity, validate_causal_label,
};
pub use scoring::{AnnotatedFileScores, Category, InvalidRelationCounts, ScoreSummary, score_file};
