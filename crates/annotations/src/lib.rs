pub mod normalizer;
pub mod schema;

pub use normalizer::{CuiNormalizer, normalize_label};
pub use schema::{AnnotatedFile, Entity, Relation, SingleAnnotatorCorpus, Span};
