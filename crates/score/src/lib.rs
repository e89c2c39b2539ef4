pub mod correctness_matrix;
pub mod matching;

pub use correctness_matrix::{CorrectnessMatrix, MatrixCounts};
pub use matching::{
    RelationAnnotation, SpanAnnotation, SpanMatching, build_entity_correctness_matrix,
    build_relation_correctness_matrix,
};
