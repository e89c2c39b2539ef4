use annotations::AnnotatedFile;
use score::{
    CorrectnessMatrix, MatrixCounts, build_entity_correctness_matrix,
    build_relation_correctness_matrix,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::EvalConfig;
use crate::error::{EvalError, Result};
use crate::rt_ctae::{AdverseEventEntity, CausalRelation, RtEntity};

/// The three things the task scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    RtEntities,
    AdverseEventEntities,
    CausalRelations,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::RtEntities,
        Category::AdverseEventEntities,
        Category::CausalRelations,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::RtEntities => "RT entities",
            Category::AdverseEventEntities => "Adverse event entities",
            Category::CausalRelations => "Causal relations",
        }
    }
}

/// TP/FP/FN counts for each category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub rt_entities: MatrixCounts,
    pub adverse_event_entities: MatrixCounts,
    pub causal_relations: MatrixCounts,
}

impl ScoreSummary {
    pub fn get(&self, category: Category) -> &MatrixCounts {
        match category {
            Category::RtEntities => &self.rt_entities,
            Category::AdverseEventEntities => &self.adverse_event_entities,
            Category::CausalRelations => &self.causal_relations,
        }
    }

    pub fn merge(&mut self, other: &ScoreSummary) {
        self.rt_entities.merge(&other.rt_entities);
        self.adverse_event_entities.merge(&other.adverse_event_entities);
        self.causal_relations.merge(&other.causal_relations);
    }
}

/// Relations dropped from scoring because they are not valid causal
/// relations, per side of the comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidRelationCounts {
    pub prediction: usize,
    pub reference: usize,
}

impl InvalidRelationCounts {
    pub fn total(&self) -> usize {
        self.prediction + self.reference
    }

    pub fn merge(&mut self, other: &InvalidRelationCounts) {
        self.prediction += other.prediction;
        self.reference += other.reference;
    }
}

/// The result of comparing one document between two annotation sets.
#[derive(Debug, Clone)]
pub struct AnnotatedFileScores {
    pub rt_entities: CorrectnessMatrix<RtEntity>,
    pub adverse_event_entities: CorrectnessMatrix<AdverseEventEntity>,
    pub causal_relations: CorrectnessMatrix<CausalRelation>,
    pub invalid_relations: InvalidRelationCounts,
}

impl AnnotatedFileScores {
    pub fn summary(&self) -> ScoreSummary {
        ScoreSummary {
            rt_entities: self.rt_entities.counts(),
            adverse_event_entities: self.adverse_event_entities.counts(),
            causal_relations: self.causal_relations.counts(),
        }
    }
}

pub fn score_file(
    prediction_file: &AnnotatedFile,
    reference_file: &AnnotatedFile,
    config: &EvalConfig,
) -> Result<AnnotatedFileScores> {
    if prediction_file.file_id != reference_file.file_id {
        return Err(EvalError::MismatchedDocument {
            prediction: prediction_file.file_id.clone(),
            reference: reference_file.file_id.clone(),
        });
    }

    let rt_entities = build_entity_correctness_matrix(
        &rt_entities(prediction_file),
        &rt_entities(reference_file),
        config.matching,
    );
    let adverse_event_entities = build_entity_correctness_matrix(
        &adverse_event_entities(prediction_file),
        &adverse_event_entities(reference_file),
        config.matching,
    );

    let (prediction_relations, prediction_invalid) =
        causal_relations(prediction_file, config.directed_relations);
    let (reference_relations, reference_invalid) =
        causal_relations(reference_file, config.directed_relations);
    let causal_relations = build_relation_correctness_matrix(
        &prediction_relations,
        &reference_relations,
        config.matching,
    );

    Ok(AnnotatedFileScores {
        rt_entities,
        adverse_event_entities,
        causal_relations,
        invalid_relations: InvalidRelationCounts {
            prediction: prediction_invalid,
            reference: reference_invalid,
        },
    })
}

fn rt_entities(file: &AnnotatedFile) -> HashSet<RtEntity> {
    file.entities
        .iter()
        .filter_map(|entity| RtEntity::try_from(entity.clone()).ok())
        .collect()
}

fn adverse_event_entities(file: &AnnotatedFile) -> HashSet<AdverseEventEntity> {
    file.entities
        .iter()
        .filter_map(|entity| AdverseEventEntity::try_from(entity.clone()).ok())
        .collect()
}

/// Valid causal relations of a file, and how many relations were not
fn causal_relations(file: &AnnotatedFile, directed: bool) -> (HashSet<CausalRelation>, usize) {
    let mut valid = HashSet::new();
    let mut invalid = 0;

    for relation in &file.relations {
        match CausalRelation::try_from_relation(relation, directed) {
            Ok(causal) => {
                valid.insert(causal);
            }
            Err(e) => {
                tracing::debug!(file_id = %file.file_id, error = %e, "Skipping relation");
                invalid += 1;
            }
        }
    }

    if invalid > 0 {
        tracing::info!(
            file_id = %file.file_id,
            count = invalid,
            "File has invalid relations"
        );
    }

    (valid, invalid)
}
