use annotations::{Entity, Relation, Span};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

use crate::correctness_matrix::CorrectnessMatrix;

/// How a predicted annotation is matched against reference annotations.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SpanMatching {
    /// Identical attribute values
    #[default]
    Exact,
    /// Spans share at least one character. Several predictions may claim
    /// the same reference span, so counts from this mode are for
    /// debugging only.
    Overlap,
}

impl SpanMatching {
    pub fn from_overlap_flag(overlap: bool) -> Self {
        if overlap {
            SpanMatching::Overlap
        } else {
            SpanMatching::Exact
        }
    }

    /// Whether scores produced in this mode are diagnostic rather than metrics
    pub fn is_diagnostic(&self) -> bool {
        matches!(self, SpanMatching::Overlap)
    }
}

/// Anything anchored to a span of one document.
pub trait SpanAnnotation: Clone + Eq + Hash {
    fn file_id(&self) -> &str;
    fn span(&self) -> Span;

    fn matches(&self, other: &Self, mode: SpanMatching) -> bool {
        match mode {
            SpanMatching::Exact => self == other,
            SpanMatching::Overlap => {
                self.file_id() == other.file_id() && self.span().overlaps(&other.span())
            }
        }
    }
}

/// A labeled pair of span annotations.
pub trait RelationAnnotation: Clone + Eq + Hash {
    type Argument: SpanAnnotation;
    type Label: PartialEq + ?Sized;

    fn file_id(&self) -> &str;
    fn arguments(&self) -> (&Self::Argument, &Self::Argument);
    fn label(&self) -> &Self::Label;
    fn directed(&self) -> bool;

    /// Arguments must correspond pairwise under `mode` and labels must be
    /// equal. Argument order only matters when either side is directed.
    fn matches(&self, other: &Self, mode: SpanMatching) -> bool {
        if self.file_id() != other.file_id() || self.label() != other.label() {
            return false;
        }

        let (a1, a2) = self.arguments();
        let (b1, b2) = other.arguments();

        if a1.matches(b1, mode) && a2.matches(b2, mode) {
            return true;
        }

        !self.directed() && !other.directed() && a1.matches(b2, mode) && a2.matches(b1, mode)
    }
}

impl SpanAnnotation for Entity {
    fn file_id(&self) -> &str {
        Entity::file_id(self)
    }

    fn span(&self) -> Span {
        Entity::span(self)
    }
}

impl RelationAnnotation for Relation {
    type Argument = Entity;
    type Label = str;

    fn file_id(&self) -> &str {
        Relation::file_id(self)
    }

    fn arguments(&self) -> (&Entity, &Entity) {
        (self.arg1(), self.arg2())
    }

    fn label(&self) -> &str {
        Relation::label(self)
    }

    fn directed(&self) -> bool {
        Relation::directed(self)
    }
}

pub fn build_entity_correctness_matrix<T: SpanAnnotation>(
    predicted: &HashSet<T>,
    reference: &HashSet<T>,
    mode: SpanMatching,
) -> CorrectnessMatrix<T> {
    match mode {
        SpanMatching::Exact => exact_partition(predicted, reference),
        SpanMatching::Overlap => partition_by(predicted, reference, |p, r| p.matches(r, mode)),
    }
}

pub fn build_relation_correctness_matrix<R: RelationAnnotation>(
    predicted: &HashSet<R>,
    reference: &HashSet<R>,
    mode: SpanMatching,
) -> CorrectnessMatrix<R> {
    partition_by(predicted, reference, |p, r| p == r || p.matches(r, mode))
}

fn exact_partition<T: Clone + Eq + Hash>(
    predicted: &HashSet<T>,
    reference: &HashSet<T>,
) -> CorrectnessMatrix<T> {
    CorrectnessMatrix::new(
        predicted.intersection(reference).cloned().collect(),
        predicted.difference(reference).cloned().collect(),
        reference.difference(predicted).cloned().collect(),
    )
}

/// Independent existence checks in both directions; no one-to-one pairing
/// is attempted.
fn partition_by<T, F>(
    predicted: &HashSet<T>,
    reference: &HashSet<T>,
    matches: F,
) -> CorrectnessMatrix<T>
where
    T: Clone + Eq + Hash,
    F: Fn(&T, &T) -> bool,
{
    let mut matrix = CorrectnessMatrix::default();

    for p in predicted {
        if reference.iter().any(|r| matches(p, r)) {
            matrix.true_positives.insert(p.clone());
        } else {
            matrix.false_positives.insert(p.clone());
        }
    }

    for r in reference {
        if !predicted.iter().any(|p| matches(p, r)) {
            matrix.false_negatives.insert(r.clone());
        }
    }

    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correctness_matrix::MatrixCounts;
    use std::collections::BTreeSet;

    fn entity(file_id: &str, start: usize, end: usize) -> Entity {
        let cuis = BTreeSet::from(["C0027497".to_string()]);
        Entity::new(file_id, Span::new(start, end), "nausea", "OVERLAP", cuis)
    }

    fn set<T: Eq + Hash>(items: impl IntoIterator<Item = T>) -> HashSet<T> {
        items.into_iter().collect()
    }

    #[test]
    fn test_exact_entity_matrix() {
        let reference = set([entity("d1", 0, 10)]);
        let predicted = set([entity("d1", 0, 10), entity("d1", 20, 25)]);

        let matrix = build_entity_correctness_matrix(&predicted, &reference, SpanMatching::Exact);

        assert_eq!(matrix.true_positives, set([entity("d1", 0, 10)]));
        assert_eq!(matrix.false_positives, set([entity("d1", 20, 25)]));
        assert!(matrix.false_negatives.is_empty());
        assert_eq!(matrix.precision(), 0.5);
        assert_eq!(matrix.recall(), 1.0);
        assert!((matrix.f1() - 0.6667).abs() < 1e-3);
    }

    #[test]
    fn test_exact_mode_compares_every_attribute() {
        let reference = set([entity("d1", 0, 10)]);
        let other_dtr = Entity::new("d1", Span::new(0, 10), "nausea", "BEFORE", BTreeSet::new());
        let predicted = set([other_dtr]);

        let matrix = build_entity_correctness_matrix(&predicted, &reference, SpanMatching::Exact);
        assert_eq!(matrix.counts().true_positives, 0);
        assert_eq!(matrix.counts().false_positives, 1);
        assert_eq!(matrix.counts().false_negatives, 1);

        let overlap =
            build_entity_correctness_matrix(&predicted, &reference, SpanMatching::Overlap);
        assert_eq!(overlap.counts().true_positives, 1);
        assert_eq!(overlap.counts().false_negatives, 0);
    }

    #[test]
    fn test_exact_mode_swaps_fp_and_fn() {
        let a = set([entity("d1", 0, 5), entity("d1", 6, 9), entity("d1", 30, 31)]);
        let b = set([entity("d1", 0, 5), entity("d1", 12, 14)]);

        let ab = build_entity_correctness_matrix(&a, &b, SpanMatching::Exact);
        let ba = build_entity_correctness_matrix(&b, &a, SpanMatching::Exact);

        assert_eq!(ab.true_positives, ba.true_positives);
        assert_eq!(ab.false_positives, ba.false_negatives);
        assert_eq!(ab.false_negatives, ba.false_positives);
    }

    #[test]
    fn test_overlap_is_not_one_to_one() {
        let reference = set([entity("d1", 0, 10)]);
        let predicted = set([entity("d1", 0, 3), entity("d1", 8, 12), entity("d1", 10, 12)]);

        let matrix = build_entity_correctness_matrix(&predicted, &reference, SpanMatching::Overlap);

        // both partial spans claim the single reference span
        assert_eq!(matrix.counts().true_positives, 2);
        assert_eq!(matrix.counts().false_positives, 1);
        assert_eq!(matrix.counts().false_negatives, 0);
    }

    #[test]
    fn test_overlap_requires_same_document() {
        let reference = set([entity("d1", 0, 10)]);
        let predicted = set([entity("d2", 0, 10)]);

        let matrix = build_entity_correctness_matrix(&predicted, &reference, SpanMatching::Overlap);
        assert_eq!(matrix.counts().true_positives, 0);
    }

    #[test]
    fn test_empty_inputs() {
        let empty: HashSet<Entity> = HashSet::new();
        for mode in [SpanMatching::Exact, SpanMatching::Overlap] {
            let matrix = build_entity_correctness_matrix(&empty, &empty, mode);
            assert_eq!(matrix, CorrectnessMatrix::default());
            assert_eq!(matrix.f1(), 0.0);
        }
    }

    #[test]
    fn test_undirected_relations_match_in_either_order() {
        let rt = entity("d1", 0, 5);
        let ae = entity("d1", 10, 15);
        let predicted = set([Relation::new(ae.clone(), rt.clone(), "Probable", false)]);
        let reference = set([Relation::new(rt.clone(), ae.clone(), "Probable", false)]);

        let matrix = build_relation_correctness_matrix(&predicted, &reference, SpanMatching::Exact);
        assert_eq!(matrix.counts().true_positives, 1);
        assert_eq!(matrix.counts().false_negatives, 0);

        let directed_pred = set([Relation::new(ae.clone(), rt.clone(), "Probable", true)]);
        let directed_ref = set([Relation::new(rt, ae, "Probable", true)]);
        let matrix =
            build_relation_correctness_matrix(&directed_pred, &directed_ref, SpanMatching::Exact);
        assert_eq!(matrix.counts().true_positives, 0);
        assert_eq!(matrix.counts().false_positives, 1);
        assert_eq!(matrix.counts().false_negatives, 1);
    }

    #[test]
    fn test_relation_labels_must_agree() {
        let rt = entity("d1", 0, 5);
        let ae = entity("d1", 10, 15);
        let predicted = set([Relation::new(rt.clone(), ae.clone(), "Possible", false)]);
        let reference = set([Relation::new(rt, ae, "Certain", false)]);

        let matrix =
            build_relation_correctness_matrix(&predicted, &reference, SpanMatching::Overlap);
        assert_eq!(matrix.counts().true_positives, 0);
    }

    #[test]
    fn test_relation_overlap_matches_arguments_by_span() {
        let predicted = set([Relation::new(
            entity("d1", 0, 4),
            entity("d1", 10, 12),
            "Possible",
            false,
        )]);
        let reference = set([Relation::new(
            entity("d1", 2, 6),
            entity("d1", 11, 20),
            "Possible",
            false,
        )]);

        let exact = build_relation_correctness_matrix(&predicted, &reference, SpanMatching::Exact);
        assert_eq!(exact.counts().true_positives, 0);

        let overlap =
            build_relation_correctness_matrix(&predicted, &reference, SpanMatching::Overlap);
        assert_eq!(overlap.counts().true_positives, 1);
        assert_eq!(overlap.counts().false_negatives, 0);
    }

    #[test]
    fn test_zero_width_span_overlaps_nothing() {
        let reference = set([entity("d1", 0, 10)]);
        let predicted = set([entity("d1", 5, 5)]);

        let matrix =
            build_entity_correctness_matrix(&predicted, &reference, SpanMatching::Overlap);
        assert_eq!(matrix.counts(), MatrixCounts::new(0, 1, 1));
    }

    #[test]
    fn test_exact_relation_matrix_swaps_fp_and_fn() {
        let rt = entity("d1", 0, 5);
        let ae = entity("d1", 10, 15);
        let other_ae = entity("d1", 20, 25);

        for directed in [false, true] {
            let a = set([
                Relation::new(rt.clone(), ae.clone(), "Probable", directed),
                Relation::new(other_ae.clone(), rt.clone(), "Possible", directed),
                Relation::new(rt.clone(), other_ae.clone(), "Certain", directed),
            ]);
            let b = set([
                Relation::new(ae.clone(), rt.clone(), "Probable", directed),
                Relation::new(rt.clone(), other_ae.clone(), "Possible", directed),
                Relation::new(ae.clone(), other_ae.clone(), "Doubtful", directed),
            ]);

            let ab = build_relation_correctness_matrix(&a, &b, SpanMatching::Exact);
            let ba = build_relation_correctness_matrix(&b, &a, SpanMatching::Exact);

            assert_eq!(ab.counts().true_positives, ba.counts().true_positives, "{directed}");
            assert_eq!(ab.false_positives, ba.false_negatives, "{directed}");
            assert_eq!(ab.false_negatives, ba.false_positives, "{directed}");
        }
    }
}
