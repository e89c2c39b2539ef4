use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// The outcome of comparing a predicted annotation set against a reference set.
///
/// True negatives are never materialized: for span and relation annotation
/// the space of "things nobody annotated" is unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectnessMatrix<T: Eq + Hash> {
    pub true_positives: HashSet<T>,
    pub false_positives: HashSet<T>,
    pub false_negatives: HashSet<T>,
}

impl<T: Eq + Hash> CorrectnessMatrix<T> {
    pub fn new(
        true_positives: HashSet<T>,
        false_positives: HashSet<T>,
        false_negatives: HashSet<T>,
    ) -> Self {
        Self {
            true_positives,
            false_positives,
            false_negatives,
        }
    }

    pub fn counts(&self) -> MatrixCounts {
        MatrixCounts {
            true_positives: self.true_positives.len(),
            false_positives: self.false_positives.len(),
            false_negatives: self.false_negatives.len(),
        }
    }

    pub fn precision(&self) -> f64 {
        self.counts().precision()
    }

    pub fn recall(&self) -> f64 {
        self.counts().recall()
    }

    pub fn f1(&self) -> f64 {
        self.counts().f1()
    }
}

impl<T: Eq + Hash> Default for CorrectnessMatrix<T> {
    fn default() -> Self {
        Self::new(HashSet::new(), HashSet::new(), HashSet::new())
    }
}

/// TP/FP/FN counts. Unlike [`CorrectnessMatrix`] these can be summed
/// across documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl MatrixCounts {
    pub fn new(true_positives: usize, false_positives: usize, false_negatives: usize) -> Self {
        Self {
            true_positives,
            false_positives,
            false_negatives,
        }
    }

    /// TP / (TP + FP), 0 when nothing was predicted
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// TP / (TP + FN), 0 when the reference is empty
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            return 0.0;
        }
        2.0 * p * r / (p + r)
    }

    /// Number of predicted items
    pub fn predicted(&self) -> usize {
        self.true_positives + self.false_positives
    }

    /// Number of reference items
    pub fn reference(&self) -> usize {
        self.true_positives + self.false_negatives
    }

    pub fn is_empty(&self) -> bool {
        self.predicted() == 0 && self.false_negatives == 0
    }

    pub fn merge(&mut self, other: &MatrixCounts) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
    }
}

impl Add for MatrixCounts {
    type Output = MatrixCounts;

    fn add(mut self, rhs: MatrixCounts) -> MatrixCounts {
        self.merge(&rhs);
        self
    }
}

impl AddAssign for MatrixCounts {
    fn add_assign(&mut self, rhs: MatrixCounts) {
        self.merge(&rhs);
    }
}

impl Sum for MatrixCounts {
    fn sum<I: Iterator<Item = MatrixCounts>>(iter: I) -> Self {
        iter.fold(MatrixCounts::default(), Add::add)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}
