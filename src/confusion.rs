//! confusion matrices per grid point and the measures derived from them.
//!
//! the minority class is the positive class for every measure.

use crate::config::QualityMeasure;
use crate::space::{ParameterPoint, ParameterSpace};

/// `2x2` counts indexed `[actual][predicted]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    cells: [[u64; 2]; 2],
}

impl ConfusionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, actual: usize, predicted: usize) {
        self.cells[actual][predicted] += 1;
    }

    pub fn get(&self, actual: usize, predicted: usize) -> u64 {
        self.cells[actual][predicted]
    }

    /// adds every cell of `other` into this matrix
    pub fn merge(&mut self, other: &ConfusionMatrix) {
        for actual in 0..2 {
            for predicted in 0..2 {
                self.cells[actual][predicted] += other.cells[actual][predicted];
            }
        }
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().flatten().sum()
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.cells[0][0] + self.cells[1][1], self.total())
    }

    /// share of `positive` predictions that were right
    pub fn precision(&self, positive: usize) -> f64 {
        let negative = 1 - positive;

        ratio(
            self.cells[positive][positive],
            self.cells[positive][positive] + self.cells[negative][positive],
        )
    }

    /// share of `positive` objects that were recognised. also known as
    /// sensitivity
    pub fn recall(&self, positive: usize) -> f64 {
        let negative = 1 - positive;

        ratio(
            self.cells[positive][positive],
            self.cells[positive][positive] + self.cells[positive][negative],
        )
    }

    pub fn specificity(&self, positive: usize) -> f64 {
        self.recall(1 - positive)
    }

    pub fn f_measure(&self, positive: usize) -> f64 {
        let precision = self.precision(positive);
        let recall = self.recall(positive);

        if precision + recall == 0.0 {
            return 0.0;
        }

        2.0 * precision * recall / (precision + recall)
    }

    pub fn g_mean(&self, positive: usize) -> f64 {
        (self.recall(positive) * self.specificity(positive)).sqrt()
    }

    pub fn measure(&self, measure: QualityMeasure, positive: usize) -> f64 {
        match measure {
            QualityMeasure::Accuracy => self.accuracy(),
            QualityMeasure::Fmeasure => self.f_measure(positive),
            QualityMeasure::Gmean => self.g_mean(positive),
        }
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// one confusion matrix per flat index of a parameter space
#[derive(Debug, Clone)]
pub struct ConfusionAccumulator {
    space: ParameterSpace,
    minority: usize,
    matrices: Vec<ConfusionMatrix>,
}

impl ConfusionAccumulator {
    pub fn new(space: ParameterSpace, minority: usize) -> Self {
        let matrices = vec![ConfusionMatrix::new(); space.volume()];

        Self {
            space,
            minority,
            matrices,
        }
    }

    /// records one classified object at every grid point
    pub fn record(&mut self, actual: usize, decisions: &[usize]) {
        for (matrix, predicted) in self.matrices.iter_mut().zip(decisions) {
            matrix.record(actual, *predicted);
        }
    }

    /// adds a partial accumulation over the same space
    pub fn merge(&mut self, other: &ConfusionAccumulator) {
        for (matrix, partial) in self.matrices.iter_mut().zip(&other.matrices) {
            matrix.merge(partial);
        }
    }

    pub fn finish(self) -> SweepResult {
        SweepResult {
            space: self.space,
            minority: self.minority,
            matrices: self.matrices,
        }
    }
}

/// the grid point chosen by [`SweepResult::best`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestPoint {
    pub index: usize,
    pub point: ParameterPoint,
    pub value: f64,
}

/// the outcome of one optimisation pass. read only
#[derive(Debug, Clone)]
pub struct SweepResult {
    space: ParameterSpace,
    minority: usize,
    matrices: Vec<ConfusionMatrix>,
}

impl SweepResult {
    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    pub fn minority(&self) -> usize {
        self.minority
    }

    pub fn matrices(&self) -> &[ConfusionMatrix] {
        &self.matrices
    }

    pub fn matrix(&self, index: usize) -> &ConfusionMatrix {
        &self.matrices[index]
    }

    pub fn quality(&self, index: usize, measure: QualityMeasure) -> f64 {
        self.matrices[index].measure(measure, self.minority)
    }

    /// the first flat index reaching the highest value of `measure`.
    /// scanning in index order favours small `k`, then small `p`
    pub fn best(&self, measure: QualityMeasure) -> BestPoint {
        let mut best = (0, f64::NEG_INFINITY);

        for index in 0..self.matrices.len() {
            let value = self.quality(index, measure);

            if value > best.1 {
                best = (index, value);
            }
        }

        BestPoint {
            index: best.0,
            point: self.space.point_at(best.0),
            value: best.1,
        }
    }
}
