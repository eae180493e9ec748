//! selection of the operating point by evaluating the whole grid on the
//! training table.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::classifier::RionidaClassifier;
use crate::config::{QualityMeasure, RionidaConfig, Strategy};
use crate::confusion::{BestPoint, ConfusionAccumulator, SweepResult};
use crate::error::{InternalError, RionidaError};
use crate::space::ParameterSpace;
use crate::sweep::Query;
use crate::table::TrainingTable;

/// the chosen point along with the evidence it was chosen from
#[derive(Debug, Clone)]
pub struct Optimized {
    pub best: BestPoint,
    pub result: SweepResult,
}

/// drives the sweep over a training table and picks the best grid point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterOptimizer {
    strategy: Strategy,
    measure: QualityMeasure,
}

impl ParameterOptimizer {
    pub fn new(strategy: Strategy, measure: QualityMeasure) -> Self {
        Self { strategy, measure }
    }

    pub fn from_config(config: &RionidaConfig) -> Self {
        Self::new(config.strategy(), config.measure())
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn measure(&self) -> QualityMeasure {
        self.measure
    }

    /// evaluates every grid point on the classifier's training table
    pub fn optimize(&self, classifier: &RionidaClassifier<'_>) -> Result<Optimized, RionidaError> {
        let space = classifier.config().parameter_space()?;

        debug!(
            volume = space.volume(),
            objects = classifier.table().len(),
            strategy = ?self.strategy,
            "optimising parameters"
        );

        let result = match self.strategy {
            Strategy::LeaveOneOut => leave_one_out(classifier, space)?,
            Strategy::CrossValidation { folds, seed } => {
                cross_validation(classifier, space, folds, seed)?
            }
        };

        let best = self.select(&result)?;

        Ok(Optimized { best, result })
    }

    /// picks the best grid point of a finished pass
    pub fn select(&self, result: &SweepResult) -> Result<BestPoint, RionidaError> {
        let best = result.best(self.measure);
        let recovered = result.space().index_of(&best.point)?;

        if recovered != best.index {
            return Err(InternalError::IndexRoundTrip {
                index: best.index,
                recovered,
            }
            .into());
        }

        if best.point.k == 0 {
            warn!(
                measure = ?self.measure,
                value = best.value,
                "optimiser selected k = 0, the training table is likely degenerate"
            );
        }

        info!(
            k = best.point.k,
            p = best.point.p,
            s_min = best.point.s_min,
            s_maj = best.point.s_maj,
            value = best.value,
            "selected operating point"
        );

        Ok(best)
    }
}

fn leave_one_out(
    classifier: &RionidaClassifier<'_>,
    space: ParameterSpace,
) -> Result<SweepResult, RionidaError> {
    let minority = classifier.minority();
    let sweep = classifier.sweep();
    let mut acc = ConfusionAccumulator::new(space.clone(), minority);

    for (index, record) in classifier.table().records().iter().enumerate() {
        let decisions = sweep.classify(Query::self_learning(&record.data, index), minority, &space)?;

        acc.record(record.class, &decisions);
    }

    Ok(acc.finish())
}

fn cross_validation(
    classifier: &RionidaClassifier<'_>,
    space: ParameterSpace,
    folds: usize,
    seed: u64,
) -> Result<SweepResult, RionidaError> {
    let table = classifier.table();

    if folds < 2 || folds > table.len() {
        return Err(RionidaError::InvalidFolds {
            folds,
            objects: table.len(),
        });
    }

    let minority = classifier.minority();
    let assignment = stratified_folds(table, folds, seed);
    let mut total = ConfusionAccumulator::new(space.clone(), minority);

    for (fold, held_out) in assignment.iter().enumerate() {
        let train: Vec<usize> = assignment
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != fold)
            .flat_map(|(_, indices)| indices.iter().copied())
            .collect();

        debug!(fold, train = train.len(), test = held_out.len(), "evaluating fold");

        let subset = table.subset(&train)?;
        let fold_classifier = classifier.for_subset(&subset)?;
        let sweep = fold_classifier.sweep();
        let mut partial = ConfusionAccumulator::new(space.clone(), minority);

        for index in held_out {
            let record = table.record(*index);
            let decisions = sweep.classify(Query::unseen(&record.data), minority, &space)?;

            partial.record(record.class, &decisions);
        }

        total.merge(&partial);
    }

    Ok(total.finish())
}

/// splits the table into `folds` groups keeping the class proportions.
///
/// each class is shuffled with a seeded rng and dealt round robin, the
/// second class continuing where the first one stopped so fold sizes differ
/// by at most one.
pub fn stratified_folds(table: &TrainingTable, folds: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rtn = vec![Vec::new(); folds];
    let mut dealt = 0;

    for class in 0..2 {
        let mut members: Vec<usize> = table
            .records()
            .iter()
            .enumerate()
            .filter(|(_, record)| record.class == class)
            .map(|(index, _)| index)
            .collect();

        members.shuffle(&mut rng);

        for index in members {
            rtn[dealt % folds].push(index);
            dealt += 1;
        }
    }

    for fold in &mut rtn {
        fold.sort_unstable();
    }

    rtn
}

#[cfg(test)]
mod test {
    use super::*;

    fn table(size: usize) -> TrainingTable {
        let rows = (0..size)
            .map(|i| (vec![i as f64], if i % 4 == 0 { "min" } else { "maj" }))
            .collect();

        TrainingTable::from_labelled(rows).unwrap()
    }

    #[test]
    fn folds_cover_every_object_once() {
        let table = table(23);
        let folds = stratified_folds(&table, 5, 11);

        let mut all: Vec<usize> = folds.iter().flatten().copied().collect();
        all.sort_unstable();

        assert_eq!(all, (0..23).collect::<Vec<_>>());

        for fold in &folds {
            assert!(fold.len() == 4 || fold.len() == 5);
        }
    }

    #[test]
    fn folds_are_stratified() {
        let table = table(40);
        let folds = stratified_folds(&table, 5, 3);

        for fold in &folds {
            let minority = fold
                .iter()
                .filter(|index| table.record(**index).class == 1)
                .count();

            assert_eq!(minority, 2);
        }
    }

    #[test]
    fn folds_are_deterministic() {
        let table = table(30);

        assert_eq!(stratified_folds(&table, 3, 9), stratified_folds(&table, 3, 9));
    }
}
