//! the classifier facade used by the command line and other callers.

use crate::config::RionidaConfig;
use crate::confusion::SweepResult;
use crate::consistency::RuleConsistencyFilter;
use crate::error::RionidaError;
use crate::neighbor::{NeighborhoodProvider, provider_for};
use crate::optimizer::{Optimized, ParameterOptimizer};
use crate::space::{ParameterPoint, ParameterSpace};
use crate::sweep::{ParameterSweep, Query, SweepSettings};
use crate::table::TrainingTable;

/// what any classifier exposes to its callers. decisions are local codes
/// of the training table's decision attribute
pub trait Classifier {
    /// decision at the operating point
    fn classify(&self, query: &[f64]) -> Result<usize, RionidaError>;

    /// one decision per flat index of the configured parameter space
    fn classify_across_parameter_space(&self, query: &[f64]) -> Result<Vec<usize>, RionidaError>;
}

/// nearest neighbor classifier with rule based neighbor filtering
pub struct RionidaClassifier<'a> {
    table: &'a TrainingTable,
    config: RionidaConfig,
    minority: usize,
    provider: Box<dyn NeighborhoodProvider + 'a>,
    filter: RuleConsistencyFilter<'a>,
    point: ParameterPoint,
    point_space: ParameterSpace,
}

impl<'a> RionidaClassifier<'a> {
    /// builds a classifier operating at the configured fixed point
    pub fn new(table: &'a TrainingTable, config: RionidaConfig) -> Result<Self, RionidaError> {
        config.validate_for(table.len())?;

        let minority = table.minority_class(config.use_majority_as_minority());

        Self::build(table, config, minority)
    }

    /// builds a classifier and moves its operating point to the best grid
    /// point found by the configured optimiser. with auto optimisation off
    /// the grid is still evaluated but the fixed point is kept
    pub fn train_and_optimize(
        table: &'a TrainingTable,
        config: RionidaConfig,
    ) -> Result<(Self, SweepResult), RionidaError> {
        let mut classifier = Self::new(table, config)?;
        let optimizer = ParameterOptimizer::from_config(&classifier.config);
        let Optimized { best, result } = optimizer.optimize(&classifier)?;

        if classifier.config.auto_optimize() {
            classifier.set_point(best.point)?;
        }

        Ok((classifier, result))
    }

    fn build(
        table: &'a TrainingTable,
        config: RionidaConfig,
        minority: usize,
    ) -> Result<Self, RionidaError> {
        let point = config.point();
        let point_space = config.point_space(&point)?;

        Ok(Self {
            table,
            minority,
            provider: provider_for(table, config.metric(), config.indexing()),
            filter: RuleConsistencyFilter::new(table),
            point,
            point_space,
            config,
        })
    }

    /// the same classifier over a part of the training table. the minority
    /// class of the full table is kept
    pub fn for_subset<'b>(&self, subset: &'b TrainingTable) -> Result<RionidaClassifier<'b>, RionidaError> {
        RionidaClassifier::build(subset, self.config.clone(), self.minority)
    }

    /// moves the operating point. in 3D mode `s_maj` is forced to `s_min`
    pub fn set_point(&mut self, point: ParameterPoint) -> Result<(), RionidaError> {
        let point = ParameterPoint {
            s_maj: if self.config.optimisation_4d() {
                point.s_maj
            } else {
                point.s_min
            },
            ..point
        };

        self.point_space = self.config.point_space(&point)?;
        self.point = point;

        Ok(())
    }

    pub fn sweep(&self) -> ParameterSweep<'_> {
        ParameterSweep::new(
            self.provider.as_ref(),
            &self.filter,
            SweepSettings::from(&self.config),
        )
    }

    pub fn table(&self) -> &'a TrainingTable {
        self.table
    }

    pub fn config(&self) -> &RionidaConfig {
        &self.config
    }

    pub fn minority(&self) -> usize {
        self.minority
    }

    pub fn point(&self) -> ParameterPoint {
        self.point
    }

    /// the decision label of [`Classifier::classify`]
    pub fn classify_label(&self, query: &[f64]) -> Result<&'a str, RionidaError> {
        let decision = self.classify(query)?;

        Ok(self.table.decision().global_code(decision))
    }
}

impl Classifier for RionidaClassifier<'_> {
    fn classify(&self, query: &[f64]) -> Result<usize, RionidaError> {
        self.table.check_query(query)?;

        let decisions = self
            .sweep()
            .classify(Query::unseen(query), self.minority, &self.point_space)?;

        Ok(decisions[self.point_space.index_of(&self.point)?])
    }

    fn classify_across_parameter_space(&self, query: &[f64]) -> Result<Vec<usize>, RionidaError> {
        self.table.check_query(query)?;

        let space = self.config.parameter_space()?;

        self.sweep()
            .classify(Query::unseen(query), self.minority, &space)
    }
}
