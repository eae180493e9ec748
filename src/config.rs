//! configuration for training and classification.
//!
//! every switch the engine reads lives in [`RionidaConfig`]. the value is
//! built once, validated, and then handed to the sweep and the optimizer.

use std::str::FromStr;

use crate::distance::Metric;
use crate::error::RionidaError;
use crate::space::{ParameterAxis, ParameterPoint, ParameterSpace};

/// lower bound of the consistency level domain. also the sentinel for
/// "unconstrained", which turns the filter off for that class
pub const S_UNCONSTRAINED: f64 = -1.0;

/// upper bound on the number of candidates a single axis may hold
pub const MAX_AXIS_VALUES: usize = 10_000;

/// how each neighbor's vote is weighted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VotingScheme {
    /// every neighbor adds 1
    Equal,
    /// a neighbor adds `1 / distance`
    InverseDistance,
    /// a neighbor adds `1 / distance^2`
    #[default]
    InverseSquareDistance,
}

impl FromStr for VotingScheme {
    type Err = RionidaError;

    fn from_str(given: &str) -> Result<Self, Self::Err> {
        match given.to_ascii_lowercase().as_str() {
            "equal" => Ok(Self::Equal),
            "inverse-distance" | "inversedistance" | "dist" => Ok(Self::InverseDistance),
            "inverse-square-distance" | "inversesquaredistance" | "sqrdist" => {
                Ok(Self::InverseSquareDistance)
            }
            _ => Err(RionidaError::UnknownVotingScheme(given.to_owned())),
        }
    }
}

/// quality measure the optimizer maximizes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QualityMeasure {
    Accuracy,
    #[default]
    Fmeasure,
    Gmean,
}

impl FromStr for QualityMeasure {
    type Err = RionidaError;

    fn from_str(given: &str) -> Result<Self, Self::Err> {
        match given.to_ascii_lowercase().as_str() {
            "accuracy" => Ok(Self::Accuracy),
            "fmeasure" | "f-measure" | "f1" => Ok(Self::Fmeasure),
            "gmean" | "g-mean" => Ok(Self::Gmean),
            _ => Err(RionidaError::UnknownMeasure(given.to_owned())),
        }
    }
}

/// what to do when every vote in the neighborhood was filtered out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InconsistencyPolicy {
    /// leave the empty distribution alone. it resolves to the minority class
    ZeroDistCount,
    /// substitute the votes of all neighbors tied at the nearest distance,
    /// ignoring their consistency flags
    #[default]
    ZeroAndEqDistCount,
}

impl FromStr for InconsistencyPolicy {
    type Err = RionidaError;

    fn from_str(given: &str) -> Result<Self, Self::Err> {
        match given.to_ascii_lowercase().as_str() {
            "zero" | "zerodistcount" | "zero-dist-count" => Ok(Self::ZeroDistCount),
            "zero-and-eq" | "zeroandeqdistcount" | "zero-and-eq-dist-count" => {
                Ok(Self::ZeroAndEqDistCount)
            }
            _ => Err(RionidaError::UnknownPolicy(given.to_owned())),
        }
    }
}

/// how the optimizer evaluates every grid point on the training table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// classify each training object against all the others
    #[default]
    LeaveOneOut,
    /// stratified k-fold cross validation with a seeded shuffle
    CrossValidation { folds: usize, seed: u64 },
}

/// an inclusive range of candidate values with a fixed step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// a range holding exactly one value
    pub fn single(value: f64) -> Self {
        Self {
            min: value,
            max: value,
            step: 0.0,
        }
    }

    /// builds the canonical candidate sequence `min + i * step`.
    ///
    /// values are rounded to 12 decimals so the same range always yields
    /// bit-identical candidates.
    pub fn values(&self, name: &'static str, low: f64, high: f64) -> Result<Vec<f64>, RionidaError> {
        let invalid = || RionidaError::InvalidRange {
            name,
            min: self.min,
            max: self.max,
            step: self.step,
        };

        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(invalid());
        }

        if self.min < low || self.max > high {
            return Err(invalid());
        }

        if self.min == self.max {
            return Ok(vec![self.min]);
        }

        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(invalid());
        }

        let steps = ((self.max - self.min) / self.step + 1e-9).floor();

        if steps + 1.0 > MAX_AXIS_VALUES as f64 {
            return Err(invalid());
        }

        let count = steps as usize + 1;
        let mut rtn: Vec<f64> = Vec::with_capacity(count);

        for i in 0..count {
            let value = self.min + i as f64 * self.step;
            let value = ((value * 1e12).round() / 1e12).min(high);

            // a step below the rounding precision repeats values
            if rtn.last().is_some_and(|last| *last >= value) {
                return Err(invalid());
            }

            rtn.push(value);
        }

        Ok(rtn)
    }
}

impl FromStr for AxisRange {
    type Err = &'static str;

    /// accepts either `value` or `min..max,step`
    fn from_str(given: &str) -> Result<Self, Self::Err> {
        if let Some((range, step)) = given.split_once(',') {
            let Some((low, high)) = range.split_once("..") else {
                return Err("a step requires a range written as min..max");
            };

            let Ok(min) = f64::from_str(low.trim()) else {
                return Err("failed to parse low value for range");
            };

            let Ok(max) = f64::from_str(high.trim()) else {
                return Err("failed to parse high value for range");
            };

            let Ok(step) = f64::from_str(step.trim()) else {
                return Err("failed to parse step size for range");
            };

            Ok(Self::new(min, max, step))
        } else if let Ok(value) = f64::from_str(given.trim()) {
            Ok(Self::single(value))
        } else {
            Err("invalid range specified")
        }
    }
}

/// immutable engine configuration.
///
/// use the builder methods to customise parameters and call
/// [`RionidaConfig::validate`] before building a classifier.
#[derive(Debug, Clone)]
pub struct RionidaConfig {
    k: usize,
    max_k: usize,
    p: f64,
    s_min: f64,
    s_maj: f64,
    p_range: AxisRange,
    s_min_range: AxisRange,
    s_maj_range: AxisRange,
    optimisation_4d: bool,
    auto_optimize: bool,
    measure: QualityMeasure,
    voting: VotingScheme,
    filter_neighbours_using_rules: bool,
    indexing: bool,
    use_majority_as_minority: bool,
    inconsistency_policy: InconsistencyPolicy,
    zero_distance_fast_path: bool,
    strategy: Strategy,
    metric: Metric,
}

impl RionidaConfig {
    /// defaults: optimise k over `0..=20`, p over `0..1` in steps of
    /// `0.05`, consistency filtering off with both levels unconstrained
    pub fn new() -> Self {
        Self {
            k: 1,
            max_k: 20,
            p: 0.5,
            s_min: S_UNCONSTRAINED,
            s_maj: S_UNCONSTRAINED,
            p_range: AxisRange::new(0.0, 1.0, 0.05),
            s_min_range: AxisRange::single(S_UNCONSTRAINED),
            s_maj_range: AxisRange::single(S_UNCONSTRAINED),
            optimisation_4d: false,
            auto_optimize: true,
            measure: QualityMeasure::default(),
            voting: VotingScheme::default(),
            filter_neighbours_using_rules: false,
            indexing: false,
            use_majority_as_minority: false,
            inconsistency_policy: InconsistencyPolicy::default(),
            zero_distance_fast_path: true,
            strategy: Strategy::default(),
            metric: Metric::Euclidean,
        }
    }

    /// sets the fixed k used when not auto optimising
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_max_k(mut self, max_k: usize) -> Self {
        self.max_k = max_k;
        self
    }

    /// sets the fixed operating point used when not auto optimising
    pub fn with_point(mut self, point: ParameterPoint) -> Self {
        self.k = point.k;
        self.p = point.p;
        self.s_min = point.s_min;
        self.s_maj = point.s_maj;
        self
    }

    pub fn with_p_range(mut self, range: AxisRange) -> Self {
        self.p_range = range;
        self
    }

    pub fn with_s_min_range(mut self, range: AxisRange) -> Self {
        self.s_min_range = range;
        self
    }

    pub fn with_s_maj_range(mut self, range: AxisRange) -> Self {
        self.s_maj_range = range;
        self
    }

    pub fn with_optimisation_4d(mut self, enabled: bool) -> Self {
        self.optimisation_4d = enabled;
        self
    }

    pub fn with_auto_optimize(mut self, enabled: bool) -> Self {
        self.auto_optimize = enabled;
        self
    }

    pub fn with_measure(mut self, measure: QualityMeasure) -> Self {
        self.measure = measure;
        self
    }

    pub fn with_voting(mut self, voting: VotingScheme) -> Self {
        self.voting = voting;
        self
    }

    pub fn with_filter(mut self, enabled: bool) -> Self {
        self.filter_neighbours_using_rules = enabled;
        self
    }

    pub fn with_indexing(mut self, enabled: bool) -> Self {
        self.indexing = enabled;
        self
    }

    pub fn with_majority_as_minority(mut self, enabled: bool) -> Self {
        self.use_majority_as_minority = enabled;
        self
    }

    pub fn with_inconsistency_policy(mut self, policy: InconsistencyPolicy) -> Self {
        self.inconsistency_policy = policy;
        self
    }

    pub fn with_zero_distance_fast_path(mut self, enabled: bool) -> Self {
        self.zero_distance_fast_path = enabled;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn max_k(&self) -> usize {
        self.max_k
    }

    pub fn optimisation_4d(&self) -> bool {
        self.optimisation_4d
    }

    pub fn auto_optimize(&self) -> bool {
        self.auto_optimize
    }

    pub fn measure(&self) -> QualityMeasure {
        self.measure
    }

    pub fn voting(&self) -> VotingScheme {
        self.voting
    }

    pub fn filter_neighbours_using_rules(&self) -> bool {
        self.filter_neighbours_using_rules
    }

    pub fn indexing(&self) -> bool {
        self.indexing
    }

    pub fn use_majority_as_minority(&self) -> bool {
        self.use_majority_as_minority
    }

    pub fn inconsistency_policy(&self) -> InconsistencyPolicy {
        self.inconsistency_policy
    }

    pub fn zero_distance_fast_path(&self) -> bool {
        self.zero_distance_fast_path
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// the fixed operating point. in 3D mode `s_maj` mirrors `s_min`
    pub fn point(&self) -> ParameterPoint {
        ParameterPoint {
            k: self.k,
            p: self.p,
            s_min: self.s_min,
            s_maj: if self.optimisation_4d {
                self.s_maj
            } else {
                self.s_min
            },
        }
    }

    /// checks everything that does not depend on the training table
    pub fn validate(&self) -> Result<(), RionidaError> {
        self.parameter_space()?;

        if !self.auto_optimize && self.k > self.max_k {
            return Err(RionidaError::KAboveMax {
                k: self.k,
                max_k: self.max_k,
            });
        }

        check_threshold("p", self.p, 0.0, 1.0)?;
        check_threshold("s_min", self.s_min, S_UNCONSTRAINED, 1.0)?;
        check_threshold("s_maj", self.s_maj, S_UNCONSTRAINED, 1.0)?;

        if let Strategy::CrossValidation { folds, .. } = self.strategy {
            if folds < 2 {
                return Err(RionidaError::InvalidFolds { folds, objects: 0 });
            }
        }

        Ok(())
    }

    /// checks the limits that depend on the number of training objects
    pub fn validate_for(&self, objects: usize) -> Result<(), RionidaError> {
        self.validate()?;

        if objects == 0 {
            return Err(RionidaError::EmptyTable);
        }

        if self.max_k > objects / 2 {
            return Err(RionidaError::MaxKTooLarge {
                max_k: self.max_k,
                objects,
            });
        }

        if let Strategy::CrossValidation { folds, .. } = self.strategy {
            if folds > objects {
                return Err(RionidaError::InvalidFolds { folds, objects });
            }
        }

        Ok(())
    }

    /// the full grid the optimizer sweeps
    pub fn parameter_space(&self) -> Result<ParameterSpace, RionidaError> {
        if self.max_k >= MAX_AXIS_VALUES {
            return Err(RionidaError::InvalidRange {
                name: "k",
                min: 0.0,
                max: self.max_k as f64,
                step: 1.0,
            });
        }

        let k_axis = ParameterAxis::new("k", (0..=self.max_k).collect())?;
        let p_axis = ParameterAxis::new("p", self.p_range.values("p", 0.0, 1.0)?)?;
        let s_min_axis = ParameterAxis::new(
            "s_min",
            self.s_min_range.values("s_min", S_UNCONSTRAINED, 1.0)?,
        )?;

        if self.optimisation_4d {
            let s_maj_axis = ParameterAxis::new(
                "s_maj",
                self.s_maj_range.values("s_maj", S_UNCONSTRAINED, 1.0)?,
            )?;

            ParameterSpace::new_4d(k_axis, p_axis, s_min_axis, s_maj_axis)
        } else {
            ParameterSpace::new_3d(k_axis, p_axis, s_min_axis)
        }
    }

    /// a grid holding every `k` up to `max_k` and the single
    /// `(p, s_min[, s_maj])` combination of the given point. the neighbor
    /// window matches the full grid so both decide ties the same way
    pub fn point_space(&self, point: &ParameterPoint) -> Result<ParameterSpace, RionidaError> {
        let k_axis = ParameterAxis::new("k", (0..=self.max_k).collect())?;
        let p_axis = ParameterAxis::new("p", vec![point.p])?;
        let s_min_axis = ParameterAxis::new("s_min", vec![point.s_min])?;

        if self.optimisation_4d {
            let s_maj_axis = ParameterAxis::new("s_maj", vec![point.s_maj])?;

            ParameterSpace::new_4d(k_axis, p_axis, s_min_axis, s_maj_axis)
        } else {
            ParameterSpace::new_3d(k_axis, p_axis, s_min_axis)
        }
    }
}

impl Default for RionidaConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn check_threshold(name: &'static str, value: f64, low: f64, high: f64) -> Result<(), RionidaError> {
    if !(low..=high).contains(&value) {
        return Err(RionidaError::InvalidThreshold {
            name,
            value,
            low,
            high,
        });
    }

    Ok(())
}
