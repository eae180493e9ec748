//! error types for the rionida engine.
//!
//! errors come in two flavours. configuration errors describe bad input and
//! can be retried once the input is corrected. [`InternalError`] describes a
//! broken algorithmic invariant and must abort the current classification.

/// a broken invariant inside the engine. never caused by user input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InternalError {
    /// a grid point was left without a decision after a full sweep
    #[error("decision for flat index {index} was never written")]
    UnsetDecision { index: usize },

    /// `index_of(point_at(i))` did not give back `i`
    #[error("flat index {index} round tripped to {recovered}")]
    IndexRoundTrip { index: usize, recovered: usize },
}

/// error type for all fallible operations in the rionida crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RionidaError {
    /// an axis range that produces no usable candidate sequence
    #[error("invalid range for {name}: min {min} max {max} step {step}")]
    InvalidRange {
        name: &'static str,
        min: f64,
        max: f64,
        step: f64,
    },

    /// an axis without values or with repeated values
    #[error("axis {axis} must hold at least one value and no duplicates")]
    InvalidAxis { axis: String },

    /// a value that is not exactly present on its axis
    #[error("unknown value {value} on axis {axis}")]
    UnknownAxisValue { axis: String, value: String },

    #[error("unknown voting scheme: {0}")]
    UnknownVotingScheme(String),

    #[error("unknown optimisation measure: {0}")]
    UnknownMeasure(String),

    #[error("unknown inconsistency policy: {0}")]
    UnknownPolicy(String),

    #[error("unknown distance metric: {0}")]
    UnknownMetric(String),

    /// the decision attribute must have exactly two values
    #[error("decision attribute must be binary, found {found} distinct values")]
    NotBinary { found: usize },

    #[error("max k {max_k} exceeds half of the {objects} training objects")]
    MaxKTooLarge { max_k: usize, objects: usize },

    #[error("fixed k {k} exceeds max k {max_k}")]
    KAboveMax { k: usize, max_k: usize },

    #[error("number of folds {folds} is invalid for {objects} training objects")]
    InvalidFolds { folds: usize, objects: usize },

    #[error("threshold {name} must lie in [{low}, {high}], got {value}")]
    InvalidThreshold {
        name: &'static str,
        value: f64,
        low: f64,
        high: f64,
    },

    #[error("training table is empty")]
    EmptyTable,

    #[error("query has {found} attributes but the table has {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("internal invariant violated: {0}")]
    Internal(#[from] InternalError),
}

impl RionidaError {
    /// true when the error signals an engine bug rather than bad input
    pub fn is_fatal(&self) -> bool {
        matches!(self, RionidaError::Internal(_))
    }
}
