//! imbalance aware nearest neighbor classification.
//!
//! rionida is a k nearest neighbor classifier for binary decisions that
//! favours the minority class. besides `k` it is parameterised by a
//! minority vote threshold `p` and by the consistency levels `s_min` and
//! `s_maj` a neighbor of either class must reach to be allowed to vote.
//!
//! all of these are picked by evaluating every point of a parameter grid on
//! the training table. one neighbor retrieval per object is enough to decide
//! the whole grid, see [`sweep`].
//!
//! # Quick start
//!
//! ```
//! use rionida::{Classifier, RionidaClassifier, RionidaConfig, TrainingTable};
//!
//! let table = TrainingTable::from_labelled(vec![
//!     (vec![0.0, 0.0], "common"),
//!     (vec![0.0, 1.0], "common"),
//!     (vec![1.0, 0.0], "common"),
//!     (vec![1.0, 1.0], "common"),
//!     (vec![6.0, 6.0], "rare"),
//!     (vec![6.0, 7.0], "rare"),
//! ])
//! .unwrap();
//!
//! let config = RionidaConfig::new().with_max_k(3);
//! let (classifier, _result) = RionidaClassifier::train_and_optimize(&table, config).unwrap();
//!
//! assert_eq!(classifier.classify_label(&[5.5, 6.5]).unwrap(), "rare");
//! ```
//!
//! # Architecture
//!
//! ```text
//! RionidaClassifier::train_and_optimize()
//!   └─ ParameterOptimizer::optimize()      (optimizer.rs)
//!        ├─ ParameterSweep::classify()     (sweep.rs) per training object
//!        │    ├─ NeighborhoodProvider      (neighbor.rs, ball_tree.rs)
//!        │    ├─ ConsistencyFilter         (consistency.rs)
//!        │    └─ DecisionDistribution      (voting.rs)
//!        └─ ConfusionAccumulator           (confusion.rs)
//! ```

pub mod ball_tree;
pub mod classifier;
pub mod config;
pub mod confusion;
pub mod consistency;
pub mod distance;
pub mod error;
pub mod neighbor;
pub mod optimizer;
pub mod space;
pub mod sweep;
pub mod table;
pub mod voting;

pub use classifier::{Classifier, RionidaClassifier};
pub use config::{
    AxisRange, InconsistencyPolicy, QualityMeasure, RionidaConfig, S_UNCONSTRAINED, Strategy,
    VotingScheme,
};
pub use confusion::{BestPoint, ConfusionAccumulator, ConfusionMatrix, SweepResult};
pub use consistency::{ConsistencyFilter, RuleConsistencyFilter};
pub use distance::Metric;
pub use error::{InternalError, RionidaError};
pub use neighbor::{BruteForceProvider, Neighbor, NeighborhoodProvider};
pub use optimizer::{Optimized, ParameterOptimizer};
pub use space::{ParameterAxis, ParameterPoint, ParameterSpace};
pub use sweep::{ParameterSweep, Query, SweepSettings};
pub use table::{DecisionAttribute, Record, TrainingTable};
