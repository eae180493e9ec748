use std::convert::Infallible;
use std::str::FromStr;

use clap::Args;
use rionida::{
    AxisRange, InconsistencyPolicy, Metric, ParameterPoint, QualityMeasure, RionidaConfig,
    Strategy, VotingScheme,
};

/// represents the column type specified in the command line arguments
#[derive(Debug, Clone)]
pub enum ColumnType {
    /// a column name to attempt to lookup
    Name(String),

    /// a defined zero based index number in the csv
    Index(usize),
}

impl FromStr for ColumnType {
    type Err = Infallible;

    fn from_str(given: &str) -> Result<Self, Self::Err> {
        if let Ok(index) = usize::from_str(given) {
            Ok(Self::Index(index))
        } else {
            Ok(Self::Name(given.into()))
        }
    }
}

/// a comma delimitered list of attribute values
#[derive(Debug, Clone)]
pub struct Datapoint(Vec<f64>);

impl Datapoint {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl FromStr for Datapoint {
    type Err = &'static str;

    fn from_str(given: &str) -> Result<Self, Self::Err> {
        let mut rtn = Vec::new();
        let iter = given.split(',').map(|value| f64::from_str(value.trim()));

        for result in iter {
            rtn.push(result.map_err(|_| "failed to parse datapoint")?);
        }

        Ok(Self(rtn))
    }
}

/// the columns of the csv holding the training table
#[derive(Debug, Args)]
pub struct TableArgs {
    /// the list of columns to use as attributes
    #[arg(short, long = "col")]
    pub columns: Vec<ColumnType>,

    /// the column to use as the decision
    #[arg(long)]
    pub label: ColumnType,
}

/// the classifier options shared by every command
#[derive(Debug, Args)]
pub struct EngineArgs {
    /// a fixed k. turns optimisation off. --p, --s-min and --s-maj are used
    /// as the operating point when given as single values, otherwise p is
    /// 0.5 and both levels are unconstrained
    #[arg(short, long)]
    k: Option<usize>,

    /// the largest k that is evaluated
    #[arg(long, default_value = "20")]
    max_k: usize,

    /// minority vote thresholds as `value` or `min..max,step`
    #[arg(long, default_value = "0..1,0.05", allow_hyphen_values = true)]
    p: AxisRange,

    /// consistency levels for minority neighbors
    #[arg(long, default_value = "-1", allow_hyphen_values = true)]
    s_min: AxisRange,

    /// consistency levels for majority neighbors, only used with --4d
    #[arg(long, default_value = "-1", allow_hyphen_values = true)]
    s_maj: AxisRange,

    /// optimise s_min and s_maj independently
    #[arg(long = "4d")]
    optimisation_4d: bool,

    /// the measure to maximize: accuracy, fmeasure or gmean
    #[arg(long, default_value = "fmeasure")]
    measure: QualityMeasure,

    /// neighbor vote weighting: equal, dist or sqrdist
    #[arg(long, default_value = "sqrdist")]
    voting: VotingScheme,

    /// only let rule consistent neighbors vote
    #[arg(long)]
    filter: bool,

    /// search neighbors with a ball tree instead of a linear scan
    #[arg(long)]
    indexing: bool,

    /// treat the more frequent class as the minority
    #[arg(long)]
    majority_as_minority: bool,

    /// handling of filtered out neighborhoods: zero or zero-and-eq
    #[arg(long, default_value = "zero-and-eq")]
    policy: InconsistencyPolicy,

    /// always run the full sweep, even for contradictory duplicates
    #[arg(long)]
    no_fast_path: bool,

    /// optimise with stratified cross validation instead of leave one out
    #[arg(long)]
    folds: Option<usize>,

    /// seed for the fold shuffle
    #[arg(long, default_value = "0")]
    seed: u64,

    /// specifies the algorithm to use when calculating distances
    #[arg(long, default_value = "euclidean")]
    algo: Metric,
}

impl EngineArgs {
    pub fn to_config(&self) -> RionidaConfig {
        let strategy = match self.folds {
            Some(folds) => Strategy::CrossValidation {
                folds,
                seed: self.seed,
            },
            None => Strategy::LeaveOneOut,
        };

        let config = RionidaConfig::new()
            .with_max_k(self.max_k)
            .with_p_range(self.p)
            .with_s_min_range(self.s_min)
            .with_s_maj_range(self.s_maj)
            .with_optimisation_4d(self.optimisation_4d)
            .with_measure(self.measure)
            .with_voting(self.voting)
            .with_filter(self.filter)
            .with_indexing(self.indexing)
            .with_majority_as_minority(self.majority_as_minority)
            .with_inconsistency_policy(self.policy)
            .with_zero_distance_fast_path(!self.no_fast_path)
            .with_strategy(strategy)
            .with_metric(self.algo);

        let Some(k) = self.k else {
            return config;
        };

        // a range only makes sense when optimising, a fixed k falls back to
        // the default operating point for any option given as a range
        let defaults = RionidaConfig::new().point();

        config.with_auto_optimize(false).with_point(ParameterPoint {
            k,
            p: fixed_value(self.p, defaults.p),
            s_min: fixed_value(self.s_min, defaults.s_min),
            s_maj: fixed_value(self.s_maj, defaults.s_maj),
        })
    }
}

/// the single value of a range, or `default` when it holds several
fn fixed_value(range: AxisRange, default: f64) -> f64 {
    if range.min == range.max {
        range.min
    } else {
        default
    }
}

#[cfg(test)]
mod test {
    use clap::Parser;
    use rionida::{RionidaClassifier, S_UNCONSTRAINED, TrainingTable};

    use super::*;

    #[derive(Debug, Parser)]
    struct Engine {
        #[command(flatten)]
        engine: EngineArgs,
    }

    fn config(args: &[&str]) -> RionidaConfig {
        Engine::parse_from(std::iter::once("rionida").chain(args.iter().copied()))
            .engine
            .to_config()
    }

    #[test]
    fn fixed_k_uses_default_threshold_for_ranges() {
        let config = config(&["--k", "3", "--max-k", "3", "--voting", "equal"]);
        let point = config.point();

        assert!(!config.auto_optimize());
        assert_eq!(point.k, 3);
        assert_eq!(point.p, 0.5);
        assert_eq!(point.s_min, S_UNCONSTRAINED);

        // six majority objects around the query, two minority objects far off
        let mut rows: Vec<(Vec<f64>, &str)> =
            (0..6).map(|i| (vec![i as f64 * 0.1], "maj")).collect();

        rows.push((vec![5.0], "min"));
        rows.push((vec![5.1], "min"));

        let table = TrainingTable::from_labelled(rows).unwrap();
        let classifier = RionidaClassifier::new(&table, config).unwrap();

        assert_eq!(classifier.classify_label(&[0.15]).unwrap(), "maj");
    }

    #[test]
    fn fixed_k_keeps_single_values() {
        let point = config(&["-k", "2", "--p", "0.3", "--s-min", "0.5", "--s-maj", "0"]).point();

        assert_eq!(point.k, 2);
        assert_eq!(point.p, 0.3);
        assert_eq!(point.s_min, 0.5);
        // 3D mode mirrors s_min
        assert_eq!(point.s_maj, 0.5);

        let point = config(&["-k", "2", "--4d", "--s-min", "-1..1,0.5", "--s-maj", "0"]).point();

        assert_eq!(point.s_min, S_UNCONSTRAINED);
        assert_eq!(point.s_maj, 0.0);
    }

    #[test]
    fn ranges_are_kept_when_optimising() {
        let config = config(&["--p", "0.2..0.4,0.1"]);

        assert!(config.auto_optimize());
        assert_eq!(config.parameter_space().unwrap().p_axis().values(), &[0.2, 0.3, 0.4]);
    }

    #[test]
    fn parse_datapoint() {
        let point = Datapoint::from_str("1.5, -2,3").unwrap();

        assert_eq!(point.as_slice(), &[1.5, -2.0, 3.0]);
        assert!(Datapoint::from_str("1,a").is_err());
    }

    #[test]
    fn parse_column() {
        assert!(matches!(ColumnType::from_str("3"), Ok(ColumnType::Index(3))));
        assert!(matches!(
            ColumnType::from_str("width"),
            Ok(ColumnType::Name(name)) if name == "width"
        ));
    }
}
